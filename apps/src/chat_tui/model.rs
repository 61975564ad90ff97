/// Emoji glyphs offered by the picker.
pub const EMOJI_CHOICES: [&str; 12] = [
    "😀", "😂", "😍", "😎", "🤔", "👍", "👏", "🙏", "🎉", "❤️", "😢", "🔥",
];

#[derive(Debug, Default, PartialEq, Eq)]
pub enum RunningState {
    #[default]
    ConnectView, // entering credentials
    ChatView, // sending and reading messages
    Done,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ConnectField {
    #[default]
    Token,
    Room,
}

/// Modal widget layered over the chat view. `Esc` is the dismiss signal.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    #[default]
    None,
    EmojiPicker { selected: usize },
    GifPrompt,
    StickerPicker { selected: usize },
}

#[derive(Debug, Default)]
pub struct Model {
    pub running_state: RunningState,
    pub focus: ConnectField,
    pub token_input: String,
    pub room_input: String,
    pub input: String,
    pub gif_input: String,
    pub overlay: Overlay,
    /// Last user-facing failure, shown until the next successful action.
    pub status: Option<String>,
    /// Arrival timestamp (millis) per message log entry, render-only.
    pub received_at: Vec<u128>,
}
