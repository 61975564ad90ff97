use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::App;
use crate::model::{ConnectField, Overlay, RunningState, EMOJI_CHOICES};
use crate::update::{update, ChatIntent};

pub async fn handle_key_events(key_event: KeyEvent, app: &mut App) {
    // Handle Ctrl+C globally to quit
    if key_event.modifiers.contains(KeyModifiers::CONTROL) && key_event.code == KeyCode::Char('c') {
        update(app, ChatIntent::Quit).await;
        return;
    }

    match app.model.running_state {
        RunningState::ConnectView => handle_connect_view_input(key_event, app).await,
        RunningState::ChatView => match app.model.overlay {
            Overlay::None => handle_chat_view_input(key_event, app).await,
            Overlay::EmojiPicker { selected } => {
                handle_emoji_picker_input(key_event, app, selected).await
            }
            Overlay::GifPrompt => handle_gif_prompt_input(key_event, app).await,
            Overlay::StickerPicker { selected } => {
                handle_sticker_picker_input(key_event, app, selected).await
            }
        },
        RunningState::Done => {}
    }
}

async fn handle_connect_view_input(key_event: KeyEvent, app: &mut App) {
    match key_event.code {
        KeyCode::Tab | KeyCode::Down => {
            app.model.focus = match app.model.focus {
                ConnectField::Token => ConnectField::Room,
                ConnectField::Room => ConnectField::Token,
            };
        }
        KeyCode::BackTab | KeyCode::Up => {
            app.model.focus = match app.model.focus {
                ConnectField::Token => ConnectField::Room,
                ConnectField::Room => ConnectField::Token,
            };
        }
        KeyCode::Enter => update(app, ChatIntent::Connect).await,
        KeyCode::Char(c) => match app.model.focus {
            ConnectField::Token => app.model.token_input.push(c),
            ConnectField::Room => app.model.room_input.push(c),
        },
        KeyCode::Backspace => {
            match app.model.focus {
                ConnectField::Token => app.model.token_input.pop(),
                ConnectField::Room => app.model.room_input.pop(),
            };
        }
        KeyCode::Esc => update(app, ChatIntent::Quit).await,
        _ => {}
    }
}

async fn handle_chat_view_input(key_event: KeyEvent, app: &mut App) {
    match key_event.code {
        KeyCode::Enter => update(app, ChatIntent::SendText).await,
        KeyCode::Char('e') if key_event.modifiers.contains(KeyModifiers::CONTROL) => {
            app.model.overlay = Overlay::EmojiPicker { selected: 0 };
        }
        KeyCode::Char('g') if key_event.modifiers.contains(KeyModifiers::CONTROL) => {
            app.model.overlay = Overlay::GifPrompt;
        }
        KeyCode::Char('s') if key_event.modifiers.contains(KeyModifiers::CONTROL) => {
            app.model.overlay = Overlay::StickerPicker { selected: 0 };
        }
        KeyCode::Char(c) => app.model.input.push(c),
        KeyCode::Backspace => {
            app.model.input.pop();
        }
        KeyCode::Esc => update(app, ChatIntent::Disconnect).await,
        _ => {}
    }
}

async fn handle_emoji_picker_input(key_event: KeyEvent, app: &mut App, selected: usize) {
    match key_event.code {
        KeyCode::Left => {
            app.model.overlay = Overlay::EmojiPicker {
                selected: selected.saturating_sub(1),
            };
        }
        KeyCode::Right => {
            app.model.overlay = Overlay::EmojiPicker {
                selected: (selected + 1).min(EMOJI_CHOICES.len() - 1),
            };
        }
        KeyCode::Enter => {
            let glyph = EMOJI_CHOICES[selected].to_string();
            update(app, ChatIntent::SendEmoji(glyph)).await;
        }
        KeyCode::Esc => update(app, ChatIntent::DismissOverlay).await,
        _ => {}
    }
}

async fn handle_gif_prompt_input(key_event: KeyEvent, app: &mut App) {
    match key_event.code {
        KeyCode::Enter => update(app, ChatIntent::SendGif).await,
        KeyCode::Char(c) => app.model.gif_input.push(c),
        KeyCode::Backspace => {
            app.model.gif_input.pop();
        }
        KeyCode::Esc => update(app, ChatIntent::DismissOverlay).await,
        _ => {}
    }
}

async fn handle_sticker_picker_input(key_event: KeyEvent, app: &mut App, selected: usize) {
    let stickers = app.config.default_stickers.len();
    match key_event.code {
        KeyCode::Up => {
            app.model.overlay = Overlay::StickerPicker {
                selected: selected.saturating_sub(1),
            };
        }
        KeyCode::Down if stickers > 0 => {
            app.model.overlay = Overlay::StickerPicker {
                selected: (selected + 1).min(stickers - 1),
            };
        }
        KeyCode::Enter => match app.config.default_stickers.get(selected) {
            Some(url) => {
                let url = url.clone();
                update(app, ChatIntent::SendSticker(url)).await;
            }
            None => update(app, ChatIntent::DismissOverlay).await,
        },
        KeyCode::Esc => update(app, ChatIntent::DismissOverlay).await,
        _ => {}
    }
}
