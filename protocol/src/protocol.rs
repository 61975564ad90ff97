use serde_derive::{Deserialize, Serialize};

pub mod codec;
pub mod frames;

pub type RoomId = String;
pub type Topic = String;

/// Sender name substituted when an inbound envelope carries none.
pub const ANONYMOUS_SENDER: &str = "Anonymous";

/// Kind of a chat message. The serialized tags are the wire names the server
/// expects in the envelope's `eventType` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Text,
    Emoji,
    Gif,
    Sticker,
}

/// A message as the rest of the client sees it: already validated, sender
/// name filled in. `content` is literal text for [`EventType::Text`] and
/// [`EventType::Emoji`], a URL for [`EventType::Gif`] and
/// [`EventType::Sticker`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender_id: String,
    pub sender_name: String,
    pub content: String,
    pub kind: EventType,
}

/// Wire envelope exchanged with the chat server, field names matching the
/// server's JSON contract. Inbound envelopes from partial or legacy senders
/// may omit everything except `eventType`; the codec decides what is
/// tolerable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    #[serde(default)]
    pub sender_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,
    /// Outbound only; inbound messages are scoped by topic instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_external_id: Option<RoomId>,
    pub event_type: EventType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Topic a room's messages are delivered on.
pub fn room_topic(room_id: &str) -> Topic {
    format!("/topic/room/{}", room_id)
}

/// Server-side destination outbound messages for a room are published to.
pub fn send_destination(room_id: &str) -> String {
    format!("/app/sendMessage/{}", room_id)
}
