use thiserror::Error;

use crate::{ChatMessage, Envelope, EventType, ANONYMOUS_SENDER};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("malformed message: {reason}")]
    MalformedMessage { reason: &'static str },
}

/// Builds the outbound wire envelope for a locally authored message.
/// Well-formed inputs always produce a well-formed envelope.
pub fn encode(
    sender_id: &str,
    sender_name: &str,
    room_id: &str,
    kind: EventType,
    content: &str,
) -> Envelope {
    Envelope {
        sender_id: sender_id.to_string(),
        sender_name: Some(sender_name.to_string()),
        room_external_id: Some(room_id.to_string()),
        event_type: kind,
        content: Some(content.to_string()),
    }
}

/// Maps an inbound envelope into a [`ChatMessage`].
///
/// An absent `senderName` is tolerated and replaced with
/// [`ANONYMOUS_SENDER`]; an absent `content` is not.
pub fn decode(envelope: Envelope) -> Result<ChatMessage, CodecError> {
    let content = match envelope.content {
        Some(content) if !content.is_empty() => content,
        _ => {
            return Err(CodecError::MalformedMessage {
                reason: "missing content",
            })
        }
    };

    let sender_name = envelope
        .sender_name
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| ANONYMOUS_SENDER.to_string());

    Ok(ChatMessage {
        sender_id: envelope.sender_id,
        sender_name,
        content,
        kind: envelope.event_type,
    })
}
