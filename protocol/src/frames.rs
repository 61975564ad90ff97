use serde_derive::{Deserialize, Serialize};

use crate::Envelope;

/// Frames the client may send over the chat connection.
///
/// `Connect` must be the first frame on a fresh connection and carries the
/// bearer token; nothing else is accepted until the server answers with
/// [`ServerFrame::Connected`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "frame", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientFrame {
    Connect { authorization: String },
    Subscribe { topic: String },
    Send { destination: String, body: Envelope },
    Disconnect,
}

/// Frames the server may send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "frame", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerFrame {
    Connected,
    Error { message: String },
    Message { topic: String, body: Envelope },
}
