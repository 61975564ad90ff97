use protocol::RoomId;

/// Authentication scheme prefix a token must carry to be considered
/// well-formed. Checked before any network attempt.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Bearer token and room pair supplied by the user, held for the lifetime
/// of one session and cleared on disconnect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub room_id: RoomId,
}

impl Credential {
    pub fn new(token: String, room_id: RoomId) -> Self {
        Credential { token, room_id }
    }

    /// A credential is usable only when the token carries the bearer scheme
    /// prefix and a room is named.
    pub fn is_well_formed(&self) -> bool {
        self.token.starts_with(BEARER_PREFIX) && !self.room_id.is_empty()
    }
}
