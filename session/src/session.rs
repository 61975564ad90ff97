pub mod config;
pub mod controller;
pub mod credentials;
pub mod profile;
pub mod transport;

pub use config::ClientConfig;
pub use controller::{ChatController, ChatError, Notification, JOIN_NOTICE};
pub use credentials::{Credential, BEARER_PREFIX};
pub use profile::{ProfileError, ProfileResolver, UserProfile};
pub use transport::{
    SessionState, TransportError, TransportEvent, TransportEventKind, TransportSession,
};
