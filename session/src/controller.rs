use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use protocol::codec::{self, CodecError};
use protocol::{ChatMessage, EventType};

use crate::config::ClientConfig;
use crate::credentials::{Credential, BEARER_PREFIX};
use crate::profile::{ProfileError, ProfileResolver, UserProfile};
use crate::transport::{
    SessionState, TransportError, TransportEvent, TransportEventKind, TransportSession,
};

/// Notice auto-published right after a successful subscription. The echo
/// landing back in the log doubles as a connectivity self-check.
pub const JOIN_NOTICE: &str = "User joined the chat";

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("token must carry the '{}' scheme prefix", BEARER_PREFIX.trim_end())]
    InvalidCredentialFormat,
    #[error("message content cannot be empty")]
    EmptyMessage,
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// State and stream updates pushed to the presentation layer.
#[derive(Debug)]
pub enum Notification {
    StateChanged(SessionState),
    MessageAppended(ChatMessage),
    Failure(TransportError),
}

/// Orchestrates profile resolution and the transport session, and owns the
/// ordered message log. All mutation happens on the owner's task; the
/// presentation layer observes through the notification channel and the
/// read accessors.
pub struct ChatController {
    config: ClientConfig,
    resolver: ProfileResolver,
    transport: TransportSession,
    state: SessionState,
    credential: Option<Credential>,
    profile: Option<UserProfile>,
    log: Vec<ChatMessage>,
    connection: Option<Uuid>,
    notifications: mpsc::UnboundedSender<Notification>,
}

impl ChatController {
    /// Builds a controller and hands back the receiver the caller's event
    /// loop must drain into [`ChatController::handle_transport_event`].
    pub fn new(
        config: ClientConfig,
        notifications: mpsc::UnboundedSender<Notification>,
    ) -> (Self, mpsc::UnboundedReceiver<TransportEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let resolver = ProfileResolver::new(config.profile_url());
        let controller = ChatController {
            resolver,
            transport: TransportSession::new(events_tx),
            config,
            state: SessionState::Disconnected,
            credential: None,
            profile: None,
            log: Vec::new(),
            connection: None,
            notifications,
        };
        (controller, events_rx)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    pub fn room_id(&self) -> Option<&str> {
        self.credential.as_ref().map(|c| c.room_id.as_str())
    }

    /// Ordered message log of the current session: arrival order, appended
    /// only, self-echoes included.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.log
    }

    /// Validates the credential, resolves the profile, establishes the chat
    /// session and announces the user's presence.
    ///
    /// Any failure along the chain leaves the controller disconnected and
    /// surfaces the specific error. A malformed credential is rejected
    /// before any network attempt.
    #[instrument(skip_all, fields(room_id = %credential.room_id))]
    pub async fn connect(&mut self, credential: Credential) -> Result<(), ChatError> {
        if !credential.is_well_formed() {
            warn!("rejecting malformed credential before any network attempt");
            return Err(ChatError::InvalidCredentialFormat);
        }

        self.set_state(SessionState::Connecting);

        let profile = match self.resolver.resolve(&credential).await {
            Ok(profile) => profile,
            Err(e) => {
                self.set_state(SessionState::Disconnected);
                return Err(e.into());
            }
        };

        let connection = match self.transport.open(&self.config.chat_url(), &credential).await {
            Ok(connection) => connection,
            Err(e) => {
                self.set_state(SessionState::Disconnected);
                return Err(e.into());
            }
        };

        if let Err(e) = self.transport.subscribe(&credential.room_id) {
            self.transport.close();
            self.set_state(SessionState::Disconnected);
            return Err(e.into());
        }

        self.connection = Some(connection);
        self.profile = Some(profile);
        self.credential = Some(credential);
        // A fresh session starts with an empty log.
        self.log.clear();
        self.set_state(SessionState::Connected);

        self.publish(JOIN_NOTICE, EventType::Text)?;
        info!("chat session connected");
        Ok(())
    }

    /// Encodes and publishes a message to the current room.
    ///
    /// Empty content is rejected without transmission. Outside the connected
    /// state one implicit reconnect with the last known credential is
    /// attempted before giving up.
    pub async fn send_message(&mut self, content: &str, kind: EventType) -> Result<(), ChatError> {
        if content.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        if self.state != SessionState::Connected {
            let credential = self
                .credential
                .clone()
                .ok_or(TransportError::NotConnected)?;
            warn!("not connected, attempting implicit reconnect before send");
            self.connect(credential).await?;
        }

        self.publish(content, kind)
    }

    fn publish(&mut self, content: &str, kind: EventType) -> Result<(), ChatError> {
        let profile = self.profile.as_ref().ok_or(TransportError::NotConnected)?;
        let credential = self.credential.as_ref().ok_or(TransportError::NotConnected)?;
        let envelope = codec::encode(
            &profile.user_id,
            &profile.name,
            &credential.room_id,
            kind,
            content,
        );
        self.transport.publish(&credential.room_id, envelope)?;
        Ok(())
    }

    /// Applies a transport event to the session. Events from a superseded
    /// connection are discarded rather than applied.
    pub fn handle_transport_event(&mut self, event: TransportEvent) {
        if self.connection != Some(event.connection) {
            info!(connection = %event.connection, "discarding event from superseded connection");
            return;
        }
        match event.kind {
            // State already advanced by connect(); the event exists for
            // observers draining the channel.
            TransportEventKind::Connected => {}
            TransportEventKind::Message(envelope) => match codec::decode(envelope) {
                Ok(message) => {
                    self.log.push(message.clone());
                    let _ = self
                        .notifications
                        .send(Notification::MessageAppended(message));
                }
                Err(e) => {
                    // Malformed inbound payloads are dropped; the session
                    // keeps processing subsequent messages.
                    warn!(error = %e, "dropping malformed inbound message");
                }
            },
            TransportEventKind::Error(e) => {
                error!(error = %e, "transport failure, session is now disconnected");
                self.transport.close();
                self.connection = None;
                self.set_state(SessionState::Disconnected);
                let _ = self.notifications.send(Notification::Failure(e));
            }
            TransportEventKind::Closed => {
                info!("transport closed");
                self.transport.close();
                self.connection = None;
                self.set_state(SessionState::Disconnected);
            }
        }
    }

    /// Ends the session: closes the transport, discards profile and
    /// credential. Idempotent. The message log stays readable until the
    /// next connect overwrites it.
    #[instrument(skip_all)]
    pub fn disconnect(&mut self) {
        self.transport.close();
        self.connection = None;
        self.profile = None;
        self.credential = None;
        self.set_state(SessionState::Disconnected);
    }

    fn set_state(&mut self, state: SessionState) {
        if self.state != state {
            self.state = state;
            let _ = self.notifications.send(Notification::StateChanged(state));
        }
    }
}
