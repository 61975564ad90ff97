use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use protocol::frames::{ClientFrame, ServerFrame};
use protocol::{room_topic, send_destination, Envelope, RoomId, Topic};

use crate::credentials::Credential;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connection lifecycle states.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Errors surfaced by the transport layer.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Low-level connection failure: dial, socket read or write.
    #[error("transport failure: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),
    /// Handshake or application-level protocol failure.
    #[error("protocol failure: {reason}")]
    Protocol { reason: String },
    /// Operation requires an established connection.
    #[error("session is not connected")]
    NotConnected,
}

/// Event produced by a live connection, delivered in transport arrival
/// order. `connection` identifies the connection that produced the event;
/// events from a superseded connection must be discarded by the receiver.
#[derive(Debug)]
pub struct TransportEvent {
    pub connection: Uuid,
    pub kind: TransportEventKind,
}

#[derive(Debug)]
pub enum TransportEventKind {
    Connected,
    Message(Envelope),
    Error(TransportError),
    Closed,
}

struct Connection {
    id: Uuid,
    outbound: mpsc::UnboundedSender<ClientFrame>,
    reader: JoinHandle<()>,
    topic: Option<Topic>,
}

/// Owns the lifecycle of the chat connection: open with an authenticated
/// handshake, one standing room subscription, fire-and-forget publishing,
/// idempotent close. State mutation happens only on the owner's task; the
/// spawned reader and writer communicate exclusively through channels.
pub struct TransportSession {
    state: SessionState,
    events: mpsc::UnboundedSender<TransportEvent>,
    connection: Option<Connection>,
}

impl TransportSession {
    pub fn new(events: mpsc::UnboundedSender<TransportEvent>) -> Self {
        TransportSession {
            state: SessionState::Disconnected,
            events,
            connection: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Dials the chat endpoint and performs the authenticated handshake:
    /// CONNECT carrying the bearer token, answered by CONNECTED.
    ///
    /// Valid only from `Disconnected`. On failure the session is back at
    /// `Disconnected` and the error is classified as transport-level or
    /// protocol-level. No automatic retry.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn open(&mut self, url: &str, credential: &Credential) -> Result<Uuid, TransportError> {
        if self.state != SessionState::Disconnected {
            return Err(TransportError::Protocol {
                reason: "open is only valid from the disconnected state".to_string(),
            });
        }
        self.state = SessionState::Connecting;
        info!("dialing chat endpoint");

        let mut socket = match connect_async(url).await {
            Ok((socket, _)) => socket,
            Err(e) => {
                error!(error=%e, "websocket dial failed");
                self.state = SessionState::Disconnected;
                return Err(TransportError::Transport(e));
            }
        };

        if let Err(e) = handshake(&mut socket, credential).await {
            self.state = SessionState::Disconnected;
            let _ = socket.close(None).await;
            return Err(e);
        }

        let id = Uuid::new_v4();
        let (ws_sink, ws_stream) = socket.split();
        let (outbound, outbound_rx) = mpsc::unbounded_channel();

        tokio::spawn(write_loop(id, ws_sink, outbound_rx, self.events.clone()));
        let reader = tokio::spawn(read_loop(id, ws_stream, self.events.clone()));

        self.connection = Some(Connection {
            id,
            outbound,
            reader,
            topic: None,
        });
        self.state = SessionState::Connected;
        let _ = self.events.send(TransportEvent {
            connection: id,
            kind: TransportEventKind::Connected,
        });
        info!(connection = %id, "chat session established");
        Ok(id)
    }

    /// Registers the single standing room subscription. Inbound envelopes on
    /// the room's topic are delivered on the event channel in arrival order.
    #[instrument(skip_all, fields(room_id = %room_id))]
    pub fn subscribe(&mut self, room_id: &RoomId) -> Result<(), TransportError> {
        if self.state != SessionState::Connected {
            return Err(TransportError::NotConnected);
        }
        let connection = self.connection.as_mut().ok_or(TransportError::NotConnected)?;
        let topic = room_topic(room_id);
        connection
            .outbound
            .send(ClientFrame::Subscribe {
                topic: topic.clone(),
            })
            .map_err(|_| TransportError::NotConnected)?;
        if let Some(previous) = connection.topic.replace(topic) {
            warn!(previous = %previous, "replacing standing subscription");
        }
        info!("room subscription registered");
        Ok(())
    }

    /// Hands an envelope to the writer task. Fire-and-forget: a transport
    /// failure surfaces asynchronously on the event channel, never here.
    /// Fails immediately with `NotConnected` outside the connected state,
    /// without touching the socket.
    pub fn publish(&mut self, room_id: &RoomId, envelope: Envelope) -> Result<(), TransportError> {
        if self.state != SessionState::Connected {
            return Err(TransportError::NotConnected);
        }
        let connection = self.connection.as_ref().ok_or(TransportError::NotConnected)?;
        connection
            .outbound
            .send(ClientFrame::Send {
                destination: send_destination(room_id),
                body: envelope,
            })
            .map_err(|_| TransportError::NotConnected)?;
        Ok(())
    }

    /// Tears the connection down. Safe to call from any state, any number
    /// of times.
    pub fn close(&mut self) {
        if let Some(connection) = self.connection.take() {
            info!(connection = %connection.id, "closing chat session");
            // The writer drains the farewell frame and closes the socket
            // once the outbound sender is dropped with `connection`.
            let _ = connection.outbound.send(ClientFrame::Disconnect);
            connection.reader.abort();
        }
        self.state = SessionState::Disconnected;
    }
}

/// CONNECT carrying the bearer token must be answered by CONNECTED before
/// anything else flows on the connection.
async fn handshake(socket: &mut WsStream, credential: &Credential) -> Result<(), TransportError> {
    let connect = ClientFrame::Connect {
        authorization: credential.token.clone(),
    };
    let text = serde_json::to_string(&connect).map_err(|e| TransportError::Protocol {
        reason: format!("failed to serialize handshake frame: {}", e),
    })?;
    socket.send(WsMessage::Text(text)).await?;

    loop {
        let frame = match socket.next().await {
            Some(Ok(WsMessage::Text(text))) => parse_server_frame(&text)?,
            Some(Ok(WsMessage::Ping(_) | WsMessage::Pong(_))) => continue,
            Some(Ok(WsMessage::Close(_))) | None => {
                return Err(TransportError::Protocol {
                    reason: "connection closed during handshake".to_string(),
                })
            }
            Some(Ok(other)) => {
                warn!(?other, "ignoring non-text frame during handshake");
                continue;
            }
            Some(Err(e)) => return Err(TransportError::Transport(e)),
        };
        return match frame {
            ServerFrame::Connected => Ok(()),
            ServerFrame::Error { message } => {
                error!(message = %message, "handshake rejected");
                Err(TransportError::Protocol { reason: message })
            }
            other => Err(TransportError::Protocol {
                reason: format!("unexpected frame during handshake: {:?}", other),
            }),
        };
    }
}

fn parse_server_frame(text: &str) -> Result<ServerFrame, TransportError> {
    serde_json::from_str(text).map_err(|e| TransportError::Protocol {
        reason: format!("unparseable frame: {}", e),
    })
}

async fn write_loop(
    connection: Uuid,
    mut sink: SplitSink<WsStream, WsMessage>,
    mut outbound: mpsc::UnboundedReceiver<ClientFrame>,
    events: mpsc::UnboundedSender<TransportEvent>,
) {
    while let Some(frame) = outbound.recv().await {
        let text = match serde_json::to_string(&frame) {
            Ok(text) => text,
            Err(e) => {
                warn!(error=%e, "dropping unserializable frame");
                continue;
            }
        };
        if let Err(e) = sink.send(WsMessage::Text(text)).await {
            error!(error=%e, "websocket write failed");
            let _ = events.send(TransportEvent {
                connection,
                kind: TransportEventKind::Error(TransportError::Transport(e)),
            });
            break;
        }
    }
    let _ = sink.close().await;
}

async fn read_loop(
    connection: Uuid,
    mut stream: SplitStream<WsStream>,
    events: mpsc::UnboundedSender<TransportEvent>,
) {
    while let Some(item) = stream.next().await {
        match item {
            Ok(WsMessage::Text(text)) => match serde_json::from_str::<ServerFrame>(&text) {
                Ok(ServerFrame::Message { body, .. }) => {
                    let _ = events.send(TransportEvent {
                        connection,
                        kind: TransportEventKind::Message(body),
                    });
                }
                Ok(ServerFrame::Error { message }) => {
                    error!(message = %message, "server reported an error");
                    let _ = events.send(TransportEvent {
                        connection,
                        kind: TransportEventKind::Error(TransportError::Protocol {
                            reason: message,
                        }),
                    });
                }
                Ok(other) => warn!(?other, "ignoring unexpected frame"),
                Err(e) => warn!(error=%e, "dropping unparseable frame"),
            },
            Ok(WsMessage::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                error!(error=%e, "websocket read failed");
                let _ = events.send(TransportEvent {
                    connection,
                    kind: TransportEventKind::Error(TransportError::Transport(e)),
                });
                break;
            }
        }
    }
    let _ = events.send(TransportEvent {
        connection,
        kind: TransportEventKind::Closed,
    });
}
