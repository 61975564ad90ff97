mod support;

use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;

use protocol::EventType;
use session::{
    ChatController, ChatError, ClientConfig, Credential, Notification, ProfileError, SessionState,
    TransportError, TransportEvent, TransportEventKind, JOIN_NOTICE,
};

const VALID_TOKEN: &str = "Bearer abc";
const PROFILE_BODY: &str =
    r#"{"name":"Alice","email":"alice@example.com","userId":"u1","role":"USER"}"#;

struct Harness {
    controller: ChatController,
    transport_events: mpsc::UnboundedReceiver<TransportEvent>,
    notifications: mpsc::UnboundedReceiver<Notification>,
    chat_addr: std::net::SocketAddr,
}

/// Spins up a profile server accepting `expected_token` and a chat server,
/// and wires a controller against both.
async fn setup_harness(expected_token: &'static str) -> Harness {
    let profile_addr = support::spawn_profile_server(expected_token, PROFILE_BODY).await;
    let chat_addr = support::spawn_chat_server().await;

    let mut config = ClientConfig::new(format!("http://{}", profile_addr));
    config.chat_base_url = Some(format!("http://{}", chat_addr));

    let (notify_tx, notifications) = mpsc::unbounded_channel();
    let (controller, transport_events) = ChatController::new(config, notify_tx);
    Harness {
        controller,
        transport_events,
        notifications,
        chat_addr,
    }
}

/// Drains transport events into the controller until the predicate holds,
/// in the role the app's event loop plays in production.
async fn pump_until<F>(harness: &mut Harness, mut done: F)
where
    F: FnMut(&ChatController) -> bool,
{
    while !done(&harness.controller) {
        let event = timeout(Duration::from_secs(2), harness.transport_events.recv())
            .await
            .expect("timed out waiting for a transport event")
            .expect("transport event channel closed");
        harness.controller.handle_transport_event(event);
    }
}

fn random_room() -> String {
    format!("room-{}", utils::generate_random_string(8))
}

/// Binds and immediately drops a listener to obtain an address nothing is
/// serving on.
async fn dead_addr() -> std::net::SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

#[tokio::test]
async fn connect_establishes_session_and_echoes_join_notice() {
    let mut harness = setup_harness(VALID_TOKEN).await;
    let room = random_room();

    harness
        .controller
        .connect(Credential::new(VALID_TOKEN.to_string(), room))
        .await
        .expect("connect failed");

    assert_eq!(harness.controller.state(), SessionState::Connected);
    assert_eq!(harness.controller.profile().unwrap().name, "Alice");

    pump_until(&mut harness, |c| !c.messages().is_empty()).await;
    let first = &harness.controller.messages()[0];
    assert_eq!(first.content, JOIN_NOTICE);
    assert_eq!(first.sender_id, "u1");
    assert_eq!(first.sender_name, "Alice");
    assert_eq!(first.kind, EventType::Text);

    assert!(matches!(
        harness.notifications.try_recv(),
        Ok(Notification::StateChanged(SessionState::Connecting))
    ));
}

#[tokio::test]
async fn sending_a_gif_addresses_the_room_with_the_gif_event_type() {
    let mut harness = setup_harness(VALID_TOKEN).await;
    let room = random_room();

    harness
        .controller
        .connect(Credential::new(VALID_TOKEN.to_string(), room))
        .await
        .expect("connect failed");

    let url = "https://media.example/cat.gif";
    harness
        .controller
        .send_message(url, EventType::Gif)
        .await
        .expect("send failed");

    pump_until(&mut harness, |c| c.messages().len() >= 2).await;
    let gif = &harness.controller.messages()[1];
    assert_eq!(gif.kind, EventType::Gif);
    assert_eq!(gif.content, url);
    assert_eq!(gif.sender_id, "u1");
}

#[tokio::test]
async fn rejected_credential_surfaces_authentication_failure() {
    let mut harness = setup_harness(VALID_TOKEN).await;

    let result = harness
        .controller
        .connect(Credential::new(
            "Bearer someone-else".to_string(),
            random_room(),
        ))
        .await;

    assert!(matches!(
        result,
        Err(ChatError::Profile(ProfileError::AuthenticationFailed { .. }))
    ));
    assert_eq!(harness.controller.state(), SessionState::Disconnected);
}

#[tokio::test]
async fn unreachable_profile_endpoint_is_network_unavailable() {
    let (notify_tx, _notifications) = mpsc::unbounded_channel();
    let config = ClientConfig::new(format!("http://{}", dead_addr().await));
    let (mut controller, _events) = ChatController::new(config, notify_tx);

    let result = controller
        .connect(Credential::new(VALID_TOKEN.to_string(), random_room()))
        .await;

    assert!(matches!(
        result,
        Err(ChatError::Profile(ProfileError::NetworkUnavailable { .. }))
    ));
    assert_eq!(controller.state(), SessionState::Disconnected);
}

#[tokio::test]
async fn handshake_rejection_classifies_as_protocol_error() {
    // The profile endpoint accepts this token; the chat server refuses it
    // at the CONNECT frame.
    let mut harness = setup_harness(support::REJECTED_TOKEN).await;

    let result = harness
        .controller
        .connect(Credential::new(
            support::REJECTED_TOKEN.to_string(),
            random_room(),
        ))
        .await;

    assert!(matches!(
        result,
        Err(ChatError::Transport(TransportError::Protocol { .. }))
    ));
    assert_eq!(harness.controller.state(), SessionState::Disconnected);
}

#[tokio::test]
async fn unreachable_chat_endpoint_classifies_as_transport_error() {
    let profile_addr = support::spawn_profile_server(VALID_TOKEN, PROFILE_BODY).await;
    let mut config = ClientConfig::new(format!("http://{}", profile_addr));
    config.chat_base_url = Some(format!("http://{}", dead_addr().await));

    let (notify_tx, _notifications) = mpsc::unbounded_channel();
    let (mut controller, _events) = ChatController::new(config, notify_tx);

    let result = controller
        .connect(Credential::new(VALID_TOKEN.to_string(), random_room()))
        .await;

    assert!(matches!(
        result,
        Err(ChatError::Transport(TransportError::Transport(_)))
    ));
    assert_eq!(controller.state(), SessionState::Disconnected);
}

#[tokio::test]
async fn inbound_messages_preserve_arrival_order_and_malformed_are_dropped() {
    let mut harness = setup_harness(VALID_TOKEN).await;
    let room = random_room();

    harness
        .controller
        .connect(Credential::new(VALID_TOKEN.to_string(), room.clone()))
        .await
        .expect("connect failed");
    pump_until(&mut harness, |c| !c.messages().is_empty()).await;

    support::raw_client_publish(
        harness.chat_addr,
        VALID_TOKEN,
        &room,
        &[
            serde_json::json!({
                "senderId": "u2", "senderName": "Bob",
                "eventType": "TEXT", "content": "one"
            }),
            // No content: must be dropped, not appended.
            serde_json::json!({"senderId": "u2", "senderName": "Bob", "eventType": "TEXT"}),
            // No sender name: must fall back to the sentinel.
            serde_json::json!({"senderId": "u3", "eventType": "TEXT", "content": "two"}),
            serde_json::json!({
                "senderId": "u2", "senderName": "Bob",
                "eventType": "TEXT", "content": "three"
            }),
        ],
    )
    .await;

    pump_until(&mut harness, |c| c.messages().len() >= 4).await;
    let messages = harness.controller.messages();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[1].content, "one");
    assert_eq!(messages[2].content, "two");
    assert_eq!(messages[2].sender_name, "Anonymous");
    assert_eq!(messages[3].content, "three");
}

#[tokio::test]
async fn late_events_after_disconnect_are_discarded() {
    let mut harness = setup_harness(VALID_TOKEN).await;
    let room = random_room();

    harness
        .controller
        .connect(Credential::new(VALID_TOKEN.to_string(), room))
        .await
        .expect("connect failed");

    // The first event on the channel announces the live connection.
    let connected = timeout(Duration::from_secs(2), harness.transport_events.recv())
        .await
        .unwrap()
        .unwrap();
    let connection = connected.connection;
    assert!(matches!(connected.kind, TransportEventKind::Connected));
    harness.controller.handle_transport_event(connected);

    pump_until(&mut harness, |c| !c.messages().is_empty()).await;
    let logged = harness.controller.messages().len();

    harness.controller.disconnect();

    let late = TransportEvent {
        connection,
        kind: TransportEventKind::Message(protocol::codec::encode(
            "u9", "Mallory", "room-x", EventType::Text, "late",
        )),
    };
    harness.controller.handle_transport_event(late);

    assert_eq!(harness.controller.state(), SessionState::Disconnected);
    // History stays readable after disconnect, but the late result is
    // discarded rather than applied.
    assert_eq!(harness.controller.messages().len(), logged);
}

#[tokio::test]
async fn send_after_a_dropped_transport_reconnects_implicitly() {
    let mut harness = setup_harness(VALID_TOKEN).await;
    let room = random_room();

    harness
        .controller
        .connect(Credential::new(VALID_TOKEN.to_string(), room))
        .await
        .expect("connect failed");

    let connected = timeout(Duration::from_secs(2), harness.transport_events.recv())
        .await
        .unwrap()
        .unwrap();
    let connection = connected.connection;
    harness.controller.handle_transport_event(connected);

    // A mid-session drop: the reader reports closure, the controller falls
    // back to disconnected but keeps the credential.
    harness.controller.handle_transport_event(TransportEvent {
        connection,
        kind: TransportEventKind::Closed,
    });
    assert_eq!(harness.controller.state(), SessionState::Disconnected);

    harness
        .controller
        .send_message("back online", EventType::Text)
        .await
        .expect("implicit reconnect failed");
    assert_eq!(harness.controller.state(), SessionState::Connected);

    pump_until(&mut harness, |c| {
        c.messages().iter().any(|m| m.content == "back online")
    })
    .await;
}
