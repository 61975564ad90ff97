use std::net::SocketAddr;
use std::sync::Once;

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use protocol::frames::{ClientFrame, ServerFrame};

/// Token the mock chat server refuses at handshake time, so tests can drive
/// a protocol-level rejection after a successful profile resolution.
pub const REJECTED_TOKEN: &str = "Bearer reject-handshake";

static ONCE: Once = Once::new();

fn init_tracing() {
    ONCE.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

/// Serves canned profile responses: `200` with `body` when the request
/// carries `expected_token` in its `Authorization` header, `401` otherwise.
pub async fn spawn_profile_server(expected_token: &'static str, body: &'static str) -> SocketAddr {
    init_tracing();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((socket, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(answer_profile_request(socket, expected_token, body));
        }
    });
    addr
}

async fn answer_profile_request(mut socket: TcpStream, expected_token: &str, body: &str) {
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    while !request.windows(4).any(|window| window == b"\r\n\r\n") {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => request.extend_from_slice(&buf[..n]),
        }
    }
    let request = String::from_utf8_lossy(&request);
    let authorized = request.lines().any(|line| {
        line.strip_prefix("Authorization: ").map(str::trim) == Some(expected_token)
            || line.strip_prefix("authorization: ").map(str::trim) == Some(expected_token)
    });
    let (status, payload) = if authorized {
        ("200 OK", body)
    } else {
        ("401 Unauthorized", "{}")
    };
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        payload.len(),
        payload
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

/// Spawns a chat server speaking the frame protocol: CONNECT/CONNECTED
/// handshake, per-connection topic subscription, SEND fan-out to every
/// subscriber of the destination room (the sender's own subscription
/// included, which is how echoes reach the client under test).
pub async fn spawn_chat_server() -> SocketAddr {
    init_tracing();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (fanout, _) = broadcast::channel::<String>(64);
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(serve_chat_client(stream, fanout.clone()));
        }
    });
    addr
}

async fn serve_chat_client(stream: TcpStream, fanout: broadcast::Sender<String>) {
    let Ok(socket) = accept_async(stream).await else {
        return;
    };
    let (mut sink, mut stream) = socket.split();
    let mut subscription: Option<(String, broadcast::Receiver<String>)> = None;

    loop {
        tokio::select! {
            inbound = stream.next() => {
                let Some(Ok(WsMessage::Text(text))) = inbound else {
                    break;
                };
                let Ok(frame) = serde_json::from_str::<ClientFrame>(&text) else {
                    continue;
                };
                match frame {
                    ClientFrame::Connect { authorization } => {
                        let reply = if authorization.starts_with("Bearer ")
                            && authorization != REJECTED_TOKEN
                        {
                            ServerFrame::Connected
                        } else {
                            ServerFrame::Error {
                                message: "bad credentials".to_string(),
                            }
                        };
                        let text = serde_json::to_string(&reply).unwrap();
                        if sink.send(WsMessage::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    ClientFrame::Subscribe { topic } => {
                        subscription = Some((topic, fanout.subscribe()));
                    }
                    ClientFrame::Send { destination, body } => {
                        let room = destination.rsplit('/').next().unwrap_or_default();
                        let frame = ServerFrame::Message {
                            topic: protocol::room_topic(room),
                            body,
                        };
                        let _ = fanout.send(serde_json::to_string(&frame).unwrap());
                    }
                    ClientFrame::Disconnect => break,
                }
            }
            outbound = recv_subscribed(&mut subscription) => {
                let Some(text) = outbound else {
                    break;
                };
                if sink.send(WsMessage::Text(text)).await.is_err() {
                    break;
                }
            }
        }
    }
}

async fn recv_subscribed(
    subscription: &mut Option<(String, broadcast::Receiver<String>)>,
) -> Option<String> {
    match subscription {
        Some((topic, receiver)) => loop {
            match receiver.recv().await {
                Ok(text) => {
                    let on_topic = serde_json::from_str::<ServerFrame>(&text)
                        .map(|frame| {
                            matches!(&frame, ServerFrame::Message { topic: t, .. } if t == topic)
                        })
                        .unwrap_or(false);
                    if on_topic {
                        return Some(text);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        },
        None => std::future::pending().await,
    }
}

/// Drives a bare client through the handshake and publishes raw envelope
/// bodies, bypassing the codec so tests can inject partial payloads.
pub async fn raw_client_publish(
    addr: SocketAddr,
    token: &str,
    room_id: &str,
    bodies: &[serde_json::Value],
) {
    let url = format!("ws://{}/chat", addr);
    let (mut socket, _) = tokio_tungstenite::connect_async(url).await.unwrap();

    let connect = ClientFrame::Connect {
        authorization: token.to_string(),
    };
    socket
        .send(WsMessage::Text(serde_json::to_string(&connect).unwrap()))
        .await
        .unwrap();
    let reply = socket.next().await.unwrap().unwrap();
    let WsMessage::Text(text) = reply else {
        panic!("expected a text frame, got {:?}", reply);
    };
    let frame: ServerFrame = serde_json::from_str(&text).unwrap();
    assert!(
        matches!(frame, ServerFrame::Connected),
        "handshake failed: {:?}",
        frame
    );

    for body in bodies {
        let frame = serde_json::json!({
            "frame": "SEND",
            "destination": protocol::send_destination(room_id),
            "body": body,
        });
        socket
            .send(WsMessage::Text(frame.to_string()))
            .await
            .unwrap();
    }
    socket.close(None).await.unwrap();
}
