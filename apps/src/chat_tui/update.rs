use tracing::warn;

use protocol::EventType;
use session::Credential;

use crate::app::App;
use crate::model::{Overlay, RunningState};

/// User intents delegated to the session controller. Picker selections
/// funnel through the same send path as typed text, tagged with their kind.
#[derive(Debug)]
pub enum ChatIntent {
    Connect,
    Disconnect,
    SendText,
    SendEmoji(String),
    SendGif,
    SendSticker(String),
    DismissOverlay,
    Quit,
}

pub async fn update(app: &mut App, intent: ChatIntent) {
    match intent {
        ChatIntent::Connect => connect(app).await,
        ChatIntent::Disconnect => disconnect(app),
        ChatIntent::SendText => {
            let content = app.model.input.clone();
            if send(app, &content, EventType::Text).await {
                app.model.input.clear();
            }
        }
        ChatIntent::SendEmoji(glyph) => {
            app.model.overlay = Overlay::None;
            send(app, &glyph, EventType::Emoji).await;
        }
        ChatIntent::SendGif => {
            let url = app.model.gif_input.clone();
            app.model.overlay = Overlay::None;
            if send(app, &url, EventType::Gif).await {
                app.model.gif_input.clear();
            }
        }
        ChatIntent::SendSticker(url) => {
            app.model.overlay = Overlay::None;
            send(app, &url, EventType::Sticker).await;
        }
        ChatIntent::DismissOverlay => app.model.overlay = Overlay::None,
        ChatIntent::Quit => app.model.running_state = RunningState::Done,
    }
}

async fn connect(app: &mut App) {
    let credential = Credential::new(
        app.model.token_input.clone(),
        app.model.room_input.clone(),
    );
    match app.controller.connect(credential).await {
        Ok(()) => {
            app.model.running_state = RunningState::ChatView;
            app.model.status = None;
            app.model.received_at.clear();
        }
        Err(e) => {
            warn!(error = %e, "connect failed");
            app.model.status = Some(e.to_string());
        }
    }
}

fn disconnect(app: &mut App) {
    app.controller.disconnect();
    app.model.overlay = Overlay::None;
    app.model.running_state = RunningState::ConnectView;
}

async fn send(app: &mut App, content: &str, kind: EventType) -> bool {
    match app.controller.send_message(content, kind).await {
        Ok(()) => {
            app.model.status = None;
            true
        }
        Err(e) => {
            warn!(error = %e, "send failed");
            app.model.status = Some(e.to_string());
            false
        }
    }
}
