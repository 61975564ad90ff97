mod app;
mod event;
mod input_handler;
mod model;
mod tui;
mod update;
mod view;

use clap::Parser;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use session::config::DEFAULT_BASE_URL;
use session::{ChatController, ClientConfig};

use app::App;
use event::{Event, EventHandler};
use tui::Tui;
use update::{update, ChatIntent};

/// Terminal client for the chat backend.
#[derive(Debug, Parser)]
#[command(name = "chat_tui", about = "Terminal chat client")]
struct Args {
    /// HTTP base of the chat backend.
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,
    /// Chat endpoint base override for split deployments.
    #[arg(long)]
    chat_base_url: Option<String>,
    /// Bearer token; connects on startup when a room is also given.
    #[arg(long)]
    token: Option<String>,
    /// Room to join; connects on startup when a token is also given.
    #[arg(long)]
    room: Option<String>,
    /// Directory the rolling log file is written to.
    #[arg(long, default_value = "logs")]
    log_dir: String,
}

/// Logs go to a rolling file so they never land on the alternate screen.
fn init_tracing(log_dir: &str) -> tracing_appender::non_blocking::WorkerGuard {
    let file_appender = tracing_appender::rolling::daily(log_dir, "chat_tui.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();
    guard
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let _guard = init_tracing(&args.log_dir);

    let mut config = ClientConfig::new(args.base_url);
    config.chat_base_url = args.chat_base_url;

    let (notify_tx, mut notifications) = mpsc::unbounded_channel();
    let (controller, mut transport_events) = ChatController::new(config.clone(), notify_tx);
    let mut app = App::new(controller, config);

    // Credentials supplied up front connect straight into the chat view.
    if let (Some(token), Some(room)) = (args.token, args.room) {
        app.model.token_input = token;
        app.model.room_input = room;
        update(&mut app, ChatIntent::Connect).await;
    }

    // Initialize the terminal user interface.
    let backend = CrosstermBackend::new(std::io::stderr());
    let terminal = Terminal::new(backend)?;
    let events = EventHandler::new(250);
    let mut tui = Tui::new(terminal, events);
    tui.enter()?;

    while !app.is_done() {
        // Render the user interface.
        tui.draw(&mut app)?;
        // Handle terminal input, transport events and controller
        // notifications on the same loop; the controller state has a
        // single writer.
        tokio::select! {
            terminal_event = tui.events.next() => match terminal_event? {
                Event::Tick => {}
                Event::Key(key_event) => {
                    input_handler::handle_key_events(key_event, &mut app).await
                }
                Event::Mouse(_) => {}
                Event::Resize(_, _) => {}
            },
            Some(transport_event) = transport_events.recv() => {
                app.controller.handle_transport_event(transport_event);
            }
            Some(notification) = notifications.recv() => {
                app.apply_notification(notification);
            }
        }
    }

    tui.exit()?;
    Ok(())
}
