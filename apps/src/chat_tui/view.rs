use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph, Wrap};
use ratatui::Frame;

use protocol::{ChatMessage, EventType};
use session::SessionState;

use crate::app::App;
use crate::model::{ConnectField, Overlay, RunningState, EMOJI_CHOICES};

pub fn render(app: &App, frame: &mut Frame) {
    match app.model.running_state {
        RunningState::ConnectView => render_connect_view(app, frame),
        RunningState::ChatView => render_chat_view(app, frame),
        RunningState::Done => {}
    }
}

fn render_connect_view(app: &App, frame: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(0),
            ]
            .as_ref(),
        )
        .split(frame.area());

    let title = Paragraph::new("Connect to start chatting")
        .style(Style::default().fg(Color::Cyan))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::White))
                .title("Chat")
                .border_type(BorderType::Plain),
        );
    frame.render_widget(title, chunks[0]);

    frame.render_widget(
        input_field(
            &app.model.token_input,
            "Bearer Token",
            app.model.focus == ConnectField::Token,
        ),
        chunks[1],
    );
    frame.render_widget(
        input_field(
            &app.model.room_input,
            "Room ID",
            app.model.focus == ConnectField::Room,
        ),
        chunks[2],
    );

    if let Some(status) = &app.model.status {
        let status = Paragraph::new(status.as_str())
            .style(Style::default().fg(Color::Red))
            .block(Block::default().borders(Borders::ALL).title("Error"));
        frame.render_widget(status, chunks[3]);
    }
}

fn input_field<'a>(value: &'a str, title: &'a str, focused: bool) -> Paragraph<'a> {
    let style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::White)
    };
    Paragraph::new(value).style(style).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_type(BorderType::Plain),
    )
}

fn render_chat_view(app: &App, frame: &mut Frame) {
    let overlay_height = match app.model.overlay {
        Overlay::None => 0,
        Overlay::EmojiPicker { .. } | Overlay::GifPrompt => 3,
        Overlay::StickerPicker { .. } => app.config.default_stickers.len() as u16 + 2,
    };

    let mut constraints = vec![Constraint::Length(4), Constraint::Min(1)];
    if overlay_height > 0 {
        constraints.push(Constraint::Length(overlay_height));
    }
    constraints.push(Constraint::Length(3));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(constraints)
        .split(frame.area());

    render_header(app, frame, chunks[0]);
    render_messages(app, frame, chunks[1]);
    if overlay_height > 0 {
        render_overlay(app, frame, chunks[2]);
    }
    let input_chunk = chunks[chunks.len() - 1];

    let input = Paragraph::new(app.model.input.as_str())
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL).title(
            "Message (Enter send | ^E emoji | ^G gif | ^S stickers | Esc disconnect)",
        ));
    frame.render_widget(input, input_chunk);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let state = match app.controller.state() {
        SessionState::Connected => "connected",
        SessionState::Connecting => "connecting",
        SessionState::Disconnected => "disconnected",
    };
    let info = format!(
        "Room: {} | User: {} | {}",
        app.controller.room_id().unwrap_or("-"),
        app.controller
            .profile()
            .map(|profile| profile.name.as_str())
            .unwrap_or("-"),
        state,
    );

    let mut lines = vec![Line::from(info)];
    if let Some(status) = &app.model.status {
        lines.push(Line::from(Span::styled(
            status.as_str(),
            Style::default().fg(Color::Red),
        )));
    }

    let header = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .style(Style::default().fg(Color::White))
            .border_type(BorderType::Plain),
    );
    frame.render_widget(header, area);
}

fn render_messages(app: &App, frame: &mut Frame, area: Rect) {
    let own_id = app
        .controller
        .profile()
        .map(|profile| profile.user_id.as_str());
    let lines: Vec<Line> = app
        .controller
        .messages()
        .iter()
        .enumerate()
        .map(|(i, message)| {
            let stamp = app
                .model
                .received_at
                .get(i)
                .map(|millis| clock_time(*millis))
                .unwrap_or_default();
            message_line(message, own_id, stamp)
        })
        .collect();

    let messages = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("Messages"));
    frame.render_widget(messages, area);
}

fn message_line(message: &ChatMessage, own_id: Option<&str>, stamp: String) -> Line<'static> {
    let mine = own_id == Some(message.sender_id.as_str());
    let name_style = if mine {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::Green)
    };
    let body = match message.kind {
        EventType::Gif => format!("[GIF] {}", message.content),
        EventType::Sticker => format!("[STICKER] {}", message.content),
        EventType::Text | EventType::Emoji => message.content.clone(),
    };
    Line::from(vec![
        Span::styled(format!("[{}] ", stamp), Style::default().fg(Color::DarkGray)),
        Span::styled(format!("{}: ", message.sender_name), name_style),
        Span::raw(body),
    ])
}

fn render_overlay(app: &App, frame: &mut Frame, area: Rect) {
    match app.model.overlay {
        Overlay::None => {}
        Overlay::EmojiPicker { selected } => {
            let spans: Vec<Span> = EMOJI_CHOICES
                .iter()
                .enumerate()
                .map(|(i, glyph)| {
                    let style = if i == selected {
                        Style::default().add_modifier(Modifier::REVERSED)
                    } else {
                        Style::default()
                    };
                    Span::styled(format!(" {} ", glyph), style)
                })
                .collect();
            let picker = Paragraph::new(Line::from(spans)).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Emoji (Left/Right pick, Enter send, Esc dismiss)"),
            );
            frame.render_widget(picker, area);
        }
        Overlay::GifPrompt => {
            let prompt = Paragraph::new(app.model.gif_input.as_str())
                .style(Style::default().fg(Color::Yellow))
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title("GIF URL (Enter send, Esc dismiss)"),
                );
            frame.render_widget(prompt, area);
        }
        Overlay::StickerPicker { selected } => {
            let lines: Vec<Line> = app
                .config
                .default_stickers
                .iter()
                .enumerate()
                .map(|(i, url)| {
                    let style = if i == selected {
                        Style::default().add_modifier(Modifier::REVERSED)
                    } else {
                        Style::default()
                    };
                    Line::from(Span::styled(url.as_str(), style))
                })
                .collect();
            let picker = Paragraph::new(lines).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Stickers (Up/Down pick, Enter send, Esc dismiss)"),
            );
            frame.render_widget(picker, area);
        }
    }
}

/// Wall-clock "HH:MM" (UTC) for a millisecond timestamp.
fn clock_time(millis: u128) -> String {
    let minutes_of_day = (millis / 1000 / 60) % (24 * 60);
    format!("{:02}:{:02}", minutes_of_day / 60, minutes_of_day % 60)
}
