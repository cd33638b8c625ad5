//! Main chat event loop
//!
//! Drives the full-screen interface: renders each frame, drains stream
//! fragments, and routes key presses. One exchange is in flight at a
//! time; Enter is ignored while a reply is still streaming.

use crate::commands::{process_input, CommandResult};
use crate::core::app::App;
use crate::core::chat_stream::{ChatStreamService, StreamMessage, StreamParams};
use crate::ui::renderer::ui;
use ratatui::crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{error::Error, io, time::Duration};
use tokio::sync::mpsc;

/// Transcript viewport height: the frame minus the input box (3 rows)
/// and the title row.
fn transcript_height(terminal_height: u16) -> u16 {
    terminal_height.saturating_sub(4)
}

pub async fn run_chat(
    model: Option<String>,
    api_key: Option<String>,
    log_file: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let mut app = App::new_with_auth(model, api_key, log_file)?;
    app.push_welcome_message();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (service, mut rx) = ChatStreamService::new();
    let result = run_event_loop(&mut terminal, &mut app, &service, &mut rx).await;

    // A stream that is still running dies with the session.
    app.cancel_active_stream();
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    service: &ChatStreamService,
    rx: &mut mpsc::UnboundedReceiver<(StreamMessage, u64)>,
) -> Result<(), Box<dyn Error>> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        let term_size = terminal.size().unwrap_or_default();
        let available_height = transcript_height(term_size.height);
        let width = term_size.width;

        apply_stream_messages(app, rx, available_height, width);

        if !event::poll(Duration::from_millis(50))? {
            continue;
        }

        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    return Ok(());
                }
                KeyCode::Enter => handle_submit(app, service, available_height, width),
                KeyCode::Char(c) => app.input.push(c),
                KeyCode::Backspace => {
                    app.input.pop();
                }
                KeyCode::Up => scroll_by(app, -1, available_height, width),
                KeyCode::Down => scroll_by(app, 1, available_height, width),
                KeyCode::PageUp => scroll_by(app, -(available_height as i32), available_height, width),
                KeyCode::PageDown => scroll_by(app, available_height as i32, available_height, width),
                _ => {}
            },
            Event::Resize(_, _) => {
                let height = transcript_height(terminal.size().unwrap_or_default().height);
                app.autoscroll_to_bottom(height, terminal.size().unwrap_or_default().width);
            }
            _ => {}
        }
    }
}

/// Drain everything the stream task has produced since the last frame.
/// Messages from a superseded stream are discarded by id.
fn apply_stream_messages(
    app: &mut App,
    rx: &mut mpsc::UnboundedReceiver<(StreamMessage, u64)>,
    available_height: u16,
    width: u16,
) {
    while let Ok((message, stream_id)) = rx.try_recv() {
        if stream_id != app.current_stream_id {
            continue;
        }
        match message {
            StreamMessage::Chunk(content) => {
                app.on_stream_chunk(&content, available_height, width);
            }
            StreamMessage::Error(error) => {
                app.on_stream_error(error);
                app.autoscroll_to_bottom(available_height, width);
            }
            StreamMessage::End => {
                app.on_stream_end();
                app.autoscroll_to_bottom(available_height, width);
            }
        }
    }
}

/// Enter was pressed: run a command locally, or start a new exchange.
fn handle_submit(app: &mut App, service: &ChatStreamService, available_height: u16, width: u16) {
    if app.is_streaming {
        return;
    }

    let input_text = app.input.trim().to_string();
    if input_text.is_empty() {
        return;
    }
    app.input.clear();

    let message = match process_input(app, &input_text) {
        CommandResult::Continue => {
            app.autoscroll_to_bottom(available_height, width);
            return;
        }
        CommandResult::ProcessAsMessage(text) => text,
    };

    let Some(contents) = app.submit(message) else {
        // Blocked before any network attempt (no API key).
        app.autoscroll_to_bottom(available_height, width);
        return;
    };

    let (cancel_token, stream_id) = app.start_new_stream();
    service.spawn_stream(StreamParams {
        client: app.client.clone(),
        base_url: app.base_url.clone(),
        api_key: app.api_key.clone(),
        model: app.model.to_string(),
        contents,
        cancel_token,
        stream_id,
    });
    app.auto_scroll = true;
    app.autoscroll_to_bottom(available_height, width);
}

fn scroll_by(app: &mut App, delta: i32, available_height: u16, width: u16) {
    let max_offset = app.max_scroll_offset(available_height, width);
    let current = app.scroll_offset as i32;
    let next = current.saturating_add(delta).clamp(0, max_offset as i32) as u16;
    app.scroll_offset = next;
    // Scrolling up detaches from the bottom; reaching it again re-attaches.
    app.auto_scroll = next >= max_offset;
}
