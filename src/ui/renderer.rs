//! Frame rendering: the scrolling transcript above a fixed input box.

use crate::core::app::App;
use crate::utils::scroll::ScrollCalculator;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

pub fn ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(f.area());

    let lines = app.display_lines();

    // Account for the title row, then clamp the offset against the
    // wrapped line count so resizes never scroll past the end.
    let available_height = chunks[0].height.saturating_sub(1);
    let total_wrapped_lines = ScrollCalculator::calculate_wrapped_line_count(&lines, chunks[0].width);
    let max_offset = total_wrapped_lines.saturating_sub(available_height);
    let scroll_offset = app.scroll_offset.min(max_offset);

    let title = format!(
        "Uturu v{} - Gregory University FAQ • {} • Logging: {}",
        env!("CARGO_PKG_VERSION"),
        app.model,
        app.logging.status()
    );

    let transcript = Paragraph::new(lines)
        .block(Block::default().title(title))
        .wrap(Wrap { trim: true })
        .scroll((scroll_offset, 0));
    f.render_widget(transcript, chunks[0]);

    let input_title = if app.is_streaming {
        "Reply streaming… (Ctrl+C to quit)"
    } else {
        "Type your question (Enter to send, /help for help, Ctrl+C to quit)"
    };

    let input_style = if app.is_streaming {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::Cyan)
    };

    let input = Paragraph::new(app.input.as_str())
        .style(input_style)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Reset))
                .title(input_title),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(input, chunks[1]);

    if !app.is_streaming {
        let max_cursor_x = chunks[1].width.saturating_sub(2);
        let cursor_x = (app.input.chars().count() as u16 + 1).min(max_cursor_x);
        f.set_cursor_position((chunks[1].x + cursor_x, chunks[1].y + 1));
    }
}
