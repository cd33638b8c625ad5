//! Transcript line building and scroll math
//!
//! The transcript is rendered as one flat list of styled lines; scroll
//! offsets are computed against the wrapped line count so auto-scroll
//! tracks the bottom even when long replies wrap.

use crate::core::message::{Message, TranscriptRole};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use std::collections::VecDeque;

/// Glyph appended to the in-flight reply while fragments are arriving.
pub const STREAMING_CURSOR: &str = "▌";

pub struct ScrollCalculator;

impl ScrollCalculator {
    /// Build display lines for all committed messages.
    pub fn transcript_lines(messages: &VecDeque<Message>) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        for msg in messages {
            Self::add_message_lines(&mut lines, msg);
        }
        lines
    }

    /// Display lines for a single committed message.
    pub fn message_lines(msg: &Message) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        Self::add_message_lines(&mut lines, msg);
        lines
    }

    fn add_message_lines(lines: &mut Vec<Line<'static>>, msg: &Message) {
        match msg.role {
            TranscriptRole::User => {
                lines.push(Line::from(vec![
                    Span::styled(
                        "You: ",
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(msg.content.clone(), Style::default().fg(Color::Cyan)),
                ]));
                Self::add_timestamp_caption(lines, &msg.timestamp);
            }
            TranscriptRole::Assistant => {
                for content_line in msg.content.lines() {
                    lines.push(Line::from(Span::styled(
                        content_line.to_string(),
                        Style::default().fg(Color::White),
                    )));
                }
                if msg.content.is_empty() {
                    lines.push(Line::from(""));
                }
                Self::add_timestamp_caption(lines, &msg.timestamp);
            }
            TranscriptRole::AppInfo => {
                for content_line in msg.content.lines() {
                    lines.push(Line::from(Span::styled(
                        content_line.to_string(),
                        Style::default().fg(Color::DarkGray),
                    )));
                }
                lines.push(Line::from(""));
            }
            TranscriptRole::AppError => {
                for content_line in msg.content.lines() {
                    lines.push(Line::from(Span::styled(
                        content_line.to_string(),
                        Style::default().fg(Color::Red),
                    )));
                }
                lines.push(Line::from(""));
            }
        }
    }

    fn add_timestamp_caption(lines: &mut Vec<Line<'static>>, timestamp: &str) {
        lines.push(Line::from(Span::styled(
            timestamp.to_string(),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )));
        lines.push(Line::from(""));
    }

    /// Build display lines for the in-flight reply buffer. While the
    /// stream is live the last line carries a trailing cursor glyph.
    pub fn live_response_lines(buffer: &str, streaming: bool) -> Vec<Line<'static>> {
        if buffer.is_empty() && !streaming {
            return Vec::new();
        }

        let mut content_lines: Vec<String> = buffer.lines().map(str::to_string).collect();
        if content_lines.is_empty() {
            content_lines.push(String::new());
        } else if buffer.ends_with('\n') {
            content_lines.push(String::new());
        }

        let last = content_lines.len() - 1;
        let mut lines = Vec::new();
        for (i, content_line) in content_lines.into_iter().enumerate() {
            if streaming && i == last {
                lines.push(Line::from(vec![
                    Span::styled(content_line, Style::default().fg(Color::White)),
                    Span::styled(STREAMING_CURSOR.to_string(), Style::default().fg(Color::White)),
                ]));
            } else {
                lines.push(Line::from(Span::styled(
                    content_line,
                    Style::default().fg(Color::White),
                )));
            }
        }
        lines.push(Line::from(""));
        lines
    }

    /// Count the wrapped lines the given lines occupy at the given width,
    /// matching ratatui's word-based `Wrap { trim: true }` behavior.
    pub fn calculate_wrapped_line_count(lines: &[Line], terminal_width: u16) -> u16 {
        let mut total = 0u16;
        for line in lines {
            let text = line.to_string();
            let trimmed = text.trim();
            if trimmed.is_empty() || terminal_width == 0 {
                total = total.saturating_add(1);
            } else {
                total = total.saturating_add(Self::word_wrapped_lines(trimmed, terminal_width));
            }
        }
        total
    }

    fn word_wrapped_lines(text: &str, terminal_width: u16) -> u16 {
        let width = terminal_width as usize;
        let mut current = 0usize;
        let mut count = 1u16;
        for word in text.split_whitespace() {
            let word_len = word.chars().count();
            if current > 0 && current + 1 + word_len > width {
                count = count.saturating_add(1);
                current = word_len;
            } else {
                if current > 0 {
                    current += 1;
                }
                current += word_len;
            }
        }
        count
    }

    /// Offset that puts the bottom of the given lines at the bottom of
    /// the viewport, or zero when everything fits.
    pub fn scroll_to_bottom(lines: &[Line], terminal_width: u16, available_height: u16) -> u16 {
        let total = Self::calculate_wrapped_line_count(lines, terminal_width);
        total.saturating_sub(available_height)
    }
}
