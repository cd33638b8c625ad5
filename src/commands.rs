//! Slash commands typed into the input line.

use crate::core::app::App;

pub enum CommandResult {
    Continue,
    ProcessAsMessage(String),
}

const HELP_TEXT: &str = "Commands:
  /help             Show this help
  /log <filename>   Enable transcript logging to a file
  /log              Pause or resume transcript logging

Keys:
  Enter             Send the message
  Up/Down           Scroll the transcript
  PageUp/PageDown   Scroll a page at a time
  Ctrl+C            Quit";

pub fn process_input(app: &mut App, input: &str) -> CommandResult {
    let trimmed = input.trim();

    if trimmed == "/help" {
        app.add_app_message(HELP_TEXT);
        return CommandResult::Continue;
    }

    if trimmed == "/log" || trimmed.starts_with("/log ") {
        let parts: Vec<&str> = trimmed.split_whitespace().collect();
        let result = match parts.as_slice() {
            ["/log"] => app.logging.toggle(),
            ["/log", filename] => app.logging.enable(filename.to_string()),
            _ => Err("Usage: /log [filename] - enable logging to a file, or toggle pause/resume"
                .into()),
        };
        match result {
            Ok(message) => app.add_app_message(message),
            Err(e) => app.add_app_message(format!("Error: {e}")),
        }
        return CommandResult::Continue;
    }

    CommandResult::ProcessAsMessage(input.to_string())
}
