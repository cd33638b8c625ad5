//! Session state and exchange orchestration
//!
//! `App` owns the append-only transcript, the in-flight response buffer,
//! and the resolved configuration for one interactive session. Nothing
//! here persists across runs. The chat loop feeds it key events and
//! stream messages; this is the only place the transcript is mutated on
//! the response side.

use crate::api::Content;
use crate::auth::{AuthManager, KeySource};
use crate::core::config::{Config, ModelId};
use crate::core::faq;
use crate::core::message::Message;
use crate::core::prompt;
use crate::logging::TranscriptLog;
use crate::utils::scroll::ScrollCalculator;
use ratatui::text::Line;
use reqwest::Client;
use std::collections::VecDeque;
use tokio_util::sync::CancellationToken;
use tracing::warn;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const BASE_URL_ENV_VAR: &str = "GEMINI_BASE_URL";

pub const MISSING_KEY_MESSAGE: &str = "No API key configured. Run `uturu auth` to store one, \
pass --api-key, or set GEMINI_API_KEY.";
const RETRY_HINT: &str = "Please check your API key and try again.";

const SAMPLE_QUESTION_COUNT: usize = 5;

pub struct App {
    pub messages: VecDeque<Message>,
    pub input: String,
    pub current_response: String,
    pub client: Client,
    pub model: ModelId,
    pub api_key: String,
    pub base_url: String,
    pub scroll_offset: u16,
    pub auto_scroll: bool,
    pub is_streaming: bool,
    pub logging: TranscriptLog,
    pub stream_cancel_token: Option<CancellationToken>,
    pub current_stream_id: u64,
    faq_blob: String,
    // Index into `messages` where the live response buffer renders, so a
    // failed partial stays above the error report that follows it.
    stream_anchor: usize,
}

impl App {
    pub fn new_with_auth(
        model_flag: Option<String>,
        api_key_flag: Option<String>,
        log_file: Option<String>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let config = Config::load()?;
        let model = config.resolve_model(model_flag.as_deref())?;

        let auth_manager = AuthManager::new();
        let (api_key, key_source) = auth_manager.resolve_api_key(api_key_flag);

        let base_url = std::env::var(BASE_URL_ENV_VAR)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        // Printed before the alternate screen takes over.
        eprintln!("🎓 Starting Uturu - Gregory University FAQ Chat");
        eprintln!("🤖 Model: {model}");
        eprintln!("🌐 API endpoint: {base_url}");
        eprintln!("🔑 API key: {}", key_source.describe());
        if let Some(ref log_path) = log_file {
            eprintln!("📝 Logging to: {log_path}");
        }
        eprintln!("💡 Press Ctrl+C to quit, Enter to send messages");
        eprintln!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        let mut app = Self::assemble(model, api_key, base_url, TranscriptLog::new(log_file));
        if key_source == KeySource::Missing {
            app.push_message(Message::app_info(format!(
                "⚠ {MISSING_KEY_MESSAGE} Messages cannot be sent until a key is available."
            )));
        }
        Ok(app)
    }

    fn assemble(model: ModelId, api_key: String, base_url: String, logging: TranscriptLog) -> Self {
        App {
            messages: VecDeque::new(),
            input: String::new(),
            current_response: String::new(),
            client: Client::new(),
            model,
            api_key,
            base_url,
            scroll_offset: 0,
            auto_scroll: true,
            is_streaming: false,
            logging,
            stream_cancel_token: None,
            current_stream_id: 0,
            faq_blob: faq::faq_text(),
            stream_anchor: 0,
        }
    }

    /// Append a message, keeping the live-buffer anchor at the end of the
    /// transcript unless a partial response is still on display.
    fn push_message(&mut self, message: Message) {
        self.messages.push_back(message);
        if !self.is_streaming && self.current_response.is_empty() {
            self.stream_anchor = self.messages.len();
        }
    }

    /// Startup affordance: a handful of example questions the user can
    /// ask. Sampled fresh each run; shown locally, never sent upstream.
    pub fn push_welcome_message(&mut self) {
        let samples = match faq::sample_questions(SAMPLE_QUESTION_COUNT) {
            Ok(samples) => samples,
            Err(err) => {
                warn!("OS RNG unavailable ({err}); showing the first FAQ questions instead");
                faq::entries().iter().take(SAMPLE_QUESTION_COUNT).collect()
            }
        };

        let mut text = String::from(
            "Welcome! Ask anything covered by the official Gregory University FAQ. For example:\n",
        );
        for entry in samples {
            text.push_str(&format!("  • {}\n", entry.question));
        }
        text.push_str("Type /help for commands and keys.");
        self.push_message(Message::app_info(text));
    }

    /// Surface a local status note in the transcript.
    pub fn add_app_message(&mut self, content: impl Into<String>) {
        self.push_message(Message::app_info(content));
    }

    /// Begin an exchange: commit the user turn and assemble the request
    /// contents. Returns `None` (leaving the transcript untouched) when no
    /// API key is available.
    pub fn submit(&mut self, input: String) -> Option<Vec<Content>> {
        if self.api_key.trim().is_empty() {
            self.push_message(Message::app_error(MISSING_KEY_MESSAGE));
            return None;
        }

        self.current_response.clear();
        let user_message = Message::user(input);
        if let Err(e) = self.logging.append(&format!(
            "[{}] You: {}",
            user_message.timestamp, user_message.content
        )) {
            warn!("failed to write transcript log: {e}");
        }
        self.push_message(user_message);

        Some(prompt::build_contents(&self.faq_blob, &self.messages))
    }

    /// Rotate to a fresh stream id and cancellation token. Any previous
    /// stream keeps running until its task notices the cancelled token,
    /// but its messages no longer match `current_stream_id`.
    pub fn start_new_stream(&mut self) -> (CancellationToken, u64) {
        self.cancel_active_stream();
        self.current_stream_id += 1;
        let token = CancellationToken::new();
        self.stream_cancel_token = Some(token.clone());
        self.is_streaming = true;
        (token, self.current_stream_id)
    }

    pub fn cancel_active_stream(&mut self) {
        if let Some(token) = self.stream_cancel_token.take() {
            token.cancel();
        }
        self.is_streaming = false;
    }

    /// One fragment arrived: grow the buffer and keep the bottom visible.
    pub fn on_stream_chunk(&mut self, content: &str, available_height: u16, terminal_width: u16) {
        if !self.is_streaming {
            return;
        }
        self.current_response.push_str(content);
        self.autoscroll_to_bottom(available_height, terminal_width);
    }

    /// Terminal failure: report it, commit nothing. The partial buffer
    /// stays on display (above the error) until the next submission.
    pub fn on_stream_error(&mut self, error: String) {
        self.is_streaming = false;
        self.stream_cancel_token = None;
        self.push_message(Message::app_error(format!("{error}\n{RETRY_HINT}")));
    }

    /// Successful exhaustion: commit the buffer as the assistant turn.
    /// An `End` that follows an error is ignored.
    pub fn on_stream_end(&mut self) {
        if !self.is_streaming {
            return;
        }
        self.is_streaming = false;
        self.stream_cancel_token = None;

        let content = std::mem::take(&mut self.current_response);
        let assistant_message = Message::assistant(content);
        if let Err(e) = self.logging.append(&format!(
            "[{}] {}",
            assistant_message.timestamp, assistant_message.content
        )) {
            warn!("failed to write transcript log: {e}");
        }
        self.push_message(assistant_message);
    }

    /// All display lines: committed turns with the live response buffer
    /// spliced in at its anchor position.
    pub fn display_lines(&self) -> Vec<Line<'static>> {
        let anchor = self.stream_anchor.min(self.messages.len());
        let mut lines = Vec::new();
        for msg in self.messages.iter().take(anchor) {
            lines.extend(ScrollCalculator::message_lines(msg));
        }
        lines.extend(ScrollCalculator::live_response_lines(
            &self.current_response,
            self.is_streaming,
        ));
        for msg in self.messages.iter().skip(anchor) {
            lines.extend(ScrollCalculator::message_lines(msg));
        }
        lines
    }

    pub fn wrapped_line_count(&self, terminal_width: u16) -> u16 {
        ScrollCalculator::calculate_wrapped_line_count(&self.display_lines(), terminal_width)
    }

    pub fn max_scroll_offset(&self, available_height: u16, terminal_width: u16) -> u16 {
        ScrollCalculator::scroll_to_bottom(&self.display_lines(), terminal_width, available_height)
    }

    pub fn autoscroll_to_bottom(&mut self, available_height: u16, terminal_width: u16) {
        if self.auto_scroll {
            self.scroll_offset = self.max_scroll_offset(available_height, terminal_width);
        }
    }
}

#[cfg(test)]
impl App {
    /// Construct an App without touching config files, the keyring, or
    /// the environment.
    pub fn new_for_tests(api_key: &str) -> Self {
        Self::assemble(
            ModelId::Flash,
            api_key.to_string(),
            DEFAULT_BASE_URL.to_string(),
            TranscriptLog::new(None),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::TranscriptRole;

    fn test_app(api_key: &str) -> App {
        App::new_for_tests(api_key)
    }

    fn chat_roles(app: &App) -> Vec<TranscriptRole> {
        app.messages
            .iter()
            .filter(|m| !m.is_app())
            .map(|m| m.role)
            .collect()
    }

    fn run_successful_exchange(app: &mut App, question: &str, fragments: &[&str]) {
        let contents = app.submit(question.to_string()).expect("key present");
        assert_eq!(contents.last().unwrap().text(), question);
        let _ = app.start_new_stream();
        for fragment in fragments {
            app.on_stream_chunk(fragment, 20, 80);
        }
        app.on_stream_end();
    }

    #[test]
    fn submit_with_empty_key_blocks_and_keeps_history_intact() {
        let mut app = test_app("");
        app.push_welcome_message();
        let before = app.messages.len();

        assert!(app.submit("hello?".to_string()).is_none());

        // One error surfaced, zero chat turns appended.
        assert_eq!(app.messages.len(), before + 1);
        assert_eq!(app.messages.back().unwrap().role, TranscriptRole::AppError);
        assert!(chat_roles(&app).is_empty());
        assert!(!app.is_streaming);
    }

    #[test]
    fn submit_assembles_instruction_plus_history() {
        let mut app = test_app("test-key");
        let contents = app.submit("What is the grading system?".to_string()).unwrap();

        assert_eq!(contents.len(), 2);
        assert_eq!(contents[0].role, "user");
        assert!(contents[0].text().starts_with(prompt::SYSTEM_INSTRUCTION));
        assert!(contents[0].text().contains("Q11: What is the grading system?"));
        assert_eq!(contents[1].role, "user");
        assert_eq!(chat_roles(&app), vec![TranscriptRole::User]);
    }

    #[test]
    fn successful_stream_commits_the_concatenated_fragments() {
        let mut app = test_app("test-key");
        run_successful_exchange(
            &mut app,
            "What is the motto of Gregory University?",
            &["Knowledge", " for ", "Tomorrow"],
        );

        let roles = chat_roles(&app);
        assert_eq!(roles, vec![TranscriptRole::User, TranscriptRole::Assistant]);
        let reply = app.messages.iter().find(|m| m.is_assistant()).unwrap();
        assert_eq!(reply.content, "Knowledge for Tomorrow");
        assert!(app.current_response.is_empty());
        assert!(!app.is_streaming);
    }

    #[test]
    fn n_successful_exchanges_alternate_user_assistant() {
        let mut app = test_app("test-key");
        app.push_welcome_message();
        for i in 0..3 {
            run_successful_exchange(&mut app, &format!("question {i}"), &["answer"]);
        }

        let roles = chat_roles(&app);
        assert_eq!(roles.len(), 6);
        for (i, role) in roles.iter().enumerate() {
            let expected = if i % 2 == 0 {
                TranscriptRole::User
            } else {
                TranscriptRole::Assistant
            };
            assert_eq!(*role, expected, "turn {i}");
        }
    }

    #[test]
    fn failed_stream_commits_no_assistant_turn() {
        let mut app = test_app("test-key");
        let _ = app.submit("question".to_string()).unwrap();
        let _ = app.start_new_stream();
        app.on_stream_chunk("partial ", 20, 80);
        app.on_stream_chunk("reply", 20, 80);
        app.on_stream_error("API error: Resource has been exhausted".to_string());
        // The End that trails an Error must not commit anything.
        app.on_stream_end();

        assert_eq!(chat_roles(&app), vec![TranscriptRole::User]);
        let error = app.messages.back().unwrap();
        assert_eq!(error.role, TranscriptRole::AppError);
        assert!(error.content.contains("check your API key"));

        // The partial stays visible, rendered above the error report.
        assert_eq!(app.current_response, "partial reply");
        let rendered: Vec<String> = app.display_lines().iter().map(|l| l.to_string()).collect();
        let partial_at = rendered.iter().position(|l| l == "partial reply").unwrap();
        let error_at = rendered
            .iter()
            .position(|l| l.starts_with("API error"))
            .unwrap();
        assert!(partial_at < error_at);
    }

    #[test]
    fn next_submission_clears_a_failed_partial() {
        let mut app = test_app("test-key");
        let _ = app.submit("first".to_string()).unwrap();
        let _ = app.start_new_stream();
        app.on_stream_chunk("doomed", 20, 80);
        app.on_stream_error("API error: boom".to_string());

        let _ = app.submit("second".to_string()).unwrap();
        assert!(app.current_response.is_empty());
        let rendered: Vec<String> = app.display_lines().iter().map(|l| l.to_string()).collect();
        assert!(!rendered.iter().any(|l| l == "doomed"));
    }

    #[test]
    fn empty_completion_still_commits_a_turn() {
        let mut app = test_app("test-key");
        run_successful_exchange(&mut app, "question", &[]);
        let roles = chat_roles(&app);
        assert_eq!(roles, vec![TranscriptRole::User, TranscriptRole::Assistant]);
        assert_eq!(app.messages.iter().find(|m| m.is_assistant()).unwrap().content, "");
    }

    #[test]
    fn stream_ids_rotate_and_old_tokens_cancel() {
        let mut app = test_app("test-key");
        let (token1, id1) = app.start_new_stream();
        let (token2, id2) = app.start_new_stream();
        assert!(id2 > id1);
        assert!(token1.is_cancelled());
        assert!(!token2.is_cancelled());
        assert!(app.is_streaming);

        app.cancel_active_stream();
        assert!(token2.is_cancelled());
        assert!(!app.is_streaming);
    }

    #[test]
    fn welcome_message_lists_five_sample_questions() {
        let mut app = test_app("test-key");
        app.push_welcome_message();
        let welcome = app.messages.front().unwrap();
        assert_eq!(welcome.role, TranscriptRole::AppInfo);
        assert_eq!(welcome.content.matches("  • ").count(), 5);
    }

    #[test]
    fn chunks_outside_a_stream_are_dropped() {
        let mut app = test_app("test-key");
        app.on_stream_chunk("stray", 20, 80);
        assert!(app.current_response.is_empty());
        app.on_stream_end();
        assert!(app.messages.is_empty());
    }
}
