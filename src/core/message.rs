use chrono::Local;
use serde::{Deserialize, Serialize};

/// Roles a transcript entry can carry.
///
/// Only `User` and `Assistant` are ever transmitted to the remote API;
/// the `App*` roles are rendered locally (status notes, error reports)
/// and skipped during prompt assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptRole {
    User,
    Assistant,
    AppInfo,
    AppError,
}

impl TranscriptRole {
    pub fn as_str(self) -> &'static str {
        match self {
            TranscriptRole::User => "user",
            TranscriptRole::Assistant => "assistant",
            TranscriptRole::AppInfo => "app/info",
            TranscriptRole::AppError => "app/error",
        }
    }

    /// Wire role for the generation API. The Gemini contents array tags
    /// assistant turns as "model", and has no app-side roles at all.
    pub fn to_api_role(self) -> Option<&'static str> {
        match self {
            TranscriptRole::User => Some("user"),
            TranscriptRole::Assistant => Some("model"),
            TranscriptRole::AppInfo | TranscriptRole::AppError => None,
        }
    }

    pub fn is_user(self) -> bool {
        self == TranscriptRole::User
    }

    pub fn is_assistant(self) -> bool {
        self == TranscriptRole::Assistant
    }

    pub fn is_app(self) -> bool {
        matches!(self, TranscriptRole::AppInfo | TranscriptRole::AppError)
    }
}

/// One transcript entry. The timestamp is captured when the entry is
/// created and never changes afterwards; the transcript itself is
/// append-only for the lifetime of the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: TranscriptRole,
    pub content: String,
    pub timestamp: String,
}

/// Wall-clock timestamp in the format shown next to each committed turn.
pub fn now_timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

impl Message {
    pub fn new(role: TranscriptRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: now_timestamp(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(TranscriptRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(TranscriptRole::Assistant, content)
    }

    pub fn app_info(content: impl Into<String>) -> Self {
        Self::new(TranscriptRole::AppInfo, content)
    }

    pub fn app_error(content: impl Into<String>) -> Self {
        Self::new(TranscriptRole::AppError, content)
    }

    pub fn is_user(&self) -> bool {
        self.role.is_user()
    }

    pub fn is_assistant(&self) -> bool {
        self.role.is_assistant()
    }

    pub fn is_app(&self) -> bool {
        self.role.is_app()
    }
}
