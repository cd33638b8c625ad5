//! Request and response payloads for the Gemini generation API.

use serde::{Deserialize, Serialize};

/// One piece of a content entry. The FAQ chat only ever sends and
/// receives plain text parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

/// One role-tagged entry in the `contents` array. Roles on the wire are
/// "user" and "model".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn new(role: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            parts: vec![Part { text: text.into() }],
        }
    }

    /// Concatenated text of all parts.
    pub fn text(&self) -> String {
        self.parts.iter().map(|p| p.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThinkingConfig {
    pub thinking_budget: i32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub thinking_config: ThinkingConfig,
}

impl Default for GenerationConfig {
    /// Fixed sampling settings: temperature 1.0, extended reasoning off.
    fn default() -> Self {
        Self {
            temperature: 1.0,
            thinking_config: ThinkingConfig { thinking_budget: 0 },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

/// One incremental response chunk from `streamGenerateContent`.
///
/// Errors reported mid-stream arrive as a payload with an `error` object
/// instead of candidates, so both shapes are accepted here and the caller
/// decides which path it is on.
#[derive(Debug, Deserialize)]
pub struct StreamChunk {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<ChunkContent>,
}

#[derive(Debug, Deserialize)]
pub struct ChunkContent {
    #[serde(default)]
    pub parts: Vec<ChunkPart>,
}

#[derive(Debug, Deserialize)]
pub struct ChunkPart {
    pub text: Option<String>,
}

impl StreamChunk {
    /// Text fragment carried by this chunk, if any. Parts without text
    /// (for example a bare finish marker) yield `None`.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let mut text = String::new();
        for part in &content.parts {
            if let Some(piece) = &part.text {
                text.push_str(piece);
            }
        }
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}
