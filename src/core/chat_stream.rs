//! Streaming client for the Gemini generation API
//!
//! One spawned task per exchange POSTs the assembled contents and forwards
//! SSE fragments over an unbounded channel. Messages are tagged with a
//! stream id so the consumer can discard anything from a superseded
//! exchange. Failures collapse into a single `Error` followed by `End`;
//! fragments already delivered are never retracted.

use futures_util::StreamExt;
use memchr::memchr;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::api::{Content, GenerateRequest, GenerationConfig, StreamChunk};
use crate::utils::url::stream_generate_url;

#[derive(Clone, Debug)]
pub enum StreamMessage {
    Chunk(String),
    Error(String),
    End,
}

fn extract_data_payload(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim_start)
}

/// Handle one SSE data payload. Returns true when the stream is finished
/// and the reader task should stop.
fn handle_data_payload(
    payload: &str,
    tx: &mpsc::UnboundedSender<(StreamMessage, u64)>,
    stream_id: u64,
) -> bool {
    if payload.trim().is_empty() {
        return false;
    }

    match serde_json::from_str::<StreamChunk>(payload) {
        Ok(chunk) => {
            if chunk.error.is_some() {
                let _ = tx.send((StreamMessage::Error(format_api_error(payload)), stream_id));
                let _ = tx.send((StreamMessage::End, stream_id));
                return true;
            }
            if let Some(text) = chunk.text() {
                let _ = tx.send((StreamMessage::Chunk(text), stream_id));
            }
            false
        }
        Err(e) => {
            debug!("unparseable stream payload ({e}): {payload}");
            let _ = tx.send((StreamMessage::Error(format_api_error(payload)), stream_id));
            let _ = tx.send((StreamMessage::End, stream_id));
            true
        }
    }
}

fn process_sse_line(
    line: &str,
    tx: &mpsc::UnboundedSender<(StreamMessage, u64)>,
    stream_id: u64,
) -> bool {
    extract_data_payload(line)
        .map(|payload| handle_data_payload(payload, tx, stream_id))
        .unwrap_or(false)
}

/// Condense an error body into a single user-facing line. Gemini errors
/// carry `{"error": {"message": ..., "status": ...}}`; anything else is
/// passed through with collapsed whitespace.
fn format_api_error(error_text: &str) -> String {
    let trimmed = error_text.trim();
    if trimmed.is_empty() {
        return "API error: <empty response body>".to_string();
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        let summary = value
            .pointer("/error/message")
            .and_then(|v| v.as_str())
            .or_else(|| value.pointer("/error/status").and_then(|v| v.as_str()))
            .or_else(|| value.get("message").and_then(|v| v.as_str()));
        if let Some(summary) = summary {
            let collapsed = summary.split_whitespace().collect::<Vec<_>>().join(" ");
            if !collapsed.is_empty() {
                return format!("API error: {collapsed}");
            }
        }
    }

    let collapsed = trimmed.split_whitespace().collect::<Vec<_>>().join(" ");
    format!("API error: {collapsed}")
}

pub struct StreamParams {
    pub client: reqwest::Client,
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub contents: Vec<Content>,
    pub cancel_token: tokio_util::sync::CancellationToken,
    pub stream_id: u64,
}

/// Spawns generation requests and owns the sending half of the fragment
/// channel. The receiving half is drained by the chat loop.
#[derive(Clone)]
pub struct ChatStreamService {
    tx: mpsc::UnboundedSender<(StreamMessage, u64)>,
}

impl ChatStreamService {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(StreamMessage, u64)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn spawn_stream(&self, params: StreamParams) {
        let tx_clone = self.tx.clone();
        tokio::spawn(async move {
            let StreamParams {
                client,
                base_url,
                api_key,
                model,
                contents,
                cancel_token,
                stream_id,
            } = params;

            let request = GenerateRequest {
                contents,
                generation_config: GenerationConfig::default(),
            };

            tokio::select! {
                _ = async {
                    let url = stream_generate_url(&base_url, &model);
                    debug!(%model, stream_id, "starting generation request");

                    match client
                        .post(url)
                        .header("Content-Type", "application/json")
                        .header("x-goog-api-key", api_key.as_str())
                        .json(&request)
                        .send()
                        .await
                    {
                        Ok(response) => {
                            if !response.status().is_success() {
                                let status = response.status();
                                let error_text = response
                                    .text()
                                    .await
                                    .unwrap_or_else(|_| "<no body>".to_string());
                                warn!(%status, stream_id, "generation request rejected");
                                let _ = tx_clone.send((
                                    StreamMessage::Error(format_api_error(&error_text)),
                                    stream_id,
                                ));
                                let _ = tx_clone.send((StreamMessage::End, stream_id));
                                return;
                            }

                            let mut stream = response.bytes_stream();
                            let mut buffer: Vec<u8> = Vec::new();

                            while let Some(chunk) = stream.next().await {
                                if cancel_token.is_cancelled() {
                                    return;
                                }

                                match chunk {
                                    Ok(chunk_bytes) => {
                                        buffer.extend_from_slice(&chunk_bytes);

                                        while let Some(newline_pos) = memchr(b'\n', &buffer) {
                                            let line_str =
                                                match std::str::from_utf8(&buffer[..newline_pos]) {
                                                    Ok(s) => s.trim().to_string(),
                                                    Err(e) => {
                                                        warn!("invalid UTF-8 in stream: {e}");
                                                        buffer.drain(..=newline_pos);
                                                        continue;
                                                    }
                                                };

                                            buffer.drain(..=newline_pos);
                                            if process_sse_line(&line_str, &tx_clone, stream_id) {
                                                return;
                                            }
                                        }
                                    }
                                    Err(e) => {
                                        let _ = tx_clone.send((
                                            StreamMessage::Error(format_api_error(&e.to_string())),
                                            stream_id,
                                        ));
                                        let _ = tx_clone.send((StreamMessage::End, stream_id));
                                        return;
                                    }
                                }
                            }

                            // Gemini SSE has no [DONE] sentinel; a closed
                            // connection is the normal end of the reply.
                            let _ = tx_clone.send((StreamMessage::End, stream_id));
                        }
                        Err(e) => {
                            let _ = tx_clone.send((
                                StreamMessage::Error(format_api_error(&e.to_string())),
                                stream_id,
                            ));
                            let _ = tx_clone.send((StreamMessage::End, stream_id));
                        }
                    }
                } => {}
                _ = cancel_token.cancelled() => {}
            }
        });
    }

    #[cfg(test)]
    pub fn send_for_test(&self, message: StreamMessage, stream_id: u64) {
        let _ = self.tx.send((message, stream_id));
    }
}
