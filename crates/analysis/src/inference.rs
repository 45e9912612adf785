use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use serde_json::Value;
use thiserror::Error;

/// One piece of a request: instruction/context text or inline binary data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    InlineData { mime_type: String, data: Vec<u8> },
}

impl Segment {
    pub fn text(text: impl Into<String>) -> Self {
        Segment::Text(text.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Segment::Text(t) => Some(t),
            Segment::InlineData { .. } => None,
        }
    }
}

/// A single `generate` call. When `response_schema` is set the engine is asked
/// for `application/json` output matching it.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub segments: Vec<Segment>,
    pub response_schema: Option<Value>,
}

impl GenerateRequest {
    pub fn structured(segments: Vec<Segment>, schema: Value) -> Self {
        Self { segments, response_schema: Some(schema) }
    }

    pub fn plain(segments: Vec<Segment>) -> Self {
        Self { segments, response_schema: None }
    }

    /// Concatenation of every text segment, for inspection and logging.
    pub fn text(&self) -> String {
        self.segments
            .iter()
            .filter_map(Segment::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn inline_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::InlineData { .. }))
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InferenceError {
    /// The engine could not be reached (DNS, connect, timeout, reset).
    #[error("network error: {0}")]
    Network(String),
    /// The engine answered with a failure or overload status.
    #[error("service error ({status}): {message}")]
    Service { status: u16, message: String },
    /// The engine refused the request itself (bad key, bad payload).
    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
    /// The reply envelope could not be understood.
    #[error("unexpected reply from engine: {0}")]
    Protocol(String),
    /// The reply carried no text candidate (blocked or empty).
    #[error("engine returned no text")]
    EmptyResponse,
}

pub type InferenceFuture<'a> =
    Pin<Box<dyn Future<Output = Result<String, InferenceError>> + Send + 'a>>;

/// The external reasoning engine. One call is one network round trip; no
/// implementation retries.
pub trait InferenceClient: Send + Sync {
    fn generate(&self, request: GenerateRequest) -> InferenceFuture<'_>;
}

// ── Mock client (always available, used for tests) ──────────────────────────

/// Answers each call with the next queued reply and records every request it
/// was given.
#[derive(Debug, Default)]
pub struct MockInference {
    replies: Mutex<VecDeque<Result<String, InferenceError>>>,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl MockInference {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replying(text: impl Into<String>) -> Self {
        let mock = Self::default();
        mock.push_reply(Ok(text.into()));
        mock
    }

    pub fn failing(error: InferenceError) -> Self {
        let mock = Self::default();
        mock.push_reply(Err(error));
        mock
    }

    pub fn push_reply(&self, reply: Result<String, InferenceError>) {
        if let Ok(mut q) = self.replies.lock() {
            q.push_back(reply);
        }
    }

    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }
}

impl InferenceClient for MockInference {
    fn generate(&self, request: GenerateRequest) -> InferenceFuture<'_> {
        Box::pin(async move {
            if let Ok(mut log) = self.requests.lock() {
                log.push(request);
            }
            self.replies
                .lock()
                .ok()
                .and_then(|mut q| q.pop_front())
                .unwrap_or(Err(InferenceError::EmptyResponse))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_replays_and_records() {
        let mock = MockInference::replying("{\"ok\":true}");
        let req = GenerateRequest::plain(vec![Segment::text("hello")]);
        assert_eq!(mock.generate(req.clone()).await.unwrap(), "{\"ok\":true}");
        assert_eq!(mock.requests(), vec![req]);
        // Queue exhausted.
        assert_eq!(
            mock.generate(GenerateRequest::plain(vec![])).await,
            Err(InferenceError::EmptyResponse)
        );
        assert_eq!(mock.call_count(), 2);
    }

    #[test]
    fn request_text_skips_inline_data() {
        let req = GenerateRequest::plain(vec![
            Segment::text("a"),
            Segment::InlineData { mime_type: "image/jpeg".into(), data: vec![1, 2] },
            Segment::text("b"),
        ]);
        assert_eq!(req.text(), "a\nb");
        assert_eq!(req.inline_count(), 1);
    }
}
