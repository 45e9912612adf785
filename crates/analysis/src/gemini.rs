use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use billcheck_core::{ConfigError, InferenceSettings};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::inference::{
    GenerateRequest, InferenceClient, InferenceError, InferenceFuture, Segment,
};

/// `generateContent` client for the Gemini API. Built once by the caller and
/// shared by every invoker.
#[derive(Debug, Clone)]
pub struct Gemini {
    http: reqwest::Client,
    key: String,
    model: String,
    base_url: String,
}

impl Gemini {
    pub fn from_settings(settings: &InferenceSettings) -> Result<Self, ConfigError> {
        let key = settings.require_api_key()?.to_string();
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs.max(1)))
            .build()
            .map_err(|e| ConfigError::Invalid {
                field: "inference",
                reason: format!("could not build HTTP client: {e}"),
            })?;
        Ok(Self {
            http,
            key,
            model: settings.model.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", self.base_url, self.model)
    }
}

impl InferenceClient for Gemini {
    fn generate(&self, request: GenerateRequest) -> InferenceFuture<'_> {
        Box::pin(async move {
            let body = request_body(&request);
            debug!(
                model = %self.model,
                segments = request.segments.len(),
                images = request.inline_count(),
                "calling generateContent"
            );

            let response = self
                .http
                .post(self.endpoint())
                .header("x-goog-api-key", &self.key)
                .json(&body)
                .send()
                .await
                .map_err(classify_transport)?;

            let status = response.status();
            let text = response.text().await.map_err(classify_transport)?;
            if !status.is_success() {
                return Err(classify_status(status, &text));
            }
            extract_text(&text)
        })
    }
}

pub(crate) fn request_body(request: &GenerateRequest) -> Value {
    let parts = request
        .segments
        .iter()
        .map(|segment| match segment {
            Segment::Text(text) => json!({ "text": text }),
            Segment::InlineData { mime_type, data } => json!({
                "inline_data": {
                    "mime_type": mime_type,
                    "data": BASE64.encode(data),
                }
            }),
        })
        .collect::<Vec<_>>();

    let mut body = json!({
        "contents": [{ "role": "user", "parts": parts }],
    });
    if let Some(schema) = &request.response_schema {
        body["generationConfig"] = json!({
            "responseMimeType": "application/json",
            "responseSchema": schema,
        });
    }
    body
}

fn classify_transport(err: reqwest::Error) -> InferenceError {
    if err.is_connect() || err.is_timeout() || err.is_request() {
        InferenceError::Network(err.to_string())
    } else if let Some(status) = err.status() {
        InferenceError::Service { status: status.as_u16(), message: err.to_string() }
    } else {
        InferenceError::Protocol(err.to_string())
    }
}

/// 429 and 5xx are the engine's problem; other failures are ours.
pub(crate) fn classify_status(status: StatusCode, body: &str) -> InferenceError {
    let message = extract_error_message(body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string()
    });
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        InferenceError::Service { status: status.as_u16(), message }
    } else {
        InferenceError::Rejected { status: status.as_u16(), message }
    }
}

/// Pulls the candidate text out of a successful reply envelope.
pub(crate) fn extract_text(body: &str) -> Result<String, InferenceError> {
    let payload: GeminiResponse = serde_json::from_str(body)
        .map_err(|e| InferenceError::Protocol(format!("reply envelope: {e}")))?;
    let text = payload
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<String>()
        })
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(InferenceError::EmptyResponse);
    }
    Ok(text)
}

fn extract_error_message(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<GeminiError>,
    }

    #[derive(Deserialize)]
    struct GeminiError {
        message: Option<String>,
        status: Option<String>,
    }

    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    let error = parsed.error?;
    match (error.message, error.status) {
        (Some(m), Some(s)) if !m.trim().is_empty() => Some(format!("{m} ({s})")),
        (Some(m), _) if !m.trim().is_empty() => Some(m),
        (_, Some(s)) => Some(s),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    text: Option<String>,
}
