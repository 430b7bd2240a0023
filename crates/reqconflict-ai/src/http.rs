//! HTTP completion backend for a hosted text-generation endpoint.
//!
//! Request: `POST <url>` with a bearer token and
//! `{"inputs": <prompt>, "parameters": {...}}`.
//! Success payload: `[{"generated_text": "..."}]` (a bare object is also accepted).
//! Error payload: `{"error": "..."}`, optionally with `estimated_time`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::inference::{CompletionBackend, InferenceError};

/// Bound on a single request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Endpoint used when none is configured.
pub const DEFAULT_API_URL: &str = "https://api-inference.huggingface.co/models/google/flan-t5-large";

#[derive(Serialize)]
struct GenerateRequest<'a> {
    inputs: &'a str,
    parameters: GenerateParameters,
}

#[derive(Serialize)]
struct GenerateParameters {
    max_new_tokens: u32,
    temperature: f32,
    return_full_text: bool,
}

#[derive(Deserialize)]
struct Generation {
    generated_text: String,
}

#[derive(Deserialize)]
struct ErrorPayload {
    error: ErrorDetail,
    #[serde(default)]
    estimated_time: Option<f64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Message(String),
    Structured(serde_json::Value),
}

/// Text-generation endpoint client.
pub struct HttpBackend {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl HttpBackend {
    /// `url` is the full model endpoint. `token` is sent as a bearer token when present.
    pub fn new(url: String, token: Option<String>, timeout: Duration) -> Result<Self, InferenceError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        info!(url = %url, timeout_secs = timeout.as_secs(), "inference backend configured");
        Ok(Self {
            client,
            url: url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl CompletionBackend for HttpBackend {
    async fn generate(&self, prompt: &str) -> Result<String, InferenceError> {
        let body = GenerateRequest {
            inputs: prompt,
            parameters: GenerateParameters {
                max_new_tokens: 128,
                temperature: 0.0,
                return_full_text: false,
            },
        };

        let mut request = self.client.post(&self.url).json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let resp = request.send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        debug!(status = status.as_u16(), bytes = text.len(), "inference response");

        if !status.is_success() {
            if let Some(detail) = error_detail(&text) {
                return Err(InferenceError::Service(detail));
            }
            return Err(InferenceError::Server {
                status: status.as_u16(),
                body: text,
            });
        }

        decode_completion(&text)
    }
}

/// Extract the completion from a success payload.
fn decode_completion(body: &str) -> Result<String, InferenceError> {
    if let Ok(mut generations) = serde_json::from_str::<Vec<Generation>>(body) {
        if generations.is_empty() {
            return Err(InferenceError::UnexpectedFormat("empty generation list".into()));
        }
        return Ok(generations.swap_remove(0).generated_text);
    }
    if let Ok(generation) = serde_json::from_str::<Generation>(body) {
        return Ok(generation.generated_text);
    }
    if let Some(detail) = error_detail(body) {
        return Err(InferenceError::Service(detail));
    }
    Err(InferenceError::UnexpectedFormat(truncate(body, 200)))
}

fn error_detail(body: &str) -> Option<String> {
    let payload: ErrorPayload = serde_json::from_str(body).ok()?;
    let mut detail = match payload.error {
        ErrorDetail::Message(m) => m,
        ErrorDetail::Structured(v) => v.to_string(),
    };
    if let Some(secs) = payload.estimated_time {
        detail.push_str(&format!(" (estimated time {secs:.0}s)"));
    }
    Some(detail)
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
