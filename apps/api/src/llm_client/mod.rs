/// LLM Client: the single point of entry for all completion-service calls.
///
/// ARCHITECTURAL RULE: No other module may call the completion API directly.
/// Everything goes through `CompletionGateway`, whose production implementation
/// is `LlmClient` (OpenAI-compatible `/chat/completions` and `/models`).
///
/// Every failure is surfaced as a typed `LlmError`. Nothing is suppressed here;
/// falling back is the caller's decision (see `analysis::resilient`).
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;
#[cfg(test)]
pub mod testing;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Rate limited by upstream (retry after {retry_after:?}s)")]
    RateLimited { retry_after: Option<u64> },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Upstream unavailable (status {status}): {message}")]
    Unavailable { status: u16, message: String },

    #[error("Request rejected (status {status}): {message}")]
    Rejected { status: u16, message: String },
}

impl LlmError {
    /// Stable short name used in logs and error responses.
    pub fn kind(&self) -> &'static str {
        match self {
            LlmError::Network(_) => "network",
            LlmError::Timeout(_) => "timeout",
            LlmError::Auth(_) => "auth",
            LlmError::RateLimited { .. } => "rate_limited",
            LlmError::MalformedResponse(_) => "malformed_response",
            LlmError::Unavailable { .. } => "unavailable",
            LlmError::Rejected { .. } => "rejected",
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Messages
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

/// Plain text, or a list of parts when an image is attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// A role-tagged message as sent to the completion service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptMessage {
    pub role: Role,
    pub content: MessageContent,
}

impl PromptMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn user_with_image(text: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Parts(vec![
                ContentPart::Text { text: text.into() },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: image_url.into(),
                    },
                },
            ]),
        }
    }

    /// Concatenated text parts.
    pub fn text(&self) -> String {
        match &self.content {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|p| match p {
                    ContentPart::Text { text } => Some(text.as_str()),
                    ContentPart::ImageUrl { .. } => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    pub fn has_image(&self) -> bool {
        matches!(&self.content, MessageContent::Parts(parts)
            if parts.iter().any(|p| matches!(p, ContentPart::ImageUrl { .. })))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionParams {
    pub temperature: f32,
    pub max_tokens: u32,
    /// Route to the vision-capable model.
    pub vision: bool,
}

impl CompletionParams {
    pub const fn new(temperature: f32, max_tokens: u32) -> Self {
        Self {
            temperature,
            max_tokens,
            vision: false,
        }
    }

    pub const fn with_vision(mut self) -> Self {
        self.vision = true;
        self
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Gateway contract
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait CompletionGateway: Send + Sync {
    async fn complete(
        &self,
        messages: &[PromptMessage],
        params: CompletionParams,
    ) -> Result<String, LlmError>;

    /// Lightweight reachability + credential check.
    async fn health_check(&self) -> Result<bool, LlmError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [PromptMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// HTTP implementation
// ────────────────────────────────────────────────────────────────────────────

const BASE_BACKOFF_MS: u64 = 500;
const MAX_BACKOFF_MS: u64 = 8_000;
const MAX_ATTEMPTS: u32 = 5;

/// Exponential backoff: 500ms, 1s, 2s ... capped at 8s.
fn backoff_delay(attempt: u32) -> Duration {
    let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
    Duration::from_millis(BASE_BACKOFF_MS.saturating_mul(factor).min(MAX_BACKOFF_MS))
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub vision_model: String,
    pub timeout: Duration,
    /// Attempts for upstream 5xx, clamped to 1..=5. Timeouts, auth and 429
    /// are never retried.
    pub max_attempts: u32,
}

#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(mut config: LlmConfig) -> Result<Self, LlmError> {
        config.max_attempts = config.max_attempts.clamp(1, MAX_ATTEMPTS);
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Network(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url.trim_end_matches('/'))
    }

    fn api_key(&self) -> Result<&str, LlmError> {
        match self.config.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(LlmError::Auth("no API credential configured".to_string())),
        }
    }

    fn transport_error(&self, error: reqwest::Error) -> LlmError {
        if error.is_timeout() {
            LlmError::Timeout(self.config.timeout)
        } else {
            LlmError::Network(error.to_string())
        }
    }

    async fn send_once(&self, body: &CompletionRequest<'_>) -> Result<String, LlmError> {
        let api_key = self.api_key()?;

        let response = self
            .client
            .post(self.endpoint("chat/completions"))
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let headers = response.headers().clone();
        let text = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(classify_status(status, &headers, &text));
        }

        let parsed: CompletionResponse = serde_json::from_str(&text)
            .map_err(|e| LlmError::MalformedResponse(format!("invalid completion body: {e}")))?;

        if let Some(usage) = &parsed.usage {
            debug!(
                "Completion succeeded: model={}, total_tokens={}",
                body.model, usage.total_tokens
            );
        }

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| LlmError::MalformedResponse("completion had no content".to_string()))
    }
}

#[async_trait]
impl CompletionGateway for LlmClient {
    async fn complete(
        &self,
        messages: &[PromptMessage],
        params: CompletionParams,
    ) -> Result<String, LlmError> {
        let model = if params.vision || messages.iter().any(PromptMessage::has_image) {
            self.config.vision_model.as_str()
        } else {
            self.config.model.as_str()
        };
        let body = CompletionRequest {
            model,
            messages,
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        };

        let attempts = self.config.max_attempts;
        let mut attempt = 0;
        loop {
            match self.send_once(&body).await {
                Err(e @ LlmError::Unavailable { .. }) if attempt + 1 < attempts => {
                    let delay = backoff_delay(attempt);
                    warn!(
                        "Completion attempt {} failed ({e}), retrying after {}ms",
                        attempt + 1,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn health_check(&self) -> Result<bool, LlmError> {
        let api_key = self.api_key()?;

        let response = self
            .client
            .get(self.endpoint("models"))
            .bearer_auth(api_key)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(true);
        }
        let headers = response.headers().clone();
        let text = response.text().await.unwrap_or_default();
        Err(classify_status(status, &headers, &text))
    }
}

/// Maps a non-success HTTP status onto the error taxonomy.
fn classify_status(status: StatusCode, headers: &HeaderMap, body: &str) -> LlmError {
    let message = serde_json::from_str::<ApiErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string());

    match status.as_u16() {
        401 | 403 => LlmError::Auth(message),
        429 => LlmError::RateLimited {
            retry_after: headers
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok()),
        },
        code if status.is_server_error() => LlmError::Unavailable {
            status: code,
            message,
        },
        code => LlmError::Rejected {
            status: code,
            message,
        },
    }
}

/// Deserializes a completion that was asked to return JSON.
pub fn parse_json_reply<T: DeserializeOwned>(text: &str) -> Result<T, LlmError> {
    serde_json::from_str(strip_json_fences(text))
        .map_err(|e| LlmError::MalformedResponse(format!("expected JSON reply: {e}")))
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let inner = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"));
    match inner {
        Some(stripped) => stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start()),
        None => text,
    }
}
