//! Chat-completions client for OpenAI-compatible endpoints.
//!
//! The client performs exactly one request per `complete` call and
//! classifies failures; bounded retry lives with the caller, which owns
//! the backoff schedule and the concurrency gate.

use crate::models::{PreceptError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

/// Message in a chat completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Chat completion request payload.
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
}

/// Chat completion response.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

/// API error response (OpenAI-compatible).
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Response from a completion request.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Generated content
    pub content: String,
    /// Model used (may differ from requested)
    pub model: String,
    /// Input tokens
    pub input_tokens: u32,
    /// Output tokens
    pub output_tokens: u32,
    /// Request duration
    pub duration: Duration,
}

/// The generation service boundary.
///
/// A backend is safe to share across concurrent attempts; each call is a
/// stateless request/response exchange.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Issue a single completion request.
    async fn complete(
        &self,
        model: &str,
        messages: Vec<Message>,
        max_tokens: u32,
    ) -> Result<CompletionResponse>;
}

/// HTTP chat-completions client.
pub struct ChatClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
    total_requests: AtomicU64,
    total_input_tokens: AtomicU64,
    total_output_tokens: AtomicU64,
}

impl ChatClient {
    /// Create a new client.
    pub fn new(api_key: String, base_url: String, timeout_secs: u64) -> Result<Self> {
        let timeout = Duration::from_secs(timeout_secs);

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(PreceptError::Network)?;

        Ok(Self {
            client,
            api_key,
            base_url,
            timeout,
            total_requests: AtomicU64::new(0),
            total_input_tokens: AtomicU64::new(0),
            total_output_tokens: AtomicU64::new(0),
        })
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|_| PreceptError::Internal("API key is not a valid header value".into()))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// Total requests issued and (input, output) tokens consumed so far.
    pub fn usage(&self) -> (u64, u64, u64) {
        (
            self.total_requests.load(Ordering::Relaxed),
            self.total_input_tokens.load(Ordering::Relaxed),
            self.total_output_tokens.load(Ordering::Relaxed),
        )
    }
}

#[async_trait]
impl ChatBackend for ChatClient {
    async fn complete(
        &self,
        model: &str,
        messages: Vec<Message>,
        max_tokens: u32,
    ) -> Result<CompletionResponse> {
        let start = Instant::now();
        let request = ChatCompletionRequest {
            model: model.to_string(),
            messages,
            max_tokens,
        };

        let url = format!("{}/chat/completions", self.base_url);
        self.total_requests.fetch_add(1, Ordering::Relaxed);

        let response = self
            .client
            .post(&url)
            .headers(self.headers()?)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PreceptError::Timeout(self.timeout)
                } else {
                    PreceptError::Network(e)
                }
            })?;

        let status = response.status().as_u16();

        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<f64>().ok())
                .unwrap_or(1.0);
            return Err(PreceptError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !response.status().is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(match status {
                401 => PreceptError::AuthenticationFailed,
                404 => PreceptError::ModelNotFound(model.to_string()),
                _ => {
                    let message = serde_json::from_str::<ApiErrorResponse>(&error_body)
                        .map(|e| e.error.message)
                        .unwrap_or(error_body);
                    PreceptError::Api { status, message }
                }
            });
        }

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| PreceptError::Parse(format!("Failed to parse response: {e}")))?;

        let content = body
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| PreceptError::Parse("No choices in response".to_string()))?;

        let usage = body.usage.unwrap_or(ChatUsage {
            prompt_tokens: 0,
            completion_tokens: 0,
        });

        self.total_input_tokens
            .fetch_add(usage.prompt_tokens as u64, Ordering::Relaxed);
        self.total_output_tokens
            .fetch_add(usage.completion_tokens as u64, Ordering::Relaxed);

        debug!(
            model = model,
            input_tokens = usage.prompt_tokens,
            output_tokens = usage.completion_tokens,
            duration_ms = start.elapsed().as_millis() as u64,
            "Completion received"
        );

        Ok(CompletionResponse {
            content,
            model: body.model.unwrap_or_else(|| model.to_string()),
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
            duration: start.elapsed(),
        })
    }
}
