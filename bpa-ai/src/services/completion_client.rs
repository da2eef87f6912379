//! Completion service client
//!
//! Thin wrapper around an OpenAI-compatible `/chat/completions` endpoint.
//! Exactly one network call per `complete()`; retries belong to the caller.
//!
//! Status mapping:
//! - transport failure, wall-clock timeout, non-success status → `Unavailable`
//! - success status whose body carries an `error` object → `Rejected`
//! - success body without choices → empty text (left to the schema guard)

use async_trait::async_trait;
use bpa_common::config::CompletionConfig;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::num::NonZeroU32;
use std::time::{Duration, Instant};

use crate::types::{
    CompletionError, CompletionOptions, CompletionService, PromptSpec, RawCompletion,
};

const USER_AGENT: &str = concat!("bpa-ai/", env!("CARGO_PKG_VERSION"));

/// Lower and upper bound for the per-call wall-clock timeout
const MIN_TIMEOUT_SECS: u64 = 30;
const MAX_TIMEOUT_SECS: u64 = 60;

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

/// Completion client for OpenAI-compatible services
pub struct CompletionClient {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    timeout: Duration,
    rate_limiter: DefaultDirectRateLimiter,
}

impl fmt::Debug for CompletionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionClient")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl CompletionClient {
    /// Build a client; `api_key = None` yields a client whose every call
    /// fails with `MissingCredential`
    pub fn new(
        config: &CompletionConfig,
        api_key: Option<String>,
    ) -> Result<Self, CompletionError> {
        let timeout = Duration::from_secs(
            config.timeout_secs.clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS),
        );

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| CompletionError::Unavailable(format!("HTTP client init failed: {}", e)))?;

        let per_second = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);

        Ok(Self {
            http_client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: api_key.filter(|k| bpa_common::config::is_valid_key(k)),
            timeout,
            rate_limiter: RateLimiter::direct(Quota::per_second(per_second)),
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn send(
        &self,
        api_key: &str,
        body: &ChatRequest<'_>,
    ) -> Result<RawCompletion, CompletionError> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                let kind = if e.is_timeout() { "timeout" } else { "transport" };
                CompletionError::Unavailable(format!("{} failure: {}", kind, e.without_url()))
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            CompletionError::Unavailable(format!("reading body failed: {}", e.without_url()))
        })?;

        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "Completion service returned error status");
            return Err(CompletionError::Unavailable(format!("status {}", status.as_u16())));
        }

        interpret_body(&text)
    }
}

/// Classify a success-status response body
pub fn interpret_body(body: &str) -> Result<RawCompletion, CompletionError> {
    let raw: Value = serde_json::from_str(body)
        .map_err(|e| CompletionError::Unavailable(format!("unreadable response body: {}", e)))?;

    if let Some(error) = raw.get("error").filter(|e| !e.is_null()) {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .or_else(|| error.as_str())
            .unwrap_or("unspecified error");
        return Err(CompletionError::Rejected(message.to_string()));
    }

    let text = raw
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Ok(RawCompletion { text, raw })
}

#[async_trait]
impl CompletionService for CompletionClient {
    async fn complete(
        &self,
        prompt: &PromptSpec,
        options: &CompletionOptions,
    ) -> Result<RawCompletion, CompletionError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(CompletionError::MissingCredential)?;

        self.rate_limiter.until_ready().await;

        let body = ChatRequest {
            model: &options.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &prompt.system_message,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user_message,
                },
            ],
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            response_format: options
                .force_json_mode
                .then_some(ResponseFormat { kind: "json_object" }),
        };

        tracing::debug!(
            model = %options.model,
            max_tokens = options.max_tokens,
            json_mode = options.force_json_mode,
            "Calling completion service"
        );

        let started = Instant::now();
        let result = match tokio::time::timeout(self.timeout, self.send(api_key, &body)).await {
            Ok(result) => result,
            Err(_) => Err(CompletionError::Unavailable(format!(
                "no response within {}s",
                self.timeout.as_secs()
            ))),
        };

        match &result {
            Ok(completion) => tracing::debug!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                chars = completion.text.len(),
                "Completion received"
            ),
            Err(e) => tracing::warn!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                error = %e,
                "Completion call failed"
            ),
        }

        result
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}
