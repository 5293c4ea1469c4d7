//! LLM Client: the single point of entry for all chat-completion calls in TalentScout.
//!
//! ARCHITECTURAL RULE: No other module may call the completion API directly.
//! Callers go through `Responder`, which turns every failure into
//! `ChatOutcome::Unavailable` so the dialogue can fall back deterministically.
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;

pub mod prompts;

const MAX_RETRIES: u32 = 2;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// Speaker of a chat turn. Shared by the conversation log and the completion API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Everything a backend needs for one completion: instruction, prior turns, sampling.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub system: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Result of asking the generative service for text.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatOutcome {
    Reply(String),
    Unavailable(String),
}

/// A chat-completion backend. `LlmClient` is the production implementation;
/// tests plug in canned backends.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError>;
}

/// Wraps an optional backend. With no backend configured every call is
/// `Unavailable`, which is how the service runs without an API key.
#[derive(Clone, Default)]
pub struct Responder {
    backend: Option<Arc<dyn ChatBackend>>,
}

impl Responder {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    pub fn disabled() -> Self {
        Self { backend: None }
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    pub async fn respond(&self, request: &ChatRequest) -> ChatOutcome {
        let Some(backend) = &self.backend else {
            return ChatOutcome::Unavailable("no LLM backend configured".to_string());
        };

        match backend.complete(request).await {
            Ok(text) if !text.trim().is_empty() => ChatOutcome::Reply(text.trim().to_string()),
            Ok(_) => {
                warn!("LLM returned blank text, falling back");
                ChatOutcome::Unavailable(LlmError::EmptyContent.to_string())
            }
            Err(e) => {
                warn!("LLM unavailable, falling back: {e}");
                ChatOutcome::Unavailable(e.to_string())
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<&'a ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
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
    prompt_tokens: u32,
    completion_tokens: u32,
}

impl CompletionResponse {
    /// Text of the first choice, if any.
    fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// OpenAI-compatible chat-completions client with a bounded timeout and retry.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl LlmClient {
    pub fn new(
        api_key: String,
        model: String,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
            model,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
        })
    }

    /// Builds a client when an API key is configured.
    pub fn from_config(config: &Config) -> Result<Option<Self>, LlmError> {
        match &config.openai_api_key {
            Some(key) => Ok(Some(Self::new(
                key.clone(),
                config.openai_model.clone(),
                &config.openai_base_url,
                Duration::from_secs(config.llm_timeout_secs),
            )?)),
            None => Ok(None),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Makes one completion call, retrying on 429 and 5xx with exponential backoff.
    async fn call(&self, request: &ChatRequest) -> Result<String, LlmError> {
        let system = ChatMessage::new(Role::System, request.system.clone());
        let mut messages: Vec<&ChatMessage> = Vec::with_capacity(request.messages.len() + 1);
        if !request.system.is_empty() {
            messages.push(&system);
        }
        messages.extend(request.messages.iter());

        let body = CompletionRequest {
            model: &self.model,
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 500ms, 1s
                let delay = Duration::from_millis(500 * (1 << (attempt - 1)));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<ApiError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let completion: CompletionResponse = response.json().await?;

            if let Some(usage) = &completion.usage {
                debug!(
                    "LLM call succeeded: prompt_tokens={}, completion_tokens={}",
                    usage.prompt_tokens, usage.completion_tokens
                );
            }

            return completion
                .text()
                .map(str::to_string)
                .ok_or(LlmError::EmptyContent);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }
}

#[async_trait]
impl ChatBackend for LlmClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError> {
        self.call(request).await
    }
}
