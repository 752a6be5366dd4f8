use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::BackendError;

/// A single chat turn sent to the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message author (`system`, `user`, or `assistant`)
    pub role: String,
    /// Text content
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_owned(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_owned(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_owned(),
            content: content.into(),
        }
    }
}

/// Completion request issued by a strategy
#[derive(Debug, Clone)]
pub struct BackendRequest {
    /// Model identifier understood by the provider
    pub model: String,
    /// Conversation to complete
    pub messages: Vec<ChatMessage>,
    /// Number of completions requested
    pub n: u32,
    /// Sampling temperature, provider default when `None`
    pub temperature: Option<f64>,
    /// Generation cap, provider default when `None`
    pub max_tokens: Option<u32>,
}

impl BackendRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            n: 1,
            temperature: None,
            max_tokens: None,
        }
    }

    #[must_use]
    pub const fn with_n(mut self, n: u32) -> Self {
        self.n = n;
        self
    }

    #[must_use]
    pub const fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Completions returned by the backend, in provider order
#[derive(Debug, Clone, Default)]
pub struct BackendResponse {
    /// Text of each returned choice
    pub choices: Vec<String>,
    /// Tokens generated across all choices, when the provider reports it
    pub completion_tokens: u32,
}

impl BackendResponse {
    /// Take the first choice
    pub fn into_first(self) -> Result<String, BackendError> {
        self.choices.into_iter().next().ok_or(BackendError::Empty)
    }
}

/// Language-model provider as seen by strategies
///
/// Implementations must be cheap to share across concurrent requests.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Human-readable backend name used in logs
    fn name(&self) -> &str;

    /// Send a chat completion request
    async fn chat(&self, request: BackendRequest) -> Result<BackendResponse, BackendError>;

    /// Send a request and return only the first completion
    async fn complete(&self, request: BackendRequest) -> Result<String, BackendError> {
        self.chat(request).await?.into_first()
    }
}
