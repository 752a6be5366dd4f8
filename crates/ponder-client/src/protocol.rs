//! `OpenAI` chat completion wire format, reduced to what strategies send and read

use serde::{Deserialize, Serialize};

/// `OpenAI` chat completion request
#[derive(Debug, Clone, Serialize)]
pub struct OpenAiRequest<'a> {
    /// Model identifier
    pub model: &'a str,
    /// Conversation messages
    pub messages: &'a [OpenAiMessage],
    /// Number of choices to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,
    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// `OpenAI` message within a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenAiMessage {
    /// Message role
    pub role: String,
    /// Text content
    pub content: String,
}

/// `OpenAI` chat completion response
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiResponse {
    /// Generated choices
    #[serde(default)]
    pub choices: Vec<OpenAiChoice>,
    /// Token usage
    #[serde(default)]
    pub usage: Option<OpenAiUsage>,
}

/// Choice within an `OpenAI` response
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiChoice {
    /// Choice index
    #[serde(default)]
    pub index: u32,
    /// Generated message
    pub message: OpenAiChoiceMessage,
}

/// Message within an `OpenAI` response choice
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiChoiceMessage {
    /// Text content, absent for tool-call-only replies
    #[serde(default)]
    pub content: Option<String>,
}

/// Token usage in an `OpenAI` response
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct OpenAiUsage {
    /// Prompt tokens
    #[serde(default)]
    pub prompt_tokens: u32,
    /// Completion tokens
    #[serde(default)]
    pub completion_tokens: u32,
}
