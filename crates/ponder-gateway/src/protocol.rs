//! `OpenAI` chat completions wire format, as far as the gateway reads it

use serde::{Deserialize, Serialize};

// -- Request types --

/// Inbound chat completion request
///
/// Fields the gateway does not act on (temperature, stream, tools, ...)
/// are ignored rather than rejected.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionRequest {
    /// `<approach>-<model>` in auto mode, otherwise the backend model
    #[serde(default)]
    pub model: Option<String>,
    /// Conversation messages
    #[serde(default)]
    pub messages: Vec<WireMessage>,
    /// Number of candidate answers requested
    #[serde(default)]
    pub n: Option<u32>,
}

/// Message within an inbound request
#[derive(Debug, Clone, Deserialize)]
pub struct WireMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<WireContent>,
}

/// Content is either a string or an array of content parts
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireContent {
    Text(String),
    Parts(Vec<WirePart>),
}

/// Individual content part; only text parts carry prompt text
#[derive(Debug, Clone, Deserialize)]
pub struct WirePart {
    #[serde(rename = "type")]
    pub part_type: String,
    #[serde(default)]
    pub text: Option<String>,
}

impl WireContent {
    /// Plain text of the content, text parts concatenated in order
    pub fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Parts(parts) => parts
                .into_iter()
                .filter(|part| part.part_type == "text")
                .filter_map(|part| part.text)
                .collect(),
        }
    }
}

// -- Response types --

/// Chat completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    pub id: String,
    pub object: String,
    pub created: u64,
    /// Model the strategy ran against
    pub model: String,
    pub choices: Vec<Choice>,
}

/// One candidate answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    pub index: u32,
    pub message: AssistantMessage,
    pub finish_reason: String,
}

/// Assistant message carried by a choice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantMessage {
    pub role: String,
    pub content: String,
}

/// `GET /v1/models` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelList {
    pub object: String,
    pub data: Vec<ModelEntry>,
}

/// Entry in the model list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEntry {
    pub id: String,
    pub object: String,
    pub created: u64,
    pub owned_by: String,
}
