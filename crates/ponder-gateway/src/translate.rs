//! Normalizes an inbound request into the inputs a strategy needs

use ponder_config::GatewayConfig;

use crate::error::GatewayError;
use crate::protocol::{ChatCompletionRequest, WireContent};

/// Normalized chat request
///
/// Only the first system message and the first user message are kept;
/// later turns of either role are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    /// Content of the first `system` message, empty when there is none
    pub system_prompt: String,
    /// Content of the first `user` message, empty when there is none
    pub query: String,
    /// Model field, defaulted from configuration
    pub model: String,
    /// Candidate count, defaulted from configuration
    pub n: u32,
}

impl ChatRequest {
    /// Normalize a decoded request against the configured defaults
    pub fn from_wire(request: ChatCompletionRequest, config: &GatewayConfig) -> Result<Self, GatewayError> {
        let n = request.n.unwrap_or(config.n);
        if n == 0 {
            return Err(GatewayError::MalformedRequest("n must be at least 1".to_owned()));
        }

        let mut system_prompt = None;
        let mut query = None;

        for message in request.messages {
            let slot = match message.role.as_str() {
                "system" => &mut system_prompt,
                "user" => &mut query,
                _ => continue,
            };

            if slot.is_none() {
                *slot = Some(message.content.map(WireContent::into_text).unwrap_or_default());
            }
        }

        Ok(Self {
            system_prompt: system_prompt.unwrap_or_default(),
            query: query.unwrap_or_default(),
            model: request.model.unwrap_or_else(|| config.model.clone()),
            n,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translate(json: &str) -> Result<ChatRequest, GatewayError> {
        let request: ChatCompletionRequest = serde_json::from_str(json).unwrap();
        ChatRequest::from_wire(request, &GatewayConfig::default())
    }

    #[test]
    fn first_system_and_user_messages_win() {
        let request = translate(
            r#"{"model":"m","messages":[
                {"role":"user","content":"first question"},
                {"role":"system","content":"be brief"},
                {"role":"assistant","content":"ok"},
                {"role":"user","content":"second question"},
                {"role":"system","content":"be verbose"}
            ]}"#,
        )
        .unwrap();

        assert_eq!(request.system_prompt, "be brief");
        assert_eq!(request.query, "first question");
    }

    #[test]
    fn missing_roles_become_empty() {
        let request = translate(r#"{"model":"m","messages":[{"role":"assistant","content":"hi"}]}"#).unwrap();
        assert_eq!(request.system_prompt, "");
        assert_eq!(request.query, "");

        let request = translate(r#"{"model":"m"}"#).unwrap();
        assert_eq!(request.system_prompt, "");
        assert_eq!(request.query, "");
    }

    #[test]
    fn null_content_counts_as_the_first_occurrence() {
        let request = translate(
            r#"{"messages":[{"role":"user","content":null},{"role":"user","content":"later"}]}"#,
        )
        .unwrap();
        assert_eq!(request.query, "");
    }

    #[test]
    fn model_and_n_default_from_config() {
        let request = translate(r#"{"messages":[]}"#).unwrap();
        assert_eq!(request.model, "gpt-4o-mini");
        assert_eq!(request.n, 1);

        let request = translate(r#"{"model":"bon-gpt-4o","n":3}"#).unwrap();
        assert_eq!(request.model, "bon-gpt-4o");
        assert_eq!(request.n, 3);
    }

    #[test]
    fn zero_n_is_malformed() {
        let error = translate(r#"{"n":0}"#).unwrap_err();
        assert!(matches!(error, GatewayError::MalformedRequest(_)));
    }
}
