//! `OpenAI`-compatible backend implementation

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::backend::{Backend, BackendRequest, BackendResponse};
use crate::error::BackendError;
use crate::protocol::{OpenAiMessage, OpenAiRequest, OpenAiResponse};

/// Default `OpenAI` API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Backend speaking the `OpenAI` chat completions protocol
#[derive(Clone)]
pub struct OpenAiBackend {
    client: Client,
    base_url: Url,
    api_key: Option<SecretString>,
}

impl std::fmt::Debug for OpenAiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiBackend")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

impl OpenAiBackend {
    /// Create a backend for the given endpoint
    ///
    /// `None` selects the public `OpenAI` endpoint; an override points the
    /// gateway at any compatible server.
    pub fn new(base_url: Option<Url>, api_key: Option<SecretString>) -> Result<Self, BackendError> {
        let base_url = match base_url {
            Some(url) => url,
            None => Url::parse(DEFAULT_BASE_URL).map_err(|e| BackendError::Config(e.to_string()))?,
        };

        let client = Client::builder()
            .build()
            .map_err(|e| BackendError::Config(format!("failed to build HTTP client: {e}")))?;

        tracing::debug!(base_url = %base_url, "backend client configured");

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    /// Endpoint this backend is bound to
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build the chat completions URL
    fn completions_url(&self) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/chat/completions")
    }
}

#[async_trait]
impl Backend for OpenAiBackend {
    fn name(&self) -> &str {
        self.base_url.host_str().unwrap_or("openai")
    }

    async fn chat(&self, request: BackendRequest) -> Result<BackendResponse, BackendError> {
        let messages: Vec<OpenAiMessage> = request
            .messages
            .into_iter()
            .map(|m| OpenAiMessage {
                role: m.role,
                content: m.content,
            })
            .collect();

        let wire_request = OpenAiRequest {
            model: &request.model,
            messages: &messages,
            n: (request.n > 1).then_some(request.n),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let mut builder = self.client.post(self.completions_url()).json(&wire_request);

        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }

        let response = builder.send().await.map_err(|e| {
            tracing::error!(backend = %self.name(), error = %e, "backend request failed");
            BackendError::Transport(e.to_string())
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(backend = %self.name(), status = %status, "backend returned error");
            return Err(BackendError::Status { status, body });
        }

        let wire_response: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;

        let mut choices = wire_response.choices;
        choices.sort_by_key(|c| c.index);

        let texts: Vec<String> = choices
            .into_iter()
            .map(|c| c.message.content.unwrap_or_default())
            .collect();

        if texts.is_empty() {
            return Err(BackendError::Empty);
        }

        tracing::debug!(model = %request.model, choices = texts.len(), "backend completion received");

        Ok(BackendResponse {
            choices: texts,
            completion_tokens: wire_response.usage.map_or(0, |u| u.completion_tokens),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::{Json, Router, routing};

    use super::*;
    use crate::backend::ChatMessage;

    async fn spawn(app: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        addr
    }

    fn backend_for(addr: SocketAddr, key: Option<&str>) -> OpenAiBackend {
        let url = Url::parse(&format!("http://{addr}/v1")).unwrap();
        OpenAiBackend::new(Some(url), key.map(SecretString::from)).unwrap()
    }

    #[test]
    fn defaults_to_public_endpoint() {
        let backend = OpenAiBackend::new(None, None).unwrap();
        assert_eq!(backend.base_url().as_str(), "https://api.openai.com/v1");
        assert_eq!(backend.completions_url(), "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn debug_output_hides_key() {
        let backend = OpenAiBackend::new(None, Some(SecretString::from("sk-hidden"))).unwrap();
        assert!(!format!("{backend:?}").contains("sk-hidden"));
    }

    #[tokio::test]
    async fn sends_request_and_orders_choices() {
        let app = Router::new().route(
            "/v1/chat/completions",
            routing::post(|headers: HeaderMap, Json(body): Json<serde_json::Value>| async move {
                assert_eq!(headers["authorization"], "Bearer sk-test");
                assert_eq!(body["model"], "gpt-4o-mini");
                assert_eq!(body["n"], 2);
                assert_eq!(body["messages"][0]["role"], "system");
                Json(serde_json::json!({
                    "choices": [
                        {"index": 1, "message": {"role": "assistant", "content": "second"}},
                        {"index": 0, "message": {"role": "assistant", "content": "first"}}
                    ],
                    "usage": {"prompt_tokens": 3, "completion_tokens": 7}
                }))
            }),
        );
        let addr = spawn(app).await;
        let backend = backend_for(addr, Some("sk-test"));

        let request = BackendRequest::new(
            "gpt-4o-mini",
            vec![ChatMessage::system("be brief"), ChatMessage::user("hi")],
        )
        .with_n(2);

        let response = backend.chat(request).await.unwrap();
        assert_eq!(response.choices, vec!["first", "second"]);
        assert_eq!(response.completion_tokens, 7);
    }

    #[tokio::test]
    async fn maps_error_status() {
        let app = Router::new().route(
            "/v1/chat/completions",
            routing::post(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down").into_response() }),
        );
        let addr = spawn(app).await;
        let backend = backend_for(addr, None);

        let err = backend
            .complete(BackendRequest::new("m", vec![ChatMessage::user("hi")]))
            .await
            .unwrap_err();

        match err {
            BackendError::Status { status, body } => {
                assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
                assert_eq!(body, "slow down");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_choices_are_an_error() {
        let app = Router::new().route(
            "/v1/chat/completions",
            routing::post(|| async { Json(serde_json::json!({"choices": []})) }),
        );
        let addr = spawn(app).await;
        let backend = backend_for(addr, None);

        let err = backend
            .chat(BackendRequest::new("m", vec![ChatMessage::user("hi")]))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Empty));
    }
}
