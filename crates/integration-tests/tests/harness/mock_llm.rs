//! Mock LLM backend for integration tests
//!
//! Implements a minimal `OpenAI`-compatible chat completions endpoint that
//! answers every request with the same content, `n` times.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::{Json, Router, routing};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

const DEFAULT_CONTENT: &str = "Hello from mock";

/// Mock LLM backend that returns predictable responses
pub struct MockLlm {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockLlmState>,
}

struct MockLlmState {
    completion_count: AtomicU32,
    /// Number of requests to fail before succeeding (0 = never fail)
    fail_count: AtomicU32,
    /// Content of every choice
    content: String,
    /// Delay before answering
    delay: Option<Duration>,
    /// Model names received, in arrival order
    models: Mutex<Vec<String>>,
    /// Authorization headers received, in arrival order
    authorizations: Mutex<Vec<String>>,
}

impl MockLlm {
    /// Start the mock server, returning immediately
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_inner(0, DEFAULT_CONTENT, None).await
    }

    /// Start a mock server that fails the first `n` requests with 500
    pub async fn start_failing(n: u32) -> anyhow::Result<Self> {
        Self::start_inner(n, DEFAULT_CONTENT, None).await
    }

    /// Start a mock server with a custom response content
    pub async fn start_with_response(content: &str) -> anyhow::Result<Self> {
        Self::start_inner(0, content, None).await
    }

    /// Start a mock server that waits before every answer
    pub async fn start_slow(delay: Duration) -> anyhow::Result<Self> {
        Self::start_inner(0, DEFAULT_CONTENT, Some(delay)).await
    }

    async fn start_inner(fail_count: u32, content: &str, delay: Option<Duration>) -> anyhow::Result<Self> {
        let state = Arc::new(MockLlmState {
            completion_count: AtomicU32::new(0),
            fail_count: AtomicU32::new(fail_count),
            content: content.to_owned(),
            delay,
            models: Mutex::new(Vec::new()),
            authorizations: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/v1/chat/completions", routing::post(handle_chat_completions))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL for configuring the mock as the backend
    ///
    /// Includes `/v1` since the backend appends `/chat/completions`
    pub fn base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    /// Number of completion requests received, failed ones included
    pub fn completion_count(&self) -> u32 {
        self.state.completion_count.load(Ordering::Relaxed)
    }

    /// Model names received, in arrival order
    pub fn models(&self) -> Vec<String> {
        self.state.models.lock().unwrap().clone()
    }

    /// Authorization headers received, in arrival order
    pub fn authorizations(&self) -> Vec<String> {
        self.state.authorizations.lock().unwrap().clone()
    }
}

impl Drop for MockLlm {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

// -- Wire types matching OpenAI format --

#[derive(Debug, Deserialize)]
struct ChatCompletionRequest {
    model: String,
    #[allow(dead_code)]
    messages: Vec<serde_json::Value>,
    #[serde(default)]
    n: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatCompletionResponse {
    id: String,
    object: String,
    created: u64,
    model: String,
    choices: Vec<Choice>,
    usage: Usage,
}

#[derive(Debug, Serialize)]
struct Choice {
    index: u32,
    message: Message,
    finish_reason: String,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

async fn handle_chat_completions(
    State(state): State<Arc<MockLlmState>>,
    headers: HeaderMap,
    Json(request): Json<ChatCompletionRequest>,
) -> impl IntoResponse {
    state.completion_count.fetch_add(1, Ordering::Relaxed);
    state.models.lock().unwrap().push(request.model.clone());
    if let Some(auth) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
        state.authorizations.lock().unwrap().push(auth.to_owned());
    }

    if let Some(delay) = state.delay {
        tokio::time::sleep(delay).await;
    }

    let remaining = state.fail_count.load(Ordering::Relaxed);
    if remaining > 0 {
        state.fail_count.fetch_sub(1, Ordering::Relaxed);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": { "message": "mock failure" } })),
        )
            .into_response();
    }

    let choices = (0..request.n.unwrap_or(1).max(1))
        .map(|index| Choice {
            index,
            message: Message {
                role: "assistant".to_owned(),
                content: state.content.clone(),
            },
            finish_reason: "stop".to_owned(),
        })
        .collect();

    let response = ChatCompletionResponse {
        id: "chatcmpl-mock".to_owned(),
        object: "chat.completion".to_owned(),
        created: 0,
        model: request.model,
        choices,
        usage: Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        },
    };

    Json(response).into_response()
}
