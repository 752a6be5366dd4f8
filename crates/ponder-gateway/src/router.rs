//! Axum route handlers for the chat completions surface

use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use ponder_client::Backend;
use ponder_config::GatewayConfig;
use ponder_strategy::StrategyRegistry;

use crate::error::GatewayError;
use crate::invoke::Invoker;
use crate::protocol::{ChatCompletionRequest, ChatCompletionResponse, ModelEntry, ModelList};
use crate::resolve::ResolvedInvocation;
use crate::response::{assemble, unix_now};
use crate::translate::ChatRequest;

/// Shared state for gateway handlers
///
/// Built once at startup and never mutated, so requests share it without
/// locking.
#[derive(Clone)]
pub struct GatewayState {
    inner: Arc<GatewayStateInner>,
}

struct GatewayStateInner {
    config: GatewayConfig,
    invoker: Invoker,
}

impl GatewayState {
    pub fn new(
        config: GatewayConfig,
        registry: StrategyRegistry,
        backend: Arc<dyn Backend>,
    ) -> anyhow::Result<Self> {
        let timeout = config.strategy_timeout()?;

        Ok(Self {
            inner: Arc::new(GatewayStateInner {
                invoker: Invoker::new(registry, backend, timeout),
                config,
            }),
        })
    }

    /// Handle one chat completion end to end
    pub async fn complete(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, GatewayError> {
        let request = ChatRequest::from_wire(request, &self.inner.config)?;
        let resolved = ResolvedInvocation::resolve(&self.inner.config, &request.model)?;

        tracing::debug!(
            approach = %resolved.strategy_name,
            model = %resolved.model,
            n = request.n,
            "resolved chat completion"
        );

        let output = self.inner.invoker.invoke(&resolved, &request).await?;
        Ok(assemble(&resolved.model, output))
    }
}

/// Build the gateway router
pub fn gateway_router(state: GatewayState) -> Router {
    Router::new()
        .route("/v1/chat/completions", routing::post(chat_completions))
        .route("/v1/models", routing::get(list_models))
        .with_state(state)
}

/// Handle `POST /v1/chat/completions`
async fn chat_completions(
    State(state): State<GatewayState>,
    payload: Result<Json<ChatCompletionRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return GatewayError::MalformedRequest(rejection.body_text()).into_response(),
    };

    match state.complete(request).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Handle `GET /v1/models`
async fn list_models(State(state): State<GatewayState>) -> Json<ModelList> {
    let created = unix_now();

    let data = state
        .inner
        .invoker
        .approaches()
        .into_iter()
        .map(|approach| ModelEntry {
            id: approach.to_owned(),
            object: "model".to_owned(),
            created,
            owned_by: "ponder".to_owned(),
        })
        .collect();

    Json(ModelList {
        object: "list".to_owned(),
        data,
    })
}
