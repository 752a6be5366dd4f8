//! Runs the resolved strategy against the shared backend

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use ponder_client::{Backend, BackendError, BackendRequest, BackendResponse};
use ponder_strategy::{StrategyInput, StrategyOutput, StrategyRegistry};
use ponder_telemetry::StrategyMetrics;

use crate::error::GatewayError;
use crate::resolve::ResolvedInvocation;
use crate::translate::ChatRequest;

/// Backend view that tallies generated tokens for one invocation
struct MeteredBackend<'a> {
    inner: &'a dyn Backend,
    completion_tokens: AtomicU64,
}

impl<'a> MeteredBackend<'a> {
    fn new(inner: &'a dyn Backend) -> Self {
        Self {
            inner,
            completion_tokens: AtomicU64::new(0),
        }
    }

    fn completion_tokens(&self) -> u64 {
        self.completion_tokens.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Backend for MeteredBackend<'_> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn chat(&self, request: BackendRequest) -> Result<BackendResponse, BackendError> {
        let response = self.inner.chat(request).await?;
        self.completion_tokens
            .fetch_add(u64::from(response.completion_tokens), Ordering::Relaxed);
        Ok(response)
    }
}

/// Looks up strategies and runs them with an optional time bound
pub struct Invoker {
    registry: StrategyRegistry,
    backend: Arc<dyn Backend>,
    timeout: Option<Duration>,
    metrics: StrategyMetrics,
}

impl Invoker {
    pub fn new(registry: StrategyRegistry, backend: Arc<dyn Backend>, timeout: Option<Duration>) -> Self {
        Self {
            registry,
            backend,
            timeout,
            metrics: StrategyMetrics::new(),
        }
    }

    /// Registered strategy names, sorted
    pub fn approaches(&self) -> Vec<&str> {
        self.registry.names()
    }

    /// Run the resolved strategy for one request
    ///
    /// Unknown strategy names fail before any backend call. Dropping the
    /// returned future abandons the strategy together with its in-flight
    /// backend calls.
    pub async fn invoke(&self, resolved: &ResolvedInvocation, request: &ChatRequest) -> Result<StrategyOutput, GatewayError> {
        let strategy = self
            .registry
            .get(&resolved.strategy_name)
            .ok_or_else(|| GatewayError::UnknownApproach {
                name: resolved.strategy_name.clone(),
                configured: resolved.configured,
            })?;

        let input = StrategyInput {
            system_prompt: &request.system_prompt,
            query: &request.query,
            model: &resolved.model,
            n: request.n,
        };

        let backend = MeteredBackend::new(self.backend.as_ref());
        let start = Instant::now();
        let run = strategy.run(&input, &backend);

        let result = match self.timeout {
            Some(after) => match tokio::time::timeout(after, run).await {
                Ok(outcome) => outcome.map_err(GatewayError::from),
                Err(_) => Err(GatewayError::Timeout {
                    approach: resolved.strategy_name.clone(),
                    after,
                }),
            },
            None => run.await.map_err(GatewayError::from),
        };

        let completion_tokens = backend.completion_tokens();

        match &result {
            Ok(output) => {
                tracing::info!(
                    approach = %resolved.strategy_name,
                    model = %resolved.model,
                    candidates = output.len(),
                    completion_tokens,
                    elapsed = ?start.elapsed(),
                    "strategy finished"
                );
                self.metrics
                    .record(&resolved.strategy_name, "ok", start, output.len(), completion_tokens);
            }
            Err(e) => {
                tracing::warn!(
                    approach = %resolved.strategy_name,
                    model = %resolved.model,
                    completion_tokens,
                    elapsed = ?start.elapsed(),
                    error = %e,
                    "strategy failed"
                );
                self.metrics
                    .record(&resolved.strategy_name, "error", start, 0, completion_tokens);
            }
        }

        result
    }
}

impl std::fmt::Debug for Invoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Invoker")
            .field("registry", &self.registry)
            .field("backend", &self.backend.name())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
