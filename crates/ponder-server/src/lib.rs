//! HTTP server assembly for Ponder

mod health;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use ponder_client::{Backend, OpenAiBackend};
use ponder_config::Config;
use ponder_gateway::GatewayState;
use ponder_strategy::StrategyRegistry;
use tower_http::trace::TraceLayer;

/// Assembled server with all routes and middleware
pub struct Server {
    router: Router,
    listen_address: SocketAddr,
}

impl Server {
    /// Build the server from a validated configuration
    ///
    /// The backend client is chosen once here: the configured base URL when
    /// set, otherwise the default `OpenAI` endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend client or gateway state cannot be built
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let backend = OpenAiBackend::new(config.gateway.base_url.clone(), config.gateway.api_key.clone())?;
        Self::with_backend(config, Arc::new(backend))
    }

    /// Build the server around an already constructed backend
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway state cannot be built
    pub fn with_backend(config: Config, backend: Arc<dyn Backend>) -> anyhow::Result<Self> {
        let listen_address = config.server.listen_address();
        let registry = StrategyRegistry::from_config(&config.strategies);

        tracing::info!(
            approach = %config.gateway.approach,
            model = %config.gateway.model,
            backend = backend.name(),
            strategies = ?registry.names(),
            "gateway configured"
        );

        let gateway = GatewayState::new(config.gateway, registry, backend)?;

        let mut app = Router::new();

        if config.server.health.enabled {
            app = app.route(&config.server.health.path, axum::routing::get(health::health_handler));
        }

        app = app.merge(ponder_gateway::gateway_router(gateway));
        app = app.layer(TraceLayer::new_for_http());

        Ok(Self {
            router: app,
            listen_address,
        })
    }

    /// Get the configured listen address
    #[must_use]
    pub const fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    /// Consume the server and return the inner router
    ///
    /// Useful for testing when the caller manages the listener
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Start serving requests
    ///
    /// Blocks until the cancellation token is triggered.
    ///
    /// # Errors
    ///
    /// Returns an error if binding the TCP listener or serving fails
    pub async fn serve(self, shutdown: tokio_util::sync::CancellationToken) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_address).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "server listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                tracing::info!("graceful shutdown initiated");
            })
            .await?;

        Ok(())
    }
}
