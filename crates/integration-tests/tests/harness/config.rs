//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;

use ponder_config::{Config, CotReflectionConfig, GatewayConfig, HealthConfig, ServerConfig};
use secrecy::SecretString;

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with minimal defaults
    pub fn new() -> Self {
        Self {
            config: Config {
                server: ServerConfig {
                    listen_address: Some(SocketAddr::from(([127, 0, 0, 1], 0))),
                    health: HealthConfig {
                        enabled: true,
                        ..HealthConfig::default()
                    },
                },
                gateway: GatewayConfig {
                    api_key: Some(SecretString::from("test-key")),
                    ..GatewayConfig::default()
                },
                ..Config::default()
            },
        }
    }

    /// Point the gateway at a mock backend
    pub fn with_backend(mut self, base_url: &str) -> Self {
        self.config.gateway.base_url = Some(base_url.parse().expect("valid URL"));
        self
    }

    /// Set the configured approach (`auto` by default)
    pub fn with_approach(mut self, approach: &str) -> Self {
        self.config.gateway.approach = approach.to_owned();
        self
    }

    /// Set the default model
    pub fn with_model(mut self, model: &str) -> Self {
        self.config.gateway.model = model.to_owned();
        self
    }

    /// Set the chain-of-thought reflection parameters
    pub fn with_cot_reflection(mut self, config: CotReflectionConfig) -> Self {
        self.config.strategies.cot_reflection = config;
        self
    }

    /// Bound each strategy invocation
    pub fn with_strategy_timeout(mut self, timeout: &str) -> Self {
        self.config.gateway.strategy_timeout = Some(timeout.to_owned());
        self
    }

    /// Disable health endpoint
    pub fn without_health(mut self) -> Self {
        self.config.server.health.enabled = false;
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config
    }
}
