//! Configuration snapshot for the Ponder gateway
//!
//! A [`Config`] is assembled once at startup (TOML file, then command-line
//! overrides), validated, and then shared read-only by every request.

#![allow(clippy::must_use_candidate)]

mod env;
pub mod gateway;
pub mod health;
mod loader;
pub mod server;
pub mod strategy;
pub mod telemetry;

use serde::Deserialize;

pub use gateway::*;
pub use health::*;
pub use server::*;
pub use strategy::*;
pub use telemetry::TelemetryConfig;

/// Top-level Ponder configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Approach selection, default model, and backend endpoint
    #[serde(default)]
    pub gateway: GatewayConfig,
    /// Per-strategy parameter groups
    #[serde(default)]
    pub strategies: StrategyConfig,
    /// Telemetry configuration
    #[serde(default)]
    pub telemetry: Option<TelemetryConfig>,
}
