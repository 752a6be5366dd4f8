use std::net::SocketAddr;

use serde::Deserialize;

use crate::health::HealthConfig;

/// Port the gateway listens on when no address is configured
pub const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub listen_address: Option<SocketAddr>,
    #[serde(default)]
    pub health: HealthConfig,
}

impl ServerConfig {
    /// Configured listen address, or `0.0.0.0:8000`
    pub fn listen_address(&self) -> SocketAddr {
        self.listen_address
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)))
    }
}
