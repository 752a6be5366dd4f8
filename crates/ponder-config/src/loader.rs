use std::path::Path;
use std::str::FromStr;

use secrecy::SecretString;

use crate::{API_KEY_ENV, Approach, Config};

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes the result. Validation is left to the caller so that
    /// command-line overrides can be applied first.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, or TOML parsing fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::from_toml(&raw)
    }

    /// Parse configuration from TOML text, expanding environment placeholders
    ///
    /// # Errors
    ///
    /// Returns an error if placeholder expansion or TOML parsing fails
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))
    }

    /// Fill the backend credential from `OPENAI_API_KEY` when the file did not set one
    pub fn resolve_api_key(&mut self) {
        if self.gateway.api_key.is_some() {
            return;
        }

        match std::env::var(API_KEY_ENV) {
            Ok(key) if !key.is_empty() => self.gateway.api_key = Some(SecretString::from(key)),
            _ => tracing::warn!("{API_KEY_ENV} is not set, backend requests will be unauthenticated"),
        }
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if the approach is unknown or a strategy
    /// parameter is out of range
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_gateway()?;
        self.validate_strategies()?;
        Ok(())
    }

    fn validate_gateway(&self) -> anyhow::Result<()> {
        let gateway = &self.gateway;

        if !gateway.is_auto() && Approach::from_str(&gateway.approach).is_err() {
            anyhow::bail!("unknown approach '{}'", gateway.approach);
        }

        if gateway.model.is_empty() {
            anyhow::bail!("gateway.model must not be empty");
        }

        if gateway.n == 0 {
            anyhow::bail!("gateway.n must be greater than 0");
        }

        gateway.strategy_timeout()?;

        Ok(())
    }

    fn validate_strategies(&self) -> anyhow::Result<()> {
        let strategies = &self.strategies;

        let counts = [
            ("mcts.simulations", strategies.mcts.simulations),
            ("mcts.expansions", strategies.mcts.expansions),
            ("bon.best_of_n", strategies.bon.best_of_n),
            ("self_consistency.samples", strategies.self_consistency.samples),
            ("pvg.rounds", strategies.pvg.rounds),
            ("pvg.solutions", strategies.pvg.solutions),
            ("rstar.max_depth", strategies.rstar.max_depth),
            ("rstar.num_rollouts", strategies.rstar.num_rollouts),
            ("z3.attempts", strategies.z3.attempts),
        ];

        if let Some((name, _)) = counts.iter().find(|(_, value)| *value == 0) {
            anyhow::bail!("strategies.{name} must be greater than 0");
        }

        let weights = [
            ("mcts.exploration", strategies.mcts.exploration),
            ("rstar.c", strategies.rstar.c),
        ];

        if let Some((name, _)) = weights.iter().find(|(_, value)| !value.is_finite() || *value < 0.0) {
            anyhow::bail!("strategies.{name} must be a finite, non-negative number");
        }

        let threshold = strategies.self_consistency.similarity_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            anyhow::bail!("strategies.self_consistency.similarity_threshold must be between 0.0 and 1.0");
        }

        Ok(())
    }
}
