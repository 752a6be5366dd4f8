//! Approach selection, default model, and backend endpoint settings

use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;
use strum::VariantNames;
use url::Url;

/// Sentinel approach that reads the strategy name from the request's model field
pub const AUTO_APPROACH: &str = "auto";

/// Model used when neither the request nor the configuration names one
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Environment variable holding the backend API credential
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Built-in inference strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::VariantNames, strum::EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Approach {
    /// Monte Carlo tree search over dialogue states
    Mcts,
    /// Best-of-n sampling with model-assigned ratings
    Bon,
    /// Mixture of agents
    Moa,
    /// Round-trip optimization
    Rto,
    /// SMT encoding checked by the Z3 solver
    Z3,
    /// Clustered self-consistency voting
    SelfConsistency,
    /// Prover-verifier game
    Pvg,
    /// rStar-style reasoning rollouts
    Rstar,
    /// Chain of thought with reflection tags
    CotReflection,
    /// Observation-driven plan search
    Plansearch,
}

/// Values accepted for `approach`: `auto` followed by every built-in strategy
pub fn approach_choices() -> Vec<&'static str> {
    std::iter::once(AUTO_APPROACH)
        .chain(Approach::VARIANTS.iter().copied())
        .collect()
}

/// Approach selection, default model, and backend endpoint
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Strategy name, or `auto` to derive it from the request's model field
    #[serde(default = "default_approach")]
    pub approach: String,
    /// Model used when a request omits one
    #[serde(default = "default_model")]
    pub model: String,
    /// `OpenAI`-compatible endpoint override
    #[serde(default)]
    pub base_url: Option<Url>,
    /// Number of final responses when a request omits `n`
    #[serde(default = "default_n")]
    pub n: u32,
    /// Upper bound on a single strategy invocation (e.g. "120s", "5m")
    #[serde(default)]
    pub strategy_timeout: Option<String>,
    /// Backend credential, falls back to `OPENAI_API_KEY` when absent
    #[serde(default)]
    pub api_key: Option<SecretString>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            approach: default_approach(),
            model: default_model(),
            base_url: None,
            n: default_n(),
            strategy_timeout: None,
            api_key: None,
        }
    }
}

impl GatewayConfig {
    /// Whether the strategy name is read from each request's model field
    pub fn is_auto(&self) -> bool {
        self.approach == AUTO_APPROACH
    }

    /// Parsed strategy timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the configured duration string is not parseable
    pub fn strategy_timeout(&self) -> anyhow::Result<Option<Duration>> {
        self.strategy_timeout
            .as_deref()
            .map(|raw| {
                duration_str::parse(raw).map_err(|e| anyhow::anyhow!("invalid strategy_timeout '{raw}': {e}"))
            })
            .transpose()
    }
}

fn default_approach() -> String {
    AUTO_APPROACH.to_owned()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_owned()
}

#[allow(clippy::missing_const_for_fn)]
fn default_n() -> u32 {
    1
}
