//! Decides which strategy and which backend model serve a request

use ponder_config::GatewayConfig;

use crate::error::GatewayError;

/// Strategy name and backend model chosen for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInvocation {
    pub strategy_name: String,
    pub model: String,
    /// Whether the strategy name came from configuration rather than the model field
    pub configured: bool,
}

impl ResolvedInvocation {
    /// Resolve against the configured approach
    ///
    /// In auto mode the model field is split on its first `-`: the left part
    /// names the strategy and the rest, hyphens included, is the model.
    /// Otherwise the configured approach is used and the model passes
    /// through verbatim.
    pub fn resolve(config: &GatewayConfig, model: &str) -> Result<Self, GatewayError> {
        if !config.is_auto() {
            return Ok(Self {
                strategy_name: config.approach.clone(),
                model: model.to_owned(),
                configured: true,
            });
        }

        let (strategy_name, model) = model.split_once('-').ok_or_else(|| GatewayError::MalformedModelField {
            model: model.to_owned(),
        })?;

        Ok(Self {
            strategy_name: strategy_name.to_owned(),
            model: model.to_owned(),
            configured: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(approach: &str) -> GatewayConfig {
        GatewayConfig {
            approach: approach.to_owned(),
            ..GatewayConfig::default()
        }
    }

    #[test]
    fn configured_approach_passes_model_through() {
        let resolved = ResolvedInvocation::resolve(&config("bon"), "mcts-gpt-4o-mini").unwrap();
        assert_eq!(resolved.strategy_name, "bon");
        assert_eq!(resolved.model, "mcts-gpt-4o-mini");
        assert!(resolved.configured);
    }

    #[test]
    fn auto_splits_on_first_hyphen() {
        let resolved = ResolvedInvocation::resolve(&config("auto"), "mcts-gpt-4o-mini").unwrap();
        assert_eq!(resolved.strategy_name, "mcts");
        assert_eq!(resolved.model, "gpt-4o-mini");
        assert!(!resolved.configured);
    }

    #[test]
    fn auto_without_hyphen_is_malformed() {
        let error = ResolvedInvocation::resolve(&config("auto"), "gpt4").unwrap_err();
        assert!(matches!(error, GatewayError::MalformedModelField { model } if model == "gpt4"));
    }

    #[test]
    fn auto_keeps_empty_halves() {
        let resolved = ResolvedInvocation::resolve(&config("auto"), "bon-").unwrap();
        assert_eq!(resolved.strategy_name, "bon");
        assert_eq!(resolved.model, "");
    }
}
