use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use clap::builder::PossibleValuesParser;
use ponder_config::{Config, approach_choices};
use url::Url;

/// Config file read when `--config` is not given and the file exists
pub const DEFAULT_CONFIG_PATH: &str = "ponder.toml";

/// Ponder inference gateway
///
/// Flags override the matching fields of the config file.
#[derive(Debug, Parser)]
#[command(name = "ponder", about = "OpenAI-compatible gateway running inference-time compute strategies")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "PONDER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the listen address
    #[arg(long, env = "PONDER_LISTEN")]
    pub listen: Option<SocketAddr>,

    /// Inference approach, or `auto` to read it from the model field
    #[arg(long, env = "PONDER_APPROACH", value_parser = PossibleValuesParser::new(approach_choices()))]
    pub approach: Option<String>,

    /// Model used when a request omits one
    #[arg(long, env = "PONDER_MODEL")]
    pub model: Option<String>,

    /// Base URL of an `OpenAI`-compatible endpoint
    #[arg(long, env = "PONDER_BASE_URL")]
    pub base_url: Option<Url>,

    /// Number of final responses when a request omits `n`
    #[arg(long, env = "PONDER_N")]
    pub n: Option<u32>,

    /// Upper bound on one strategy invocation (e.g. "120s")
    #[arg(long, env = "PONDER_STRATEGY_TIMEOUT")]
    pub strategy_timeout: Option<String>,

    /// Number of MCTS simulations
    #[arg(long, env = "PONDER_SIMULATIONS")]
    pub simulations: Option<u32>,

    /// Exploration weight for MCTS
    #[arg(long, env = "PONDER_EXPLORATION")]
    pub exploration: Option<f64>,

    /// Simulation depth for MCTS
    #[arg(long, env = "PONDER_DEPTH")]
    pub depth: Option<u32>,

    /// Number of samples for best-of-n
    #[arg(long, env = "PONDER_BEST_OF_N")]
    pub best_of_n: Option<u32>,

    /// Maximum reasoning depth for rStar
    #[arg(long, env = "PONDER_RSTAR_MAX_DEPTH")]
    pub rstar_max_depth: Option<u32>,

    /// Number of rollouts for rStar
    #[arg(long, env = "PONDER_RSTAR_NUM_ROLLOUTS")]
    pub rstar_num_rollouts: Option<u32>,

    /// Exploration constant for rStar
    #[arg(long, env = "PONDER_RSTAR_C")]
    pub rstar_c: Option<f64>,

    /// Return the full chain-of-thought reply including `<thinking>` sections
    #[arg(long, env = "PONDER_RETURN_FULL_RESPONSE")]
    pub return_full_response: bool,

    /// Log filter directive
    #[arg(long, default_value = "info", env = "PONDER_LOG")]
    pub log: String,
}

impl Args {
    /// Config file to read, if any
    ///
    /// An explicit path must exist; the default path is optional.
    pub fn config_path(&self) -> Option<PathBuf> {
        match &self.config {
            Some(path) => Some(path.clone()),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_PATH);
                default.exists().then_some(default)
            }
        }
    }

    /// Load the config file (or defaults) and apply flag overrides
    pub fn load_config(&self) -> anyhow::Result<Config> {
        let mut config = match self.config_path() {
            Some(path) => Config::load(&path)?,
            None => Config::default(),
        };

        self.apply(&mut config);
        Ok(config)
    }

    /// Override config fields with the flags that were given
    pub fn apply(&self, config: &mut Config) {
        if let Some(listen) = self.listen {
            config.server.listen_address = Some(listen);
        }

        let gateway = &mut config.gateway;
        override_with(&mut gateway.approach, self.approach.clone());
        override_with(&mut gateway.model, self.model.clone());
        override_with(&mut gateway.n, self.n);
        if self.base_url.is_some() {
            gateway.base_url.clone_from(&self.base_url);
        }
        if self.strategy_timeout.is_some() {
            gateway.strategy_timeout.clone_from(&self.strategy_timeout);
        }

        let strategies = &mut config.strategies;
        override_with(&mut strategies.mcts.simulations, self.simulations);
        override_with(&mut strategies.mcts.exploration, self.exploration);
        override_with(&mut strategies.mcts.depth, self.depth);
        override_with(&mut strategies.bon.best_of_n, self.best_of_n);
        override_with(&mut strategies.rstar.max_depth, self.rstar_max_depth);
        override_with(&mut strategies.rstar.num_rollouts, self.rstar_num_rollouts);
        override_with(&mut strategies.rstar.c, self.rstar_c);

        if self.return_full_response {
            strategies.cot_reflection.return_full_response = true;
        }
    }
}

fn override_with<T>(field: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *field = value;
    }
}
