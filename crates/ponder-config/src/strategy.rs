//! Per-strategy parameter groups

use serde::Deserialize;

/// Parameter groups for the built-in strategies
///
/// Each group is handed to its strategy when the registry is built; a
/// strategy never sees another strategy's parameters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StrategyConfig {
    #[serde(default)]
    pub mcts: MctsConfig,
    #[serde(default)]
    pub bon: BestOfNConfig,
    #[serde(default)]
    pub self_consistency: SelfConsistencyConfig,
    #[serde(default)]
    pub pvg: PvgConfig,
    #[serde(default)]
    pub rstar: RStarConfig,
    #[serde(default)]
    pub cot_reflection: CotReflectionConfig,
    #[serde(default)]
    pub z3: Z3Config,
}

/// Monte Carlo tree search over dialogue states
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MctsConfig {
    /// Number of select/expand/simulate/backpropagate iterations
    #[serde(default = "default_mcts_simulations")]
    pub simulations: u32,
    /// UCT exploration weight
    #[serde(default = "default_mcts_exploration")]
    pub exploration: f64,
    /// Simulated conversation turns per rollout
    #[serde(default = "default_mcts_depth")]
    pub depth: u32,
    /// Candidate replies generated when a node is expanded
    #[serde(default = "default_mcts_expansions")]
    pub expansions: u32,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            simulations: default_mcts_simulations(),
            exploration: default_mcts_exploration(),
            depth: default_mcts_depth(),
            expansions: default_mcts_expansions(),
        }
    }
}

/// Best-of-n sampling
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BestOfNConfig {
    /// Number of samples to rate
    #[serde(default = "default_best_of_n")]
    pub best_of_n: u32,
}

impl Default for BestOfNConfig {
    fn default() -> Self {
        Self {
            best_of_n: default_best_of_n(),
        }
    }
}

/// Clustered self-consistency
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SelfConsistencyConfig {
    /// Number of independent samples
    #[serde(default = "default_sc_samples")]
    pub samples: u32,
    /// Minimum similarity ratio (0.0 to 1.0) for two answers to share a cluster
    #[serde(default = "default_sc_threshold")]
    pub similarity_threshold: f64,
}

impl Default for SelfConsistencyConfig {
    fn default() -> Self {
        Self {
            samples: default_sc_samples(),
            similarity_threshold: default_sc_threshold(),
        }
    }
}

/// Prover-verifier game
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PvgConfig {
    /// Refinement rounds
    #[serde(default = "default_pvg_rounds")]
    pub rounds: u32,
    /// Solutions generated per prover role per round
    #[serde(default = "default_pvg_solutions")]
    pub solutions: u32,
}

impl Default for PvgConfig {
    fn default() -> Self {
        Self {
            rounds: default_pvg_rounds(),
            solutions: default_pvg_solutions(),
        }
    }
}

/// rStar-style reasoning rollouts
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RStarConfig {
    /// Maximum reasoning steps per rollout
    #[serde(default = "default_rstar_max_depth")]
    pub max_depth: u32,
    /// Number of rollouts
    #[serde(default = "default_rstar_num_rollouts")]
    pub num_rollouts: u32,
    /// UCT exploration constant
    #[serde(default = "default_rstar_c")]
    pub c: f64,
}

impl Default for RStarConfig {
    fn default() -> Self {
        Self {
            max_depth: default_rstar_max_depth(),
            num_rollouts: default_rstar_num_rollouts(),
            c: default_rstar_c(),
        }
    }
}

/// Chain of thought with reflection
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CotReflectionConfig {
    /// Return the whole tagged reasoning instead of only the `<output>` section
    #[serde(default)]
    pub return_full_response: bool,
}

/// SMT encoding checked by the Z3 solver
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Z3Config {
    /// Encoding attempts before answering without the solver
    #[serde(default = "default_z3_attempts")]
    pub attempts: u32,
    /// Solver time limit per check, in milliseconds
    #[serde(default = "default_z3_solver_timeout_ms")]
    pub solver_timeout_ms: u64,
}

impl Default for Z3Config {
    fn default() -> Self {
        Self {
            attempts: default_z3_attempts(),
            solver_timeout_ms: default_z3_solver_timeout_ms(),
        }
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_mcts_simulations() -> u32 {
    2
}
#[allow(clippy::missing_const_for_fn)]
fn default_mcts_exploration() -> f64 {
    0.2
}
#[allow(clippy::missing_const_for_fn)]
fn default_mcts_depth() -> u32 {
    1
}
#[allow(clippy::missing_const_for_fn)]
fn default_mcts_expansions() -> u32 {
    3
}
#[allow(clippy::missing_const_for_fn)]
fn default_best_of_n() -> u32 {
    3
}
#[allow(clippy::missing_const_for_fn)]
fn default_sc_samples() -> u32 {
    5
}
#[allow(clippy::missing_const_for_fn)]
fn default_sc_threshold() -> f64 {
    0.8
}
#[allow(clippy::missing_const_for_fn)]
fn default_pvg_rounds() -> u32 {
    2
}
#[allow(clippy::missing_const_for_fn)]
fn default_pvg_solutions() -> u32 {
    3
}
#[allow(clippy::missing_const_for_fn)]
fn default_rstar_max_depth() -> u32 {
    3
}
#[allow(clippy::missing_const_for_fn)]
fn default_rstar_num_rollouts() -> u32 {
    5
}
#[allow(clippy::missing_const_for_fn)]
fn default_rstar_c() -> f64 {
    1.4
}
#[allow(clippy::missing_const_for_fn)]
fn default_z3_attempts() -> u32 {
    3
}
#[allow(clippy::missing_const_for_fn)]
fn default_z3_solver_timeout_ms() -> u64 {
    10_000
}
