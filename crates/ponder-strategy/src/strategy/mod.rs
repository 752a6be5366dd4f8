//! Strategy interface and the startup-built registry of implementations

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use ponder_client::{Backend, ChatMessage};
use ponder_config::StrategyConfig;

use crate::error::StrategyError;

pub mod bon;
pub mod cot_reflection;
pub mod mcts;
pub mod moa;
pub mod plansearch;
pub mod pvg;
pub mod rstar;
pub mod rto;
pub mod self_consistency;
pub mod z3;

/// Normalized inputs handed to a strategy
#[derive(Debug, Clone, Copy)]
pub struct StrategyInput<'a> {
    /// Content of the first system message, empty when absent
    pub system_prompt: &'a str,
    /// Content of the first user message, empty when absent
    pub query: &'a str,
    /// Backend model identifier
    pub model: &'a str,
    /// Number of final responses the caller asked for
    pub n: u32,
}

impl StrategyInput<'_> {
    /// System prompt followed by the user query
    pub fn base_messages(&self) -> Vec<ChatMessage> {
        vec![ChatMessage::system(self.system_prompt), ChatMessage::user(self.query)]
    }

    /// System prompt with strategy instructions appended
    pub fn system_with(&self, instructions: &str) -> String {
        if self.system_prompt.is_empty() {
            instructions.to_owned()
        } else {
            format!("{}\n\n{instructions}", self.system_prompt)
        }
    }
}

/// One or many candidate completions, in the order the strategy ranks them
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyOutput {
    /// A single final answer
    Single(String),
    /// Several candidate answers
    Candidates(Vec<String>),
}

impl StrategyOutput {
    /// Flatten into an ordered list of candidates
    pub fn into_candidates(self) -> Vec<String> {
        match self {
            Self::Single(text) => vec![text],
            Self::Candidates(texts) => texts,
        }
    }

    /// Number of candidates carried
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Candidates(texts) => texts.len(),
        }
    }

    /// Whether no candidate is carried
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<String> for StrategyOutput {
    fn from(text: String) -> Self {
        Self::Single(text)
    }
}

impl From<Vec<String>> for StrategyOutput {
    fn from(texts: Vec<String>) -> Self {
        Self::Candidates(texts)
    }
}

/// Trait implemented by every inference-time compute strategy
///
/// A strategy owns its parameter group, so callers only supply the
/// per-request inputs and a backend.
#[async_trait]
pub trait Strategy: Send + Sync {
    /// Name the strategy is registered under
    fn name(&self) -> &str;

    /// Compute the answer for one request
    async fn run(&self, input: &StrategyInput<'_>, backend: &dyn Backend) -> Result<StrategyOutput, StrategyError>;
}

/// Index with the highest key; ties keep the earliest
///
/// `indices` must not be empty.
fn best_by(indices: &[usize], key: impl Fn(usize) -> f64) -> usize {
    let mut best = indices[0];
    let mut top = key(best);
    for &index in &indices[1..] {
        let value = key(index);
        if value > top {
            best = index;
            top = value;
        }
    }
    best
}

/// Registry of available strategies
///
/// Built once at startup and never modified afterwards, so it can be shared
/// across requests without locking.
#[derive(Default)]
pub struct StrategyRegistry {
    strategies: HashMap<String, Arc<dyn Strategy>>,
}

impl StrategyRegistry {
    /// Build from config with the built-in strategies
    ///
    /// Each strategy receives only its own parameter group.
    pub fn from_config(config: &StrategyConfig) -> Self {
        Self::default()
            .with(mcts::Mcts::new(config.mcts.clone()))
            .with(bon::BestOfN::new(config.bon.clone()))
            .with(moa::MixtureOfAgents)
            .with(rto::RoundTrip)
            .with(self_consistency::SelfConsistency::new(config.self_consistency.clone()))
            .with(pvg::ProverVerifier::new(config.pvg.clone()))
            .with(rstar::RStar::new(config.rstar.clone()))
            .with(cot_reflection::CotReflection::new(config.cot_reflection.clone()))
            .with(plansearch::PlanSearch)
            .with(z3::Z3Solver::new(config.z3.clone()))
    }

    /// Register a strategy under its own name, replacing any previous entry
    #[must_use]
    pub fn with(mut self, strategy: impl Strategy + 'static) -> Self {
        self.strategies.insert(strategy.name().to_owned(), Arc::new(strategy));
        self
    }

    /// Look up a strategy by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Strategy>> {
        self.strategies.get(name).map(Arc::clone)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.strategies.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered strategies
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Whether no strategy is registered
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl std::fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyRegistry").field("strategies", &self.names()).finish()
    }
}
