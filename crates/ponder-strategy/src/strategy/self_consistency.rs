//! Clustered self-consistency
//!
//! Independent samples are grouped by word-level similarity; the first
//! member of the largest group is returned. Each sample joins the first
//! existing cluster whose representative it resembles closely enough.

use async_trait::async_trait;
use ponder_client::{Backend, BackendRequest};
use ponder_config::SelfConsistencyConfig;

use super::{Strategy, StrategyInput, StrategyOutput};
use crate::error::StrategyError;
use crate::text;

const NAME: &str = "self_consistency";

/// Self-consistency strategy
pub struct SelfConsistency {
    config: SelfConsistencyConfig,
}

impl SelfConsistency {
    pub const fn new(config: SelfConsistencyConfig) -> Self {
        Self { config }
    }
}

/// Group samples into clusters of indices, in order of first appearance
fn cluster(samples: &[String], threshold: f64) -> Vec<Vec<usize>> {
    let mut clusters: Vec<Vec<usize>> = Vec::new();

    for (index, sample) in samples.iter().enumerate() {
        let home = clusters
            .iter_mut()
            .find(|members| text::similarity(&samples[members[0]], sample) >= threshold);

        match home {
            Some(members) => members.push(index),
            None => clusters.push(vec![index]),
        }
    }

    clusters
}

#[async_trait]
impl Strategy for SelfConsistency {
    fn name(&self) -> &str {
        NAME
    }

    async fn run(&self, input: &StrategyInput<'_>, backend: &dyn Backend) -> Result<StrategyOutput, StrategyError> {
        let request = BackendRequest::new(input.model, input.base_messages())
            .with_n(self.config.samples)
            .with_temperature(1.0)
            .with_max_tokens(4096);

        let mut samples = backend.chat(request).await?.choices;
        let clusters = cluster(&samples, self.config.similarity_threshold);

        // `max_by_key` keeps the last maximum, so walk in reverse to prefer the earliest cluster
        let winner = clusters
            .iter()
            .rev()
            .max_by_key(|members| members.len())
            .map(|members| members[0])
            .ok_or_else(|| StrategyError::no_candidates(NAME))?;

        tracing::debug!(
            samples = samples.len(),
            clusters = clusters.len(),
            "self-consistency clusters formed"
        );

        Ok(StrategyOutput::Single(samples.swap_remove(winner)))
    }
}
