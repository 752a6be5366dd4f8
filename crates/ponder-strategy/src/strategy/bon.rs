//! Best-of-n sampling
//!
//! Samples several answers in one backend call, asks the model to rate
//! each on a 0-10 scale, and returns the highest rated answer. Ratings
//! run concurrently; ties keep the earliest sample.

use async_trait::async_trait;
use futures_util::future::try_join_all;
use ponder_client::{Backend, BackendRequest, ChatMessage};
use ponder_config::BestOfNConfig;

use super::{Strategy, StrategyInput, StrategyOutput};
use crate::error::StrategyError;
use crate::text;

const NAME: &str = "bon";

const RATING_PROMPT: &str = "Rate the response above on a scale from 0 to 10, where 0 is unusable and 10 is \
    excellent. Judge relevance, correctness, coherence, and helpfulness. Reply with a single number only.";

/// Best-of-n strategy
pub struct BestOfN {
    config: BestOfNConfig,
}

impl BestOfN {
    pub const fn new(config: BestOfNConfig) -> Self {
        Self { config }
    }

    async fn rate(input: &StrategyInput<'_>, backend: &dyn Backend, answer: &str) -> Result<f64, StrategyError> {
        let mut messages = input.base_messages();
        messages.push(ChatMessage::assistant(answer));
        messages.push(ChatMessage::user(RATING_PROMPT));

        let request = BackendRequest::new(input.model, messages)
            .with_temperature(0.1)
            .with_max_tokens(16);

        let reply = backend.complete(request).await?;
        Ok(text::parse_score(&reply, 10.0))
    }
}

#[async_trait]
impl Strategy for BestOfN {
    fn name(&self) -> &str {
        NAME
    }

    async fn run(&self, input: &StrategyInput<'_>, backend: &dyn Backend) -> Result<StrategyOutput, StrategyError> {
        let request = BackendRequest::new(input.model, input.base_messages())
            .with_n(self.config.best_of_n)
            .with_temperature(1.0)
            .with_max_tokens(4096);

        let samples = backend.chat(request).await?.choices;

        let ratings = try_join_all(samples.iter().map(|answer| Self::rate(input, backend, answer))).await?;

        tracing::debug!(samples = samples.len(), ?ratings, "best-of-n ratings collected");

        let best = ratings
            .iter()
            .enumerate()
            .fold(None::<(usize, f64)>, |best, (index, &rating)| match best {
                Some((_, top)) if top >= rating => best,
                _ => Some((index, rating)),
            })
            .map(|(index, _)| index)
            .ok_or_else(|| StrategyError::no_candidates(NAME))?;

        Ok(StrategyOutput::Single(samples[best].clone()))
    }
}
