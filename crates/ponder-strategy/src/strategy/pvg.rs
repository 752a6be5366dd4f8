//! Prover-verifier game
//!
//! Each round a helpful prover and a sneaky prover (one that hides subtle
//! mistakes) each write several solutions. A verifier scores every
//! solution against the original problem, and between rounds the query is
//! refined using the best solution so far. The best-scored solution of all
//! rounds wins; ties keep the earliest.

use async_trait::async_trait;
use futures_util::future::{try_join, try_join_all};
use ponder_client::{Backend, BackendRequest, ChatMessage};
use ponder_config::PvgConfig;

use super::{Strategy, StrategyInput, StrategyOutput};
use crate::error::StrategyError;
use crate::text;

const NAME: &str = "pvg";

const HELPFUL_PROVER: &str = "You are a helpful prover. Solve the problem correctly and explain each step clearly \
    so that a verifier can check your work.";

const SNEAKY_PROVER: &str = "You are a sneaky prover. Write a solution that looks convincing but contains a subtle \
    error that is hard to spot. Do not reveal the error.";

const VERIFIER: &str = "You are a careful verifier. Check the solution below for correctness and clarity, \
    then reply with a single score from 0 to 10, where 0 is wrong and 10 is fully correct.";

const REFINE_PROMPT: &str = "Using the problem and the best solution so far, rewrite the problem so that it is \
    clearer and more specific. Reply with the rewritten problem only.";

/// Prover-verifier game strategy
pub struct ProverVerifier {
    config: PvgConfig,
}

impl ProverVerifier {
    pub const fn new(config: PvgConfig) -> Self {
        Self { config }
    }

    async fn prove(
        &self,
        input: &StrategyInput<'_>,
        backend: &dyn Backend,
        query: &str,
        role: &str,
    ) -> Result<Vec<String>, StrategyError> {
        let messages = vec![ChatMessage::system(input.system_with(role)), ChatMessage::user(query)];
        let request = BackendRequest::new(input.model, messages)
            .with_n(self.config.solutions)
            .with_temperature(0.7)
            .with_max_tokens(4096);

        Ok(backend.chat(request).await?.choices)
    }

    async fn verify(input: &StrategyInput<'_>, backend: &dyn Backend, solution: &str) -> Result<f64, StrategyError> {
        let messages = vec![
            ChatMessage::system(VERIFIER),
            ChatMessage::user(format!("Problem:\n{}\n\nSolution:\n{solution}", input.query)),
        ];
        let request = BackendRequest::new(input.model, messages)
            .with_temperature(0.2)
            .with_max_tokens(16);

        let reply = backend.complete(request).await?;
        Ok(text::parse_score(&reply, 10.0))
    }

    async fn refine(
        input: &StrategyInput<'_>,
        backend: &dyn Backend,
        query: &str,
        best: &str,
    ) -> Result<String, StrategyError> {
        let messages = vec![
            ChatMessage::system(input.system_prompt),
            ChatMessage::user(format!("Problem:\n{query}\n\nBest solution so far:\n{best}\n\n{REFINE_PROMPT}")),
        ];
        let request = BackendRequest::new(input.model, messages)
            .with_temperature(0.5)
            .with_max_tokens(1024);

        let refined = backend.complete(request).await?;
        let refined = refined.trim();

        Ok(if refined.is_empty() { query.to_owned() } else { refined.to_owned() })
    }
}

#[async_trait]
impl Strategy for ProverVerifier {
    fn name(&self) -> &str {
        NAME
    }

    async fn run(&self, input: &StrategyInput<'_>, backend: &dyn Backend) -> Result<StrategyOutput, StrategyError> {
        let mut query = input.query.to_owned();
        let mut best: Option<(String, f64)> = None;

        for round in 0..self.config.rounds {
            let (helpful, sneaky) = try_join(
                self.prove(input, backend, &query, HELPFUL_PROVER),
                self.prove(input, backend, &query, SNEAKY_PROVER),
            )
            .await?;

            let solutions: Vec<String> = helpful.into_iter().chain(sneaky).collect();
            let scores = try_join_all(solutions.iter().map(|solution| Self::verify(input, backend, solution))).await?;

            tracing::debug!(round, ?scores, "prover-verifier round scored");

            for (solution, score) in solutions.into_iter().zip(scores) {
                if best.as_ref().is_none_or(|(_, top)| score > *top) {
                    best = Some((solution, score));
                }
            }

            if round + 1 < self.config.rounds
                && let Some((solution, _)) = &best
            {
                query = Self::refine(input, backend, &query, solution).await?;
            }
        }

        best.map(|(solution, _)| StrategyOutput::Single(solution))
            .ok_or_else(|| StrategyError::no_candidates(NAME))
    }
}
