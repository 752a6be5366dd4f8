//! Plan search
//!
//! Collects observations about the problem, derives further observations
//! from them, then writes one natural-language plan per requested
//! candidate and implements each plan. Returns every implementation in
//! plan order, so the caller receives `n` choices.

use async_trait::async_trait;
use futures_util::future::try_join_all;
use ponder_client::{Backend, BackendRequest, ChatMessage};

use super::{Strategy, StrategyInput, StrategyOutput};
use crate::error::StrategyError;
use crate::text;

const NAME: &str = "plansearch";

const OBSERVATION_ROLE: &str = "You are an expert problem solver. You point out non-obvious facts about a problem \
    that help find a solution. Do not solve the problem.";

/// Plan search strategy
pub struct PlanSearch;

impl PlanSearch {
    async fn ask(
        input: &StrategyInput<'_>,
        backend: &dyn Backend,
        role: &str,
        prompt: String,
        temperature: f64,
    ) -> Result<String, StrategyError> {
        let messages = vec![ChatMessage::system(input.system_with(role)), ChatMessage::user(prompt)];
        let request = BackendRequest::new(input.model, messages)
            .with_temperature(temperature)
            .with_max_tokens(4096);

        Ok(backend.complete(request).await?)
    }

    async fn observations(input: &StrategyInput<'_>, backend: &dyn Backend) -> Result<Vec<String>, StrategyError> {
        let prompt = format!(
            "Problem:\n{}\n\nList up to 3 useful, non-obvious observations about this problem as a numbered list.",
            input.query
        );
        let reply = Self::ask(input, backend, OBSERVATION_ROLE, prompt, 0.7).await?;
        Ok(text::numbered_items(&reply))
    }

    async fn derived_observations(
        input: &StrategyInput<'_>,
        backend: &dyn Backend,
        observations: &[String],
    ) -> Result<Vec<String>, StrategyError> {
        let prompt = format!(
            "Problem:\n{}\n\nExisting observations:\n{}\n\nCombine these into up to 2 new observations that follow \
             from them, as a numbered list.",
            input.query,
            numbered(observations)
        );
        let reply = Self::ask(input, backend, OBSERVATION_ROLE, prompt, 0.7).await?;
        Ok(text::numbered_items(&reply))
    }

    async fn plan(
        input: &StrategyInput<'_>,
        backend: &dyn Backend,
        observations: &str,
        attempt: u32,
    ) -> Result<String, StrategyError> {
        let prompt = format!(
            "Problem:\n{}\n\nObservations:\n{observations}\n\nUsing these observations, describe step by step in \
             plain language how to solve the problem. This is attempt {}; prefer an approach that differs from \
             the obvious one. Do not write code.",
            input.query,
            attempt + 1
        );
        Self::ask(input, backend, "You plan solutions before writing them.", prompt, 0.9).await
    }

    async fn implement(input: &StrategyInput<'_>, backend: &dyn Backend, plan: &str) -> Result<String, StrategyError> {
        let prompt = format!(
            "Problem:\n{}\n\nPlan:\n{plan}\n\nWrite the complete solution that follows this plan.",
            input.query
        );
        Self::ask(input, backend, "You carefully implement a given plan.", prompt, 0.3).await
    }
}

fn numbered(items: &[String]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {item}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl Strategy for PlanSearch {
    fn name(&self) -> &str {
        NAME
    }

    async fn run(&self, input: &StrategyInput<'_>, backend: &dyn Backend) -> Result<StrategyOutput, StrategyError> {
        let mut observations = Self::observations(input, backend).await?;
        let derived = Self::derived_observations(input, backend, &observations).await?;
        observations.extend(derived);

        let listed = numbered(&observations);
        let plans = try_join_all((0..input.n.max(1)).map(|attempt| Self::plan(input, backend, &listed, attempt))).await?;
        let solutions = try_join_all(plans.iter().map(|plan| Self::implement(input, backend, plan))).await?;

        tracing::debug!(
            observations = observations.len(),
            candidates = solutions.len(),
            "plan search finished"
        );

        Ok(StrategyOutput::Candidates(solutions))
    }
}
