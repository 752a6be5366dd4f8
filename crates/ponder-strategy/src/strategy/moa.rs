//! Mixture of agents
//!
//! Three high-temperature drafts are critiqued side by side, then a final
//! pass synthesizes one answer from the drafts and the critique.

use std::fmt::Write;

use async_trait::async_trait;
use ponder_client::{Backend, BackendRequest, ChatMessage};

use super::{Strategy, StrategyInput, StrategyOutput};
use crate::error::StrategyError;

const NAME: &str = "moa";

const DRAFTS: u32 = 3;

/// Mixture-of-agents strategy
pub struct MixtureOfAgents;

fn numbered_candidates(drafts: &[String]) -> String {
    drafts.iter().enumerate().fold(String::new(), |mut out, (i, draft)| {
        let _ = write!(out, "Candidate {}:\n{draft}\n\n", i + 1);
        out
    })
}

#[async_trait]
impl Strategy for MixtureOfAgents {
    fn name(&self) -> &str {
        NAME
    }

    async fn run(&self, input: &StrategyInput<'_>, backend: &dyn Backend) -> Result<StrategyOutput, StrategyError> {
        let request = BackendRequest::new(input.model, input.base_messages())
            .with_n(DRAFTS)
            .with_temperature(1.0)
            .with_max_tokens(4096);

        let drafts = backend.chat(request).await?.choices;
        let candidates = numbered_candidates(&drafts);

        let critique_prompt = format!(
            "Original query: {query}\n\n\
             Here are {count} candidate responses to the query above.\n\n\
             {candidates}\
             Critique each candidate. Point out strengths, weaknesses, factual errors, and anything missing.",
            query = input.query,
            count = drafts.len(),
        );

        let critique = backend
            .complete(
                BackendRequest::new(
                    input.model,
                    vec![ChatMessage::system(input.system_prompt), ChatMessage::user(critique_prompt)],
                )
                .with_temperature(0.1)
                .with_max_tokens(1024),
            )
            .await?;

        let synthesis_prompt = format!(
            "Original query: {query}\n\n\
             Candidate responses:\n\n{candidates}\
             Critique of the candidates:\n{critique}\n\n\
             Using the candidates and the critique, write the single best final response to the original query. \
             Reply with the final response only.",
            query = input.query,
        );

        let final_response = backend
            .complete(
                BackendRequest::new(
                    input.model,
                    vec![ChatMessage::system(input.system_prompt), ChatMessage::user(synthesis_prompt)],
                )
                .with_temperature(0.1)
                .with_max_tokens(8192),
            )
            .await?;

        Ok(StrategyOutput::Single(final_response))
    }
}
