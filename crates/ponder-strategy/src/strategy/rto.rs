//! Round-trip optimization
//!
//! The first answer is turned back into an instruction, the instruction is
//! answered again, and the two answers are compared. Matching code is
//! returned as is; otherwise the model reconciles both versions.

use async_trait::async_trait;
use ponder_client::{Backend, BackendRequest, ChatMessage};

use super::{Strategy, StrategyInput, StrategyOutput};
use crate::error::StrategyError;
use crate::text;

const NAME: &str = "rto";

const SUMMARIZE_PROMPT: &str = "Describe the response you just wrote as a single instruction, detailed enough \
    that following the instruction would reproduce the same response.";

/// Round-trip optimization strategy
pub struct RoundTrip;

async fn answer(input: &StrategyInput<'_>, backend: &dyn Backend, messages: Vec<ChatMessage>) -> Result<String, StrategyError> {
    let request = BackendRequest::new(input.model, messages)
        .with_temperature(0.1)
        .with_max_tokens(4096);
    Ok(backend.complete(request).await?)
}

#[async_trait]
impl Strategy for RoundTrip {
    fn name(&self) -> &str {
        NAME
    }

    async fn run(&self, input: &StrategyInput<'_>, backend: &dyn Backend) -> Result<StrategyOutput, StrategyError> {
        let first = answer(input, backend, input.base_messages()).await?;

        let mut summarize = input.base_messages();
        summarize.push(ChatMessage::assistant(first.clone()));
        summarize.push(ChatMessage::user(SUMMARIZE_PROMPT));
        let instruction = answer(input, backend, summarize).await?;

        let second = answer(
            input,
            backend,
            vec![ChatMessage::system(input.system_prompt), ChatMessage::user(instruction)],
        )
        .await?;

        if text::extract_code(&first) == text::extract_code(&second) {
            tracing::debug!("round trip converged");
            return Ok(StrategyOutput::Single(first));
        }

        let reconcile = format!(
            "Initial query: {query}\n\n\
             First version:\n{first}\n\n\
             Second version:\n{second}\n\n\
             Both versions were written for the initial query. Combine their strengths into one final, \
             corrected version. Reply with the final version only.",
            query = input.query,
        );

        let merged = answer(
            input,
            backend,
            vec![ChatMessage::system(input.system_prompt), ChatMessage::user(reconcile)],
        )
        .await?;

        Ok(StrategyOutput::Single(merged))
    }
}
