//! Chain of thought with reflection
//!
//! The model reasons inside `<thinking>`, checks itself inside
//! `<reflection>`, and answers inside `<output>`. Only the output section
//! is returned unless the full response is requested.

use async_trait::async_trait;
use ponder_client::{Backend, BackendRequest, ChatMessage};
use ponder_config::CotReflectionConfig;

use super::{Strategy, StrategyInput, StrategyOutput};
use crate::error::StrategyError;
use crate::text;

const NAME: &str = "cot_reflection";

const REFLECTION_INSTRUCTIONS: &str = "Answer using a chain of thought with reflection:
1. Work through the problem step by step inside <thinking></thinking> tags.
2. Inside <reflection></reflection> tags, check that reasoning for mistakes, gaps, or better approaches.
3. Adjust your reasoning based on the reflection.
4. Give the final, concise answer inside <output></output> tags.

The <thinking> and <reflection> sections are private scratch space. The <output> section must stand on its own \
and must not refer back to them.";

/// Chain-of-thought reflection strategy
pub struct CotReflection {
    config: CotReflectionConfig,
}

impl CotReflection {
    pub const fn new(config: CotReflectionConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Strategy for CotReflection {
    fn name(&self) -> &str {
        NAME
    }

    async fn run(&self, input: &StrategyInput<'_>, backend: &dyn Backend) -> Result<StrategyOutput, StrategyError> {
        let system = input.system_with(REFLECTION_INSTRUCTIONS);
        let request = BackendRequest::new(input.model, vec![ChatMessage::system(system), ChatMessage::user(input.query)])
            .with_temperature(0.7)
            .with_max_tokens(4096);

        let full = backend.complete(request).await?;

        if self.config.return_full_response {
            return Ok(StrategyOutput::Single(full));
        }

        let answer = if let Some(output) = text::extract_tag(&full, "output") {
            output.to_owned()
        } else {
            tracing::warn!("reply has no <output> section, returning it whole");
            full.trim().to_owned()
        };

        Ok(StrategyOutput::Single(answer))
    }
}
