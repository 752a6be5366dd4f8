//! Builds the `OpenAI`-compatible response from a strategy's output

use std::time::{SystemTime, UNIX_EPOCH};

use ponder_strategy::StrategyOutput;

use crate::protocol::{AssistantMessage, ChatCompletionResponse, Choice};

const FINISH_REASON: &str = "stop";

/// Expand a strategy output into ordered choices
///
/// A single answer becomes choice 0; candidates keep the order the
/// strategy returned them in.
pub fn assemble(model: &str, output: StrategyOutput) -> ChatCompletionResponse {
    let choices = output
        .into_candidates()
        .into_iter()
        .zip(0u32..)
        .map(|(content, index)| Choice {
            index,
            message: AssistantMessage {
                role: "assistant".to_owned(),
                content,
            },
            finish_reason: FINISH_REASON.to_owned(),
        })
        .collect();

    ChatCompletionResponse {
        id: format!("chatcmpl-{}", uuid::Uuid::new_v4()),
        object: "chat.completion".to_owned(),
        created: unix_now(),
        model: model.to_owned(),
        choices,
    }
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_answer_is_choice_zero() {
        let response = assemble("gpt-4o-mini", StrategyOutput::Single("answer".to_owned()));

        assert_eq!(response.model, "gpt-4o-mini");
        assert_eq!(response.object, "chat.completion");
        assert!(response.id.starts_with("chatcmpl-"));
        assert_eq!(response.choices.len(), 1);

        let choice = &response.choices[0];
        assert_eq!(choice.index, 0);
        assert_eq!(choice.message.role, "assistant");
        assert_eq!(choice.message.content, "answer");
        assert_eq!(choice.finish_reason, "stop");
    }

    #[test]
    fn candidates_keep_their_order() {
        let output = StrategyOutput::Candidates(vec!["a".to_owned(), "b".to_owned(), "c".to_owned()]);
        let response = assemble("m", output);

        let indices: Vec<u32> = response.choices.iter().map(|c| c.index).collect();
        let contents: Vec<&str> = response.choices.iter().map(|c| c.message.content.as_str()).collect();

        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(contents, vec!["a", "b", "c"]);
        assert!(response.choices.iter().all(|c| c.finish_reason == "stop"));
    }

    #[test]
    fn empty_candidates_yield_no_choices() {
        let response = assemble("m", StrategyOutput::Candidates(Vec::new()));
        assert!(response.choices.is_empty());
    }
}
