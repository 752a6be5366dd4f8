//! rStar-style reasoning rollouts
//!
//! Searches over partial reasoning chains with UCT. Each rollout descends
//! to a leaf, proposes next reasoning steps there, completes the chain
//! from the first new step, and has the model rate the completed chain.
//! The extracted final answers are majority-voted; among chains reaching
//! the winning answer, the highest rated one is returned.

use std::collections::HashMap;

use async_trait::async_trait;
use ponder_client::{Backend, BackendRequest, ChatMessage};
use ponder_config::RStarConfig;

use super::{Strategy, StrategyInput, StrategyOutput, best_by};
use crate::error::StrategyError;
use crate::text;

const NAME: &str = "rstar";

/// Candidate next steps proposed per expansion
const BRANCHING: u32 = 3;

const REASONER: &str = "You solve problems by reasoning one step at a time. When you reach the result, \
    state it as \"The answer is <answer>\".";

const REWARD_PROMPT: &str = "Rate how likely this reasoning is to reach a correct answer on a scale from 0 to 10. \
    Reply with a single number only.";

#[derive(Debug)]
struct Step {
    /// Reasoning steps from the root to this node
    chain: Vec<String>,
    parent: Option<usize>,
    children: Vec<usize>,
    visits: u32,
    value: f64,
}

impl Step {
    const fn new(chain: Vec<String>, parent: Option<usize>) -> Self {
        Self {
            chain,
            parent,
            children: Vec::new(),
            visits: 0,
            value: 0.0,
        }
    }

    fn is_final(&self) -> bool {
        self.chain.last().is_some_and(|step| states_answer(step))
    }
}

/// A completed reasoning chain with its reward
#[derive(Debug)]
struct Rollout {
    reasoning: String,
    answer: String,
    reward: f64,
}

fn states_answer(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("the answer is") || lower.contains("the final answer is")
}

fn render_chain(chain: &[String]) -> String {
    chain
        .iter()
        .enumerate()
        .map(|(i, step)| format!("Step {}: {step}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Majority vote over normalized answers
///
/// Ties go to the answer with the larger total reward, then to the one
/// reached first. Returns the best rated rollout of the winning answer.
fn vote(rollouts: &[Rollout]) -> Option<&Rollout> {
    let mut tallies: HashMap<String, (usize, f64, usize)> = HashMap::new();
    for (order, rollout) in rollouts.iter().enumerate() {
        let entry = tallies
            .entry(rollout.answer.to_lowercase())
            .or_insert((0, 0.0, order));
        entry.0 += 1;
        entry.1 += rollout.reward;
    }

    let (winner, _) = tallies.into_iter().max_by(|(_, a), (_, b)| {
        a.0.cmp(&b.0)
            .then(a.1.total_cmp(&b.1))
            .then(b.2.cmp(&a.2))
    })?;

    rollouts
        .iter()
        .filter(|rollout| rollout.answer.to_lowercase() == winner)
        .fold(None, |best: Option<&Rollout>, rollout| match best {
            Some(top) if top.reward >= rollout.reward => Some(top),
            _ => Some(rollout),
        })
}

/// rStar strategy
pub struct RStar {
    config: RStarConfig,
}

impl RStar {
    pub const fn new(config: RStarConfig) -> Self {
        Self { config }
    }

    fn messages(input: &StrategyInput<'_>, prompt: String) -> Vec<ChatMessage> {
        vec![ChatMessage::system(input.system_with(REASONER)), ChatMessage::user(prompt)]
    }

    async fn propose(
        input: &StrategyInput<'_>,
        backend: &dyn Backend,
        chain: &[String],
    ) -> Result<Vec<String>, StrategyError> {
        let prompt = format!(
            "Problem:\n{}\n\nReasoning so far:\n{}\n\nWrite only the next reasoning step.",
            input.query,
            render_chain(chain)
        );
        let request = BackendRequest::new(input.model, Self::messages(input, prompt))
            .with_n(BRANCHING)
            .with_temperature(0.8)
            .with_max_tokens(512);

        Ok(backend.chat(request).await?.choices)
    }

    async fn complete_chain(
        input: &StrategyInput<'_>,
        backend: &dyn Backend,
        chain: &[String],
    ) -> Result<String, StrategyError> {
        let rendered = render_chain(chain);
        if chain.last().is_some_and(|step| states_answer(step)) {
            return Ok(rendered);
        }

        let prompt = format!(
            "Problem:\n{}\n\nReasoning so far:\n{rendered}\n\nContinue the reasoning to the end and finish with \
             \"The answer is <answer>\".",
            input.query
        );
        let request = BackendRequest::new(input.model, Self::messages(input, prompt))
            .with_temperature(0.2)
            .with_max_tokens(2048);

        let rest = backend.complete(request).await?;
        Ok(if rendered.is_empty() { rest } else { format!("{rendered}\n{rest}") })
    }

    async fn reward(input: &StrategyInput<'_>, backend: &dyn Backend, reasoning: &str) -> Result<f64, StrategyError> {
        let prompt = format!("Problem:\n{}\n\nReasoning:\n{reasoning}\n\n{REWARD_PROMPT}", input.query);
        let request = BackendRequest::new(input.model, Self::messages(input, prompt))
            .with_temperature(0.1)
            .with_max_tokens(16);

        let reply = backend.complete(request).await?;
        Ok(text::parse_score(&reply, 10.0) / 10.0)
    }

    fn uct(&self, tree: &[Step], index: usize) -> f64 {
        let node = &tree[index];
        if node.visits == 0 {
            return f64::INFINITY;
        }

        let parent_visits = node.parent.map_or(1, |p| tree[p].visits.max(1));
        let visits = f64::from(node.visits);
        node.value / visits + self.config.c * (f64::from(parent_visits).ln() / visits).sqrt()
    }
}

#[async_trait]
impl Strategy for RStar {
    fn name(&self) -> &str {
        NAME
    }

    async fn run(&self, input: &StrategyInput<'_>, backend: &dyn Backend) -> Result<StrategyOutput, StrategyError> {
        let max_depth = self.config.max_depth as usize;
        let mut tree = vec![Step::new(Vec::new(), None)];
        let mut rollouts = Vec::new();

        for rollout in 0..self.config.num_rollouts {
            let mut current = 0;
            while !tree[current].children.is_empty() && !tree[current].is_final() {
                current = best_by(&tree[current].children, |child| self.uct(&tree, child));
            }

            if !tree[current].is_final() && tree[current].chain.len() < max_depth {
                let steps = Self::propose(input, backend, &tree[current].chain).await?;
                for step in steps {
                    let mut chain = tree[current].chain.clone();
                    chain.push(step.trim().to_owned());
                    let index = tree.len();
                    tree.push(Step::new(chain, Some(current)));
                    tree[current].children.push(index);
                }
                if let Some(&first) = tree[current].children.first() {
                    current = first;
                }
            }

            let reasoning = Self::complete_chain(input, backend, &tree[current].chain).await?;
            let reward = Self::reward(input, backend, &reasoning).await?;

            let mut node = Some(current);
            while let Some(index) = node {
                tree[index].visits += 1;
                tree[index].value += reward;
                node = tree[index].parent;
            }

            if let Some(answer) = text::final_answer(&reasoning) {
                tracing::debug!(rollout, %answer, reward, "rstar rollout finished");
                rollouts.push(Rollout {
                    reasoning,
                    answer,
                    reward,
                });
            }
        }

        vote(&rollouts)
            .map(|best| StrategyOutput::Single(best.reasoning.clone()))
            .ok_or_else(|| StrategyError::no_candidates(NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::testing::ScriptedBackend;

    fn input() -> StrategyInput<'static> {
        StrategyInput {
            system_prompt: "",
            query: "What is 3 + 4?",
            model: "m",
            n: 1,
        }
    }

    fn rollout(answer: &str, reward: f64) -> Rollout {
        Rollout {
            reasoning: format!("The answer is {answer} ({reward})"),
            answer: answer.to_owned(),
            reward,
        }
    }

    #[test]
    fn vote_prefers_majority_then_reward() {
        let rollouts = vec![rollout("7", 0.2), rollout("9", 0.9), rollout("7", 0.6)];
        assert_eq!(vote(&rollouts).unwrap().reasoning, "The answer is 7 (0.6)");

        let tied = vec![rollout("7", 0.2), rollout("9", 0.9)];
        assert_eq!(vote(&tied).unwrap().answer, "9");

        assert!(vote(&[]).is_none());
    }

    #[test]
    fn detects_stated_answers() {
        assert!(states_answer("So the answer is 7."));
        assert!(!states_answer("First add 3 and 4."));
    }

    #[tokio::test]
    async fn majority_answer_wins() {
        let backend = ScriptedBackend::new(vec![
            // rollout 1: expand the root, complete the first step, reward it
            vec!["add them", "count up", "guess"],
            vec!["So the answer is 7"],
            vec!["6"],
            // rollout 2: the unvisited second step
            vec!["The answer is 9"],
            vec!["9"],
            // rollout 3: the unvisited third step
            vec!["Therefore the answer is 7."],
            vec!["2"],
        ]);
        let strategy = RStar::new(RStarConfig {
            max_depth: 1,
            num_rollouts: 3,
            c: 1.4,
        });

        let output = strategy.run(&input(), &backend).await.unwrap();
        assert_eq!(
            output,
            StrategyOutput::Single("Step 1: add them\nSo the answer is 7".to_owned())
        );
        assert_eq!(backend.call_count(), 7);
        assert_eq!(backend.requests()[0].n, BRANCHING);
    }

    #[tokio::test]
    async fn backend_failure_propagates() {
        let backend = ScriptedBackend::default();
        let strategy = RStar::new(RStarConfig::default());

        let error = strategy.run(&input(), &backend).await.unwrap_err();
        assert!(matches!(error, StrategyError::Backend(_)));
    }
}
