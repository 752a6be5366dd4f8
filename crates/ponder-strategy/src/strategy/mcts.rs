//! Monte Carlo tree search over dialogue states
//!
//! Nodes hold a conversation; expanding a node samples candidate assistant
//! replies and predicts how the user would answer each. Simulations play
//! the dialogue forward from a random child, the model scores the result,
//! and the score is back-propagated to the root. The reply leading to the
//! most visited child of the root is returned.

use async_trait::async_trait;
use futures_util::future::try_join_all;
use ponder_client::{Backend, BackendRequest, ChatMessage};
use ponder_config::MctsConfig;
use rand::Rng;

use super::{Strategy, StrategyInput, StrategyOutput, best_by};
use crate::error::StrategyError;
use crate::text;

const NAME: &str = "mcts";

/// Dialogues longer than this are not expanded further
const MAX_DIALOGUE_LEN: usize = 10;

const PREDICT_PROMPT: &str = "Predict the user's next message in this conversation. Reply with that message only.";

const EVALUATE_PROMPT: &str = "Rate the quality of this conversation so far on a scale from 0 to 10, judging how \
    well the assistant helped the user. Reply with a single number only.";

/// A node in the search tree
#[derive(Debug)]
struct Node {
    /// Conversation at this state
    messages: Vec<ChatMessage>,
    /// Assistant reply that led here from the parent
    reply: Option<String>,
    parent: Option<usize>,
    children: Vec<usize>,
    visits: u32,
    value: f64,
}

impl Node {
    const fn new(messages: Vec<ChatMessage>, reply: Option<String>, parent: Option<usize>) -> Self {
        Self {
            messages,
            reply,
            parent,
            children: Vec::new(),
            visits: 0,
            value: 0.0,
        }
    }

    fn is_terminal(&self) -> bool {
        self.messages.len() > MAX_DIALOGUE_LEN
    }
}

/// Arena-backed search tree; node 0 is the root
#[derive(Debug)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            nodes: vec![Node::new(messages, None, None)],
        }
    }

    fn push(&mut self, parent: usize, messages: Vec<ChatMessage>, reply: String) -> usize {
        let index = self.nodes.len();
        self.nodes.push(Node::new(messages, Some(reply), Some(parent)));
        self.nodes[parent].children.push(index);
        index
    }

    /// Upper confidence bound of a child; unvisited children come first
    fn uct(&self, index: usize, exploration: f64) -> f64 {
        let node = &self.nodes[index];
        if node.visits == 0 {
            return f64::INFINITY;
        }

        let parent_visits = node.parent.map_or(1, |p| self.nodes[p].visits.max(1));
        let visits = f64::from(node.visits);
        let exploit = node.value / visits;
        let explore = exploration * (f64::from(parent_visits).ln() / visits).sqrt();

        exploit + explore
    }

    /// Descend from the root along the best UCT children to a leaf
    fn select(&self, exploration: f64) -> usize {
        let mut current = 0;
        while !self.nodes[current].children.is_empty() && !self.nodes[current].is_terminal() {
            current = best_by(&self.nodes[current].children, |child| self.uct(child, exploration));
        }
        current
    }

    fn backpropagate(&mut self, from: usize, score: f64) {
        let mut current = Some(from);
        while let Some(index) = current {
            let node = &mut self.nodes[index];
            node.visits += 1;
            node.value += score;
            current = node.parent;
        }
    }
}

/// Monte Carlo tree search strategy
pub struct Mcts {
    config: MctsConfig,
}

impl Mcts {
    pub const fn new(config: MctsConfig) -> Self {
        Self { config }
    }

    async fn predict_user(
        input: &StrategyInput<'_>,
        backend: &dyn Backend,
        messages: &[ChatMessage],
    ) -> Result<String, StrategyError> {
        let mut messages = messages.to_vec();
        messages.push(ChatMessage::user(PREDICT_PROMPT));

        let request = BackendRequest::new(input.model, messages)
            .with_temperature(1.0)
            .with_max_tokens(1024);

        Ok(backend.complete(request).await?)
    }

    async fn expand(
        &self,
        tree: &mut Tree,
        node: usize,
        input: &StrategyInput<'_>,
        backend: &dyn Backend,
    ) -> Result<(), StrategyError> {
        let state = tree.nodes[node].messages.clone();
        let request = BackendRequest::new(input.model, state.clone())
            .with_n(self.config.expansions)
            .with_temperature(1.0)
            .with_max_tokens(4096);

        let replies = backend.chat(request).await?.choices;

        let states: Vec<Vec<ChatMessage>> = replies
            .iter()
            .map(|reply| {
                let mut next = state.clone();
                next.push(ChatMessage::assistant(reply.as_str()));
                next
            })
            .collect();

        let user_turns = try_join_all(states.iter().map(|s| Self::predict_user(input, backend, s))).await?;

        for ((mut next, reply), user_turn) in states.into_iter().zip(replies).zip(user_turns) {
            next.push(ChatMessage::user(user_turn));
            tree.push(node, next, reply);
        }

        Ok(())
    }

    /// Play the dialogue forward and return the final conversation
    async fn simulate(
        &self,
        mut messages: Vec<ChatMessage>,
        input: &StrategyInput<'_>,
        backend: &dyn Backend,
    ) -> Result<Vec<ChatMessage>, StrategyError> {
        for _ in 0..self.config.depth {
            if messages.len() > MAX_DIALOGUE_LEN {
                break;
            }

            let request = BackendRequest::new(input.model, messages.clone())
                .with_temperature(1.0)
                .with_max_tokens(4096);
            let reply = backend.complete(request).await?;
            messages.push(ChatMessage::assistant(reply));

            let user_turn = Self::predict_user(input, backend, &messages).await?;
            messages.push(ChatMessage::user(user_turn));
        }

        Ok(messages)
    }

    async fn evaluate(
        input: &StrategyInput<'_>,
        backend: &dyn Backend,
        mut messages: Vec<ChatMessage>,
    ) -> Result<f64, StrategyError> {
        messages.push(ChatMessage::user(EVALUATE_PROMPT));

        let request = BackendRequest::new(input.model, messages)
            .with_temperature(0.1)
            .with_max_tokens(16);

        let reply = backend.complete(request).await?;
        Ok(text::parse_score(&reply, 10.0) / 10.0)
    }
}

#[async_trait]
impl Strategy for Mcts {
    fn name(&self) -> &str {
        NAME
    }

    async fn run(&self, input: &StrategyInput<'_>, backend: &dyn Backend) -> Result<StrategyOutput, StrategyError> {
        let mut tree = Tree::new(input.base_messages());

        for simulation in 0..self.config.simulations {
            let leaf = tree.select(self.config.exploration);

            let start = if tree.nodes[leaf].is_terminal() {
                leaf
            } else {
                self.expand(&mut tree, leaf, input, backend).await?;

                let children = &tree.nodes[leaf].children;
                if children.is_empty() {
                    leaf
                } else {
                    let pick = rand::rng().random_range(0..children.len());
                    children[pick]
                }
            };

            let dialogue = self.simulate(tree.nodes[start].messages.clone(), input, backend).await?;
            let score = Self::evaluate(input, backend, dialogue).await?;
            tree.backpropagate(start, score);

            tracing::debug!(simulation, node = start, score, "mcts simulation scored");
        }

        let root_children = &tree.nodes[0].children;
        if root_children.is_empty() {
            return Err(StrategyError::no_candidates(NAME));
        }

        let best = best_by(root_children, |child| f64::from(tree.nodes[child].visits));

        tree.nodes[best]
            .reply
            .clone()
            .map(StrategyOutput::Single)
            .ok_or_else(|| StrategyError::no_candidates(NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::testing::ScriptedBackend;

    fn input() -> StrategyInput<'static> {
        StrategyInput {
            system_prompt: "sys",
            query: "hello",
            model: "m",
            n: 1,
        }
    }

    #[test]
    fn backpropagation_reaches_root() {
        let mut tree = Tree::new(vec![ChatMessage::user("q")]);
        let child = tree.push(0, vec![ChatMessage::user("q")], "a".to_owned());
        let grandchild = tree.push(child, vec![ChatMessage::user("q")], "b".to_owned());

        tree.backpropagate(grandchild, 0.5);

        for index in [0, child, grandchild] {
            assert_eq!(tree.nodes[index].visits, 1);
            assert!((tree.nodes[index].value - 0.5).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn selection_prefers_unvisited_children() {
        let mut tree = Tree::new(Vec::new());
        let first = tree.push(0, Vec::new(), "a".to_owned());
        let second = tree.push(0, Vec::new(), "b".to_owned());

        tree.backpropagate(first, 1.0);
        assert_eq!(tree.select(0.2), second);

        tree.backpropagate(second, 0.1);
        assert_eq!(tree.select(0.2), first);
    }

    #[test]
    fn long_dialogues_are_terminal() {
        let messages = vec![ChatMessage::user("x"); MAX_DIALOGUE_LEN + 1];
        assert!(Node::new(messages, None, None).is_terminal());
    }

    #[tokio::test]
    async fn returns_most_visited_reply() {
        // The second simulation visits the remaining unvisited child, so both
        // root children tie and the earliest wins
        let backend = ScriptedBackend::new(vec![vec!["first reply", "second reply"]]).with_fallback("5");
        let strategy = Mcts::new(MctsConfig {
            simulations: 2,
            exploration: 0.2,
            depth: 1,
            expansions: 2,
        });

        let output = strategy.run(&input(), &backend).await.unwrap();
        assert_eq!(output, StrategyOutput::Single("first reply".to_owned()));

        let requests = backend.requests();
        assert_eq!(requests[0].n, 2);
        assert_eq!(requests[0].messages, input().base_messages());
    }

    #[tokio::test]
    async fn zero_simulations_have_no_answer() {
        let backend = ScriptedBackend::default();
        let strategy = Mcts::new(MctsConfig {
            simulations: 0,
            ..MctsConfig::default()
        });

        let error = strategy.run(&input(), &backend).await.unwrap_err();
        assert!(matches!(error, StrategyError::NoCandidates { .. }));
    }
}
