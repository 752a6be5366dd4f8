//! Inference-time compute strategies for Ponder
//!
//! Every strategy maps a system prompt and a user query to one or more
//! candidate completions by calling the backend as many times as its
//! technique needs:
//! - **bon**: sample several answers, let the model rate them, keep the best
//! - **moa**: draft, critique, and synthesize across three agents
//! - **mcts**: tree search over simulated dialogue continuations
//! - **rto**: round-trip an answer through a summary and reconcile
//! - **`self_consistency`**: cluster sampled answers and keep the majority
//! - **pvg**: helpful and sneaky provers judged by a verifier
//! - **rstar**: UCT-guided reasoning rollouts with answer voting
//! - **`cot_reflection`**: tagged chain of thought with self-reflection
//! - **plansearch**: observations into plans into `n` candidate solutions
//! - **z3**: SMT encoding checked by the Z3 solver, then phrased as an answer

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod error;
pub mod strategy;
mod text;

pub use error::StrategyError;
pub use strategy::{Strategy, StrategyInput, StrategyOutput, StrategyRegistry};
