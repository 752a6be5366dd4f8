//! Solver-backed reasoning
//!
//! The model encodes the problem as SMT-LIB declarations and assertions, Z3
//! checks the encoding, and the model phrases the answer from the solver's
//! verdict. Encodings the solver cannot use are sent back to the model with
//! the reason until the attempts run out, after which the query is answered
//! directly.

use std::fmt;

use async_trait::async_trait;
use ponder_client::{Backend, BackendRequest, ChatMessage};
use ponder_config::Z3Config;
use ::z3::SatResult;

use super::{Strategy, StrategyInput, StrategyOutput};
use crate::error::StrategyError;
use crate::text;

const NAME: &str = "z3";

const ENCODE_INSTRUCTIONS: &str = "Translate the user's problem into SMT-LIB v2. Declare every unknown with \
    declare-const or declare-fun and state every constraint with assert. Do not add check-sat, get-model, or \
    any other solver command. Reply with a single ```smt2 code block.";

/// Solver commands stripped from encodings; the solver is driven directly
const COMMANDS: [&str; 6] = ["(check-sat", "(get-model", "(get-value", "(set-option", "(set-logic", "(exit"];

/// Z3-assisted strategy
pub struct Z3Solver {
    config: Z3Config,
}

impl Z3Solver {
    pub const fn new(config: Z3Config) -> Self {
        Self { config }
    }

    async fn solve(&self, program: String) -> Result<Verdict, StrategyError> {
        let timeout_ms = self.config.solver_timeout_ms;
        tokio::task::spawn_blocking(move || check(&program, timeout_ms))
            .await
            .map_err(|e| StrategyError::SolverTask(e.to_string()))
    }
}

/// Outcome of checking one encoding
#[derive(Debug, Clone, PartialEq, Eq)]
enum Verdict {
    /// Satisfiable, with the solver's model
    Sat(String),
    Unsat,
    /// The solver gave up, with its reason
    Unknown(String),
    /// The encoding could not be checked
    Unusable(String),
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sat(model) => write!(f, "sat\n{model}"),
            Self::Unsat => f.write_str("unsat (the constraints cannot all hold)"),
            Self::Unknown(reason) => write!(f, "unknown ({reason})"),
            Self::Unusable(reason) => write!(f, "unusable encoding ({reason})"),
        }
    }
}

/// Declarations and assertions from a model reply
fn encoding(reply: &str) -> String {
    text::extract_code(reply)
        .lines()
        .filter(|line| {
            let line = line.trim_start();
            !COMMANDS.iter().any(|command| line.starts_with(command))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Check an encoding with a fresh solver
///
/// Z3 contexts are not `Send`, so everything solver-related lives and dies
/// inside this call.
fn check(program: &str, timeout_ms: u64) -> Verdict {
    if !program.contains("(assert") {
        return Verdict::Unusable("no assertions found".to_owned());
    }
    if program.contains('\0') {
        return Verdict::Unusable("encoding contains a NUL byte".to_owned());
    }

    let mut cfg = ::z3::Config::new();
    cfg.set_model_generation(true);
    cfg.set_timeout_msec(timeout_ms);
    let ctx = ::z3::Context::new(&cfg);
    let solver = ::z3::Solver::new(&ctx);

    solver.from_string(program);
    if solver.get_assertions().is_empty() {
        return Verdict::Unusable("the solver could not parse the encoding".to_owned());
    }

    match solver.check() {
        SatResult::Sat => Verdict::Sat(solver.get_model().map(|model| model.to_string()).unwrap_or_default()),
        SatResult::Unsat => Verdict::Unsat,
        SatResult::Unknown => Verdict::Unknown(
            solver
                .get_reason_unknown()
                .unwrap_or_else(|| "no reason given".to_owned()),
        ),
    }
}

#[async_trait]
impl Strategy for Z3Solver {
    fn name(&self) -> &str {
        NAME
    }

    async fn run(&self, input: &StrategyInput<'_>, backend: &dyn Backend) -> Result<StrategyOutput, StrategyError> {
        let mut messages = vec![
            ChatMessage::system(input.system_with(ENCODE_INSTRUCTIONS)),
            ChatMessage::user(input.query),
        ];

        for attempt in 1..=self.config.attempts {
            let request = BackendRequest::new(input.model, messages.clone())
                .with_temperature(0.2)
                .with_max_tokens(2048);
            let reply = backend.complete(request).await?;
            let program = encoding(&reply);

            match self.solve(program.clone()).await? {
                Verdict::Unusable(reason) => {
                    tracing::debug!(attempt, %reason, "encoding rejected");
                    messages.push(ChatMessage::assistant(reply));
                    messages.push(ChatMessage::user(format!(
                        "The solver could not use that encoding: {reason}. Reply with a corrected ```smt2 code block."
                    )));
                }
                verdict => {
                    tracing::debug!(attempt, "encoding checked");
                    let prompt = format!(
                        "Problem: {query}\n\n\
                         SMT-LIB encoding:\n{program}\n\n\
                         Solver result: {verdict}\n\n\
                         Using the solver result, answer the problem. Explain briefly and state the final answer.",
                        query = input.query,
                    );
                    let request = BackendRequest::new(
                        input.model,
                        vec![ChatMessage::system(input.system_prompt), ChatMessage::user(prompt)],
                    )
                    .with_temperature(0.3)
                    .with_max_tokens(4096);

                    return Ok(StrategyOutput::Single(backend.complete(request).await?));
                }
            }
        }

        tracing::warn!(attempts = self.config.attempts, "no usable encoding, answering without the solver");
        let request = BackendRequest::new(input.model, input.base_messages()).with_max_tokens(4096);
        Ok(StrategyOutput::Single(backend.complete(request).await?))
    }
}
