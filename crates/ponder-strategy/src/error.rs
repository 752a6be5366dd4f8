//! Strategy-specific error types

use http::StatusCode;
use ponder_client::BackendError;
use ponder_core::HttpError;
use thiserror::Error;

/// Errors raised while a strategy computes its answer
#[derive(Debug, Error)]
pub enum StrategyError {
    /// A backend call made by the strategy failed
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The strategy finished without producing any candidate
    #[error("{strategy} produced no candidate answer")]
    NoCandidates { strategy: String },

    /// A blocking solver task panicked or was cancelled
    #[error("solver task failed: {0}")]
    SolverTask(String),
}

impl StrategyError {
    pub fn no_candidates(strategy: impl Into<String>) -> Self {
        Self::NoCandidates {
            strategy: strategy.into(),
        }
    }
}

impl HttpError for StrategyError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Backend(e) => e.status_code(),
            Self::NoCandidates { .. } | Self::SolverTask(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::Backend(e) => e.error_type(),
            Self::NoCandidates { .. } | Self::SolverTask(_) => "strategy_error",
        }
    }

    fn client_message(&self) -> String {
        self.to_string()
    }
}
