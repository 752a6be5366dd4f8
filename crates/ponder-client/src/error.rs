use http::StatusCode;
use ponder_core::HttpError;
use thiserror::Error;

/// Errors raised while calling the backend provider
#[derive(Debug, Error)]
pub enum BackendError {
    /// The HTTP request could not be sent or the connection failed
    #[error("backend request failed: {0}")]
    Transport(String),

    /// The provider answered with a non-success status
    #[error("backend returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// The provider's response body could not be decoded
    #[error("failed to parse backend response: {0}")]
    Decode(String),

    /// The provider answered without any usable completion
    #[error("backend returned no choices")]
    Empty,

    /// The client could not be constructed
    #[error("invalid backend configuration: {0}")]
    Config(String),
}

impl HttpError for BackendError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Transport(_) | Self::Status { .. } | Self::Decode(_) | Self::Empty => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::Config(_) => "internal_error",
            _ => "upstream_error",
        }
    }

    fn client_message(&self) -> String {
        self.to_string()
    }
}
