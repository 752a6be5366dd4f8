//! Gateway error taxonomy and its HTTP rendering

use std::time::Duration;

use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use ponder_core::HttpError;
use ponder_strategy::StrategyError;
use thiserror::Error;

/// Errors surfaced by the chat completions endpoint
///
/// Every variant is rendered as a `{"error": message}` body; the process
/// keeps serving regardless of which one a request hits.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The payload could not be decoded into a chat request
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// Auto mode could not split the model field into approach and model
    #[error("model '{model}' must have the form <approach>-<model> when the approach is auto")]
    MalformedModelField { model: String },

    /// The approach is not a registered strategy
    ///
    /// `configured` tells an operator mistake (the configured approach)
    /// from a caller mistake (the prefix of the model field).
    #[error("Unknown approach: {name}")]
    UnknownApproach { name: String, configured: bool },

    /// The strategy or one of its backend calls failed
    #[error(transparent)]
    Strategy(#[from] StrategyError),

    /// The strategy did not finish within the configured bound
    #[error("approach '{approach}' timed out after {}s", .after.as_secs())]
    Timeout { approach: String, after: Duration },
}

impl HttpError for GatewayError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MalformedRequest(_)
            | Self::MalformedModelField { .. }
            | Self::UnknownApproach { configured: false, .. } => StatusCode::BAD_REQUEST,
            Self::UnknownApproach { configured: true, .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Strategy(e) => e.status_code(),
            Self::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::MalformedRequest(_) | Self::MalformedModelField { .. } => "invalid_request_error",
            Self::UnknownApproach { .. } => "unknown_approach",
            Self::Strategy(e) => e.error_type(),
            Self::Timeout { .. } => "timeout_error",
        }
    }

    fn client_message(&self) -> String {
        self.to_string()
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, message) = ponder_core::error_body(&self);

        if status.is_server_error() {
            tracing::error!(error_type = self.error_type(), %status, error = %self, "request failed");
        } else {
            tracing::warn!(error_type = self.error_type(), %status, error = %self, "request rejected");
        }

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
