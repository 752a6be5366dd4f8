use http::StatusCode;

/// Domain error that knows how it surfaces over HTTP
///
/// Gateway, strategy, and backend errors implement this so the axum layer
/// can render any of them as a `{"error": message}` body without the
/// domain crates depending on axum.
pub trait HttpError: std::error::Error {
    /// HTTP status code for this error
    fn status_code(&self) -> StatusCode;

    /// Machine-readable error category, logged alongside failures
    fn error_type(&self) -> &str;

    /// Message safe to expose to API consumers
    fn client_message(&self) -> String;
}

/// Status and message pair for an error response body of the form `{"error": message}`
pub fn error_body<E: HttpError + ?Sized>(error: &E) -> (StatusCode, String) {
    (error.status_code(), error.client_message())
}
