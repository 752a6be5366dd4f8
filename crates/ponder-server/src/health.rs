use axum::response::IntoResponse;
use http::StatusCode;

/// Liveness probe; answers as long as the process is serving
pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
