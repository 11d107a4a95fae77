//! Liveness endpoint.

use axum::http::StatusCode;

/// Always answers 200 with `OK` while the server accepts connections.
pub async fn health_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}
