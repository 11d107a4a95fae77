//! Cache read endpoint.
//!
//! Returns the whole dependency cache as JSON. When an API token header and
//! value are both configured, requests must present the value in that header.

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::debug;

use super::AppState;
use crate::jenkins::BuildSystem;

/// Read handler.
///
/// # Response
///
/// - 200 OK with the cache snapshot (`application/json`)
/// - 401 Unauthorized if a token is configured and not presented
///
/// # Example
///
/// ```ignore
/// GET / HTTP/1.1
///
/// HTTP/1.1 200 OK
/// Content-Type: application/json
///
/// {
///   "branches": { "svc": { "1": "feature/x" } },
///   "dependencies": { "svc": { "1": { "lib": 5 } } },
///   "dependents": { "lib": { "5": { "svc": 1 } } },
///   "version": "1"
/// }
/// ```
pub async fn read_handler<B: BuildSystem>(
    State(app_state): State<AppState<B>>,
    headers: HeaderMap,
) -> Response {
    if let Some(token) = app_state.api_token() {
        let presented = headers
            .get(token.header())
            .and_then(|v| v.to_str().ok());
        if !token.accepts(presented) {
            debug!(header = %token.header(), "Rejected cache read without valid token");
            return StatusCode::UNAUTHORIZED.into_response();
        }
    }

    Json(app_state.ingest().cache().snapshot().await).into_response()
}
