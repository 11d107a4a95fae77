//! Webhook endpoint handler.
//!
//! Accepts GitHub webhook deliveries, verifies their signature when a secret
//! is configured, and applies `pull_request` events to the cache before
//! returning 200 OK. A triggered job runs to completion before the response
//! is sent.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::AppState;
use crate::ingest::IngestOutcome;
use crate::jenkins::BuildSystem;
use crate::webhooks::{ParseError, SignatureError, WebhookEvent, parse_webhook};

/// Header name for GitHub event type.
const HEADER_EVENT: &str = "x-github-event";
/// Header name for GitHub signature.
const HEADER_SIGNATURE: &str = "x-hub-signature-256";

/// Errors that can occur when processing a webhook.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Signature verification failed: {0}")]
    InvalidSignature(#[from] SignatureError),

    #[error("Got non-JSON payload: {0}")]
    InvalidPayload(#[from] ParseError),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = match &self {
            WebhookError::InvalidSignature(_) => StatusCode::UNAUTHORIZED,
            WebhookError::InvalidPayload(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, self.to_string()).into_response()
    }
}

/// Webhook handler.
///
/// # Request
///
/// - Method: POST
/// - Headers:
///   - `X-GitHub-Event`: Event type (e.g., "pull_request", "ping")
///   - `X-Hub-Signature-256`: HMAC-SHA256 signature of the payload, required
///     only when a secret is configured
/// - Body: JSON webhook payload (ignored for `ping`)
///
/// # Response
///
/// - 200 OK: Delivery processed (including ignored deliveries)
/// - 401 Unauthorized: Missing or invalid signature
/// - 500 Internal Server Error: Body is not a JSON object
pub async fn webhook_handler<B: BuildSystem>(
    State(app_state): State<AppState<B>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, WebhookError> {
    let event_type = header_value(&headers, HEADER_EVENT).unwrap_or_default();

    debug!(event_type = %event_type, bytes = body.len(), "Received webhook");

    // Verify before parsing anything.
    if let Some(secret) = app_state.webhook_secret() {
        if let Err(e) = secret.verify(&body, header_value(&headers, HEADER_SIGNATURE)) {
            warn!(event_type = %event_type, error = %e, "Invalid webhook signature");
            return Err(e.into());
        }
    }

    let event = parse_webhook(event_type, &body).inspect_err(|e| {
        warn!(event_type = %event_type, error = %e, "Rejected webhook payload");
    })?;

    match event {
        WebhookEvent::Ping => debug!("Ping received"),
        WebhookEvent::PullRequest(pull_request) => {
            match app_state.ingest().handle_pull_request(&pull_request).await {
                IngestOutcome::Ignored(reason) => {
                    debug!(reason = ?reason, "Pull request delivery ignored");
                }
                IngestOutcome::Applied { outcome, trigger } => {
                    info!(
                        before = ?outcome.before,
                        after = ?outcome.after,
                        triggered = trigger.is_some(),
                        "Pull request delivery applied"
                    );
                }
            }
        }
        WebhookEvent::Other(event_type) => {
            debug!(event_type = %event_type, "Ignoring event type");
        }
    }

    Ok(StatusCode::OK)
}

/// Extracts a header value as a string, if present and valid UTF-8.
fn header_value<'a>(headers: &'a HeaderMap, name: &'static str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
