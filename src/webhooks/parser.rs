//! GitHub webhook payload parser.
//!
//! # Parsing Strategy
//!
//! 1. The event type comes from the `X-GitHub-Event` header
//! 2. `ping` is accepted without looking at the body
//! 3. Every other event must carry a JSON object, or parsing fails
//! 4. `pull_request` payloads are normalized into [`PullRequestEvent`];
//!    missing fields become empty strings or zero
//! 5. Other event types are returned as [`WebhookEvent::Other`] and ignored

use serde_json::{Map, Value};
use thiserror::Error;

/// Error type for webhook parsing failures.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("payload is not a JSON object")]
    NotAnObject,
}

/// The fields of a `pull_request` delivery the cache needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullRequestEvent {
    /// Raw action string (`opened`, `labeled`, ...).
    pub action: String,
    /// Repository name without owner.
    pub repository: String,
    /// Head branch.
    pub branch: String,
    pub number: u64,
    /// Pull request description.
    pub body: String,
}

/// A parsed webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    Ping,
    PullRequest(PullRequestEvent),
    /// Any other event type; carries the type name.
    Other(String),
}

/// Parses a webhook delivery.
///
/// # Examples
///
/// ```
/// use pullrequestd::webhooks::{WebhookEvent, parse_webhook};
///
/// let payload = br#"{
///     "action": "opened",
///     "repository": { "name": "svc" },
///     "pull_request": {
///         "number": 12,
///         "body": "DependsOn:lib#5",
///         "head": { "ref": "feature/x" }
///     }
/// }"#;
///
/// match parse_webhook("pull_request", payload).unwrap() {
///     WebhookEvent::PullRequest(pr) => {
///         assert_eq!(pr.repository, "svc");
///         assert_eq!(pr.number, 12);
///         assert_eq!(pr.branch, "feature/x");
///     }
///     other => panic!("unexpected event: {:?}", other),
/// }
/// ```
pub fn parse_webhook(event_type: &str, payload: &[u8]) -> Result<WebhookEvent, ParseError> {
    if event_type == "ping" {
        return Ok(WebhookEvent::Ping);
    }

    let json: Value = serde_json::from_slice(payload)?;
    let object = json.as_object().ok_or(ParseError::NotAnObject)?;

    match event_type {
        "pull_request" => Ok(WebhookEvent::PullRequest(parse_pull_request(object))),
        other => Ok(WebhookEvent::Other(other.to_string())),
    }
}

fn parse_pull_request(object: &Map<String, Value>) -> PullRequestEvent {
    let pull_request = object.get("pull_request");

    PullRequestEvent {
        action: string_at(object.get("action")),
        repository: string_at(object.get("repository").and_then(|r| r.get("name"))),
        branch: string_at(
            pull_request
                .and_then(|pr| pr.get("head"))
                .and_then(|head| head.get("ref")),
        ),
        number: pull_request
            .and_then(|pr| pr.get("number"))
            .and_then(Value::as_u64)
            .unwrap_or(0),
        body: string_at(pull_request.and_then(|pr| pr.get("body"))),
    }
}

fn string_at(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_default()
}
