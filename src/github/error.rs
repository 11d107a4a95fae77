//! Errors from the GitHub listing calls.
//!
//! Each error carries a [`GitHubErrorKind`] deciding whether the listing is
//! worth repeating. Server errors, rate limiting and network trouble are
//! transient; everything else (unknown owner, bad token) is permanent and
//! aborts the bootstrap.

use thiserror::Error;

/// Phrases in an error message that mark it as worth retrying.
const TRANSIENT_MARKERS: &[&str] = &["try again", "timed out", "timeout", "connection", "dns"];

/// Phrases GitHub uses when a 403 is really rate limiting.
const RATE_LIMIT_MARKERS: &[&str] = &["rate limit", "abuse detection"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitHubErrorKind {
    Transient,
    Permanent,
}

impl GitHubErrorKind {
    /// Classifies a failure from its HTTP status (when GitHub answered) and
    /// its message.
    pub fn classify(status_code: Option<u16>, message: &str) -> Self {
        let message = message.to_lowercase();
        let mentions = |markers: &[&str]| markers.iter().any(|m| message.contains(m));

        let transient = match status_code {
            Some(429) | Some(500..=599) => true,
            Some(403) => mentions(RATE_LIMIT_MARKERS),
            _ => mentions(TRANSIENT_MARKERS),
        };
        if transient {
            GitHubErrorKind::Transient
        } else {
            GitHubErrorKind::Permanent
        }
    }

    pub fn is_retriable(self) -> bool {
        self == GitHubErrorKind::Transient
    }
}

/// A failed GitHub API call.
#[derive(Debug, Error)]
#[error("GitHub API error{}: {message}", status_suffix(.status_code))]
pub struct GitHubApiError {
    pub kind: GitHubErrorKind,
    pub status_code: Option<u16>,
    pub message: String,
    #[source]
    pub source: Option<octocrab::Error>,
}

impl GitHubApiError {
    /// An error that did not come from octocrab.
    pub fn new(kind: GitHubErrorKind, message: impl Into<String>) -> Self {
        GitHubApiError {
            kind,
            status_code: None,
            message: message.into(),
            source: None,
        }
    }

    pub fn from_octocrab(err: octocrab::Error) -> Self {
        let status_code = match &err {
            octocrab::Error::GitHub { source, .. } => Some(source.status_code.as_u16()),
            _ => None,
        };
        let message = err.to_string();
        GitHubApiError {
            kind: GitHubErrorKind::classify(status_code, &message),
            status_code,
            message,
            source: Some(err),
        }
    }
}

fn status_suffix(status_code: &Option<u16>) -> String {
    status_code
        .map(|code| format!(" (HTTP {})", code))
        .unwrap_or_default()
}
