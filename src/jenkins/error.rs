//! Build system error types.
//!
//! Two families of failure are kept apart:
//!
//! - [`BuildSystemError`]: a single call to the build system failed. The job
//!   trigger retries these within an endpoint's retry budget.
//! - [`EndpointConfigError`]: an endpoint's retry settings are unusable. The
//!   job trigger aborts every remaining endpoint of the invocation.

use thiserror::Error;

/// A failed call to the build system.
#[derive(Debug, Error)]
pub enum BuildSystemError {
    /// The request could not be sent or its response not read.
    #[error("request to {url} failed: {message}")]
    Transport {
        url: String,
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// The crumb issuer answered with a non-success status.
    #[error("crumb issuer at {url} returned HTTP {status}")]
    CrumbStatus { url: String, status: u16 },

    /// The crumb issuer answered with a body we cannot use.
    #[error("malformed crumb from {url}: {message}")]
    MalformedCrumb { url: String, message: String },
}

impl BuildSystemError {
    /// Creates a transport error from a reqwest error.
    pub fn transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        BuildSystemError::Transport {
            url: url.into(),
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Creates a transport error without a reqwest source.
    pub fn transport_without_source(url: impl Into<String>, message: impl Into<String>) -> Self {
        BuildSystemError::Transport {
            url: url.into(),
            message: message.into(),
            source: None,
        }
    }
}

/// An endpoint whose retry settings cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndpointConfigError {
    #[error("endpoint {path}: retry delay {value:?} is not a non-negative integer")]
    InvalidDelay { path: String, value: String },

    #[error("endpoint {path}: retry count {value:?} is not a non-negative integer")]
    InvalidCount { path: String, value: String },
}
