//! GitHub API access for the bootstrap listings.
//!
//! Key features:
//! - Lists repositories of a user or organization and their open pull requests
//! - Pages through results 100 at a time
//! - Retries transient failures with exponential backoff

mod client;
mod error;
mod retry;

pub use client::GitHubClient;
pub use error::{GitHubApiError, GitHubErrorKind};
pub use retry::{RetryConfig, retry_with_backoff};
