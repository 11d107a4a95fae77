//! Retries for the bootstrap listings.
//!
//! A listing page that fails transiently is requested again after a doubling
//! delay. Permanent errors are returned at once.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use super::error::GitHubApiError;

/// How often and how patiently a listing call is repeated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubles for each one after.
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryConfig {
    /// 3 retries after 2s, 4s and 8s.
    pub const DEFAULT: Self = Self {
        max_retries: 3,
        base_delay: Duration::from_secs(2),
        max_delay: Duration::from_secs(16),
    };

    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
        }
    }

    /// Delay before retry number `retry` (0-indexed).
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        2u32.checked_pow(retry)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.max_retries).map(|retry| self.delay_for_retry(retry))
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Runs `operation` until it succeeds, fails permanently, or runs out of
/// retries. The last error is returned in the latter two cases.
pub async fn retry_with_backoff<T, F, Fut>(
    config: RetryConfig,
    mut operation: F,
) -> Result<T, GitHubApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GitHubApiError>>,
{
    let mut delays = config.delays();
    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        let delay = match delays.next() {
            Some(delay) if err.kind.is_retriable() => delay,
            _ => return Err(err),
        };
        debug!(?delay, error = %err, "Retrying GitHub API call");
        tokio::time::sleep(delay).await;
    }
}
