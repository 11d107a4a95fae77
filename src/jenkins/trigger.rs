//! The retrying job trigger.
//!
//! A trigger walks the configured endpoints in order. Each endpoint gets its
//! own retry budget: every attempt fetches a fresh crumb, posts to the
//! rendered path and checks the status against the endpoint's accepted set.
//! A failed attempt waits the endpoint's retry delay before the next one.
//!
//! An endpoint that exhausts its budget is reported and skipped. An endpoint
//! whose retry settings are malformed aborts the rest of the invocation.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument, warn};

use crate::types::PrKey;

use super::BuildSystem;
use super::endpoint::EndpointDefinition;
use super::error::EndpointConfigError;

/// What happened to one endpoint during a trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointOutcome {
    /// The endpoint accepted the call.
    Succeeded { path: String, attempts: u64 },
    /// Every attempt failed.
    Exhausted { path: String, attempts: u64 },
}

/// Result of one trigger invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerReport {
    /// Outcomes of the endpoints that ran, in order.
    pub endpoints: Vec<EndpointOutcome>,
    /// Set when a malformed endpoint stopped the invocation.
    pub aborted: Option<EndpointConfigError>,
}

impl TriggerReport {
    pub fn all_succeeded(&self) -> bool {
        self.aborted.is_none()
            && self
                .endpoints
                .iter()
                .all(|e| matches!(e, EndpointOutcome::Succeeded { .. }))
    }
}

/// Triggers build system jobs for pull requests.
pub struct JobTrigger<B> {
    build_system: B,
    endpoints: Arc<[EndpointDefinition]>,
}

impl<B: Clone> Clone for JobTrigger<B> {
    fn clone(&self) -> Self {
        JobTrigger {
            build_system: self.build_system.clone(),
            endpoints: Arc::clone(&self.endpoints),
        }
    }
}

impl<B> std::fmt::Debug for JobTrigger<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobTrigger")
            .field("endpoints", &self.endpoints.len())
            .finish_non_exhaustive()
    }
}

impl<B: BuildSystem> JobTrigger<B> {
    pub fn new(build_system: B, endpoints: Vec<EndpointDefinition>) -> Self {
        JobTrigger {
            build_system,
            endpoints: endpoints.into(),
        }
    }

    pub fn endpoints(&self) -> &[EndpointDefinition] {
        &self.endpoints
    }

    /// Runs every configured endpoint for `pr`.
    ///
    /// Never fails: endpoint failures are logged and reported.
    #[instrument(skip(self), fields(pr = %pr))]
    pub async fn trigger(&self, pr: &PrKey) -> TriggerReport {
        let mut report = TriggerReport::default();

        for endpoint in self.endpoints.iter() {
            let settings = endpoint
                .retry_delay()
                .and_then(|delay| endpoint.retry_count().map(|count| (delay, count)));
            let (delay, count) = match settings {
                Ok(settings) => settings,
                Err(e) => {
                    warn!(error = %e, "Aborting remaining endpoints");
                    report.aborted = Some(e);
                    break;
                }
            };

            let outcome = self.run_endpoint(endpoint, pr, delay, count).await;
            if let EndpointOutcome::Exhausted { path, attempts } = &outcome {
                warn!(path = %path, attempts, "Unable to post to endpoint");
            }
            report.endpoints.push(outcome);
        }

        report
    }

    async fn run_endpoint(
        &self,
        endpoint: &EndpointDefinition,
        pr: &PrKey,
        delay: Duration,
        count: u64,
    ) -> EndpointOutcome {
        let path = endpoint.render_path(pr);

        for attempt in 1..=count {
            info!("Retry: ({}/{})", attempt, count);

            if self.attempt(endpoint, &path).await {
                return EndpointOutcome::Succeeded {
                    path,
                    attempts: attempt,
                };
            }

            if attempt < count {
                tokio::time::sleep(delay).await;
            }
        }

        EndpointOutcome::Exhausted {
            path,
            attempts: count,
        }
    }

    /// One crumb + post + status check. Returns true on accepted status.
    async fn attempt(&self, endpoint: &EndpointDefinition, path: &str) -> bool {
        let crumb = match self.build_system.crumb().await {
            Ok(crumb) => crumb,
            Err(e) => {
                warn!(error = %e, "Error getting crumb");
                return false;
            }
        };

        let status = match self.build_system.post(path, &crumb).await {
            Ok(status) => status,
            Err(e) => {
                warn!(path = %path, error = %e, "Error from request to endpoint");
                return false;
            }
        };

        info!(path = %path, status, "Posted to endpoint");
        if endpoint.accepts(status) {
            true
        } else {
            warn!(path = %path, status, "HTTP status different than expected");
            false
        }
    }
}
