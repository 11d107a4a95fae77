//! Build system integration.
//!
//! The [`BuildSystem`] trait is the seam between the retrying
//! [`JobTrigger`] and the HTTP calls it makes. [`JenkinsClient`] implements
//! it against a real Jenkins server; tests script it.

mod client;
mod endpoint;
mod error;
mod trigger;

#[cfg(test)]
pub(crate) mod mock;

use std::future::Future;

pub use client::JenkinsClient;
pub use endpoint::{EndpointDefinition, RawSetting, RetrySettings, StatusSet, SuccessCriteria};
pub use error::{BuildSystemError, EndpointConfigError};
pub use trigger::{EndpointOutcome, JobTrigger, TriggerReport};

/// A CSRF crumb: header name plus value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crumb {
    pub field: String,
    pub value: String,
}

/// The calls the job trigger makes against a build system.
pub trait BuildSystem: Send + Sync + 'static {
    /// Fetches a fresh crumb.
    fn crumb(&self) -> impl Future<Output = Result<Crumb, BuildSystemError>> + Send;

    /// Posts to `path` (relative to the base URL) with the crumb attached.
    ///
    /// Returns the response status. Non-success statuses are not errors; the
    /// caller checks them against the endpoint's accepted set.
    fn post(
        &self,
        path: &str,
        crumb: &Crumb,
    ) -> impl Future<Output = Result<u16, BuildSystemError>> + Send;
}
