//! The inbound pull request pipeline.
//!
//! A `pull_request` delivery goes through the repository filter, has its
//! dependency directives extracted, is applied to the cache under the write
//! lock and, when the cache asks for it, triggers the pull request's job.
//! The trigger runs after the lock is released.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::cache::{ApplyMode, ApplyOutcome, CacheEvent, DependencyCache};
use crate::directives::extract_dependency_tokens;
use crate::filter::RepositoryFilter;
use crate::jenkins::{BuildSystem, JobTrigger, TriggerReport};
use crate::types::{PrAction, PrKey};
use crate::webhooks::PullRequestEvent;

/// Why a delivery did not touch the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    EmptyRepository,
    EmptyBody,
    Filtered,
    UnsupportedAction(String),
}

/// What happened to a delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    Ignored(IgnoreReason),
    Applied {
        outcome: ApplyOutcome,
        /// Present when the job was triggered.
        trigger: Option<TriggerReport>,
    },
}

struct Inner<B> {
    cache: DependencyCache,
    filter: RepositoryFilter,
    trigger: JobTrigger<B>,
}

/// Shared pipeline handle.
pub struct Ingest<B> {
    inner: Arc<Inner<B>>,
}

impl<B> Clone for Ingest<B> {
    fn clone(&self) -> Self {
        Ingest {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: BuildSystem> Ingest<B> {
    pub fn new(cache: DependencyCache, filter: RepositoryFilter, trigger: JobTrigger<B>) -> Self {
        Ingest {
            inner: Arc::new(Inner {
                cache,
                filter,
                trigger,
            }),
        }
    }

    pub fn cache(&self) -> &DependencyCache {
        &self.inner.cache
    }

    pub fn filter(&self) -> &RepositoryFilter {
        &self.inner.filter
    }

    /// Runs one `pull_request` delivery through the pipeline.
    #[instrument(
        skip_all,
        fields(action = %event.action, repo = %event.repository, pr = event.number)
    )]
    pub async fn handle_pull_request(&self, event: &PullRequestEvent) -> IngestOutcome {
        info!(branch = %event.branch, "Got pull request payload");

        if event.repository.is_empty() {
            return IngestOutcome::Ignored(IgnoreReason::EmptyRepository);
        }
        if event.body.is_empty() {
            debug!("Ignoring pull request with empty description");
            return IngestOutcome::Ignored(IgnoreReason::EmptyBody);
        }
        if !self.inner.filter.should_include(&event.repository) {
            info!("Payload rejected: repository does not match the rules");
            return IngestOutcome::Ignored(IgnoreReason::Filtered);
        }

        let Some(action) = PrAction::parse(&event.action) else {
            debug!("Ignoring unsupported action");
            return IngestOutcome::Ignored(IgnoreReason::UnsupportedAction(event.action.clone()));
        };

        let tokens = extract_dependency_tokens(&event.body);
        info!(depends_on = ?tokens, "Extracted dependency directives");

        let key = PrKey::new(event.repository.as_str(), event.number);
        let cache_event = CacheEvent::new(action, key.clone(), event.branch.clone(), tokens);
        let outcome = self.apply(&cache_event).await;

        let trigger = if outcome.trigger_job {
            Some(self.inner.trigger.trigger(&key).await)
        } else {
            None
        };

        IngestOutcome::Applied { outcome, trigger }
    }

    async fn apply(&self, event: &CacheEvent) -> ApplyOutcome {
        self.inner.cache.apply_event(event, ApplyMode::Full).await
    }
}
