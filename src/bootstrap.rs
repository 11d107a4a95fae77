//! Bootstrap loader: fills the cache from the current state on GitHub.
//!
//! Loading happens in two strictly ordered passes over the same listings:
//!
//! 1. Every open pull request is applied as `opened` in
//!    [`ApplyMode::BranchesOnly`], so the branch index knows every PR before
//!    any dependency is validated.
//! 2. Every open pull request is applied again as `opened` in
//!    [`ApplyMode::Full`], creating the dependency edges.
//!
//! `opened` never triggers a job, so bootstrap never calls the build system.

use std::future::Future;

use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::cache::{ApplyMode, CacheEvent, DependencyCache};
use crate::filter::RepositoryFilter;
use crate::github::GitHubApiError;
use crate::types::{PrAction, PrKey, PrNumber, RepoName};

/// An open pull request as listed by the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRecord {
    pub repository: RepoName,
    pub number: PrNumber,
    /// Head branch.
    pub branch: String,
    /// Dependency tokens extracted from the description.
    pub depends_on: Vec<String>,
}

impl PullRequestRecord {
    pub fn key(&self) -> PrKey {
        PrKey {
            repo: self.repository.clone(),
            number: self.number,
        }
    }

    fn to_event(&self) -> CacheEvent {
        CacheEvent::new(
            PrAction::Opened,
            self.key(),
            self.branch.clone(),
            self.depends_on.clone(),
        )
    }
}

/// Lists repositories and their open pull requests.
pub trait PullRequestSource: Send + Sync {
    /// Lists the names of all repositories of the configured owner.
    fn list_repositories(
        &self,
    ) -> impl Future<Output = Result<Vec<RepoName>, GitHubApiError>> + Send;

    /// Lists the open pull requests of one repository.
    fn list_pull_requests(
        &self,
        repo: &RepoName,
    ) -> impl Future<Output = Result<Vec<PullRequestRecord>, GitHubApiError>> + Send;
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("failed to list repositories: {0}")]
    ListRepositories(#[source] GitHubApiError),

    #[error("failed to list pull requests of {repo}: {source}")]
    ListPullRequests {
        repo: RepoName,
        #[source]
        source: GitHubApiError,
    },
}

/// What the bootstrap loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    /// Repositories that passed the filter.
    pub repositories: Vec<RepoName>,
    /// Open pull requests seen in the final pass.
    pub pull_requests: usize,
    /// Dependency edges in the cache after loading.
    pub dependencies: usize,
}

/// Loads the current state of all in-scope repositories into the cache.
#[instrument(skip_all)]
pub async fn bootstrap<S: PullRequestSource>(
    source: &S,
    filter: &RepositoryFilter,
    cache: &DependencyCache,
) -> Result<BootstrapReport, BootstrapError> {
    let repositories: Vec<RepoName> = source
        .list_repositories()
        .await
        .map_err(BootstrapError::ListRepositories)?
        .into_iter()
        .filter(|repo| filter.should_include(repo.as_str()))
        .collect();

    info!(count = repositories.len(), repositories = ?repositories, "Repositories in scope");

    load_pass(source, &repositories, cache, ApplyMode::BranchesOnly).await?;
    let pull_requests = load_pass(source, &repositories, cache, ApplyMode::Full).await?;

    let snapshot = cache.snapshot().await;
    let branches: usize = snapshot.branches.values().map(|prs| prs.len()).sum();
    let dependencies: usize = snapshot
        .dependencies
        .values()
        .flat_map(|prs| prs.values())
        .map(|edges| edges.len())
        .sum();

    info!(branches, dependencies, "Cache loaded");

    Ok(BootstrapReport {
        repositories,
        pull_requests,
        dependencies,
    })
}

/// One pass over every repository. Returns the number of pull requests seen.
async fn load_pass<S: PullRequestSource>(
    source: &S,
    repositories: &[RepoName],
    cache: &DependencyCache,
    mode: ApplyMode,
) -> Result<usize, BootstrapError> {
    let mut seen = 0;
    for repo in repositories {
        let records = source.list_pull_requests(repo).await.map_err(|source| {
            BootstrapError::ListPullRequests {
                repo: repo.clone(),
                source,
            }
        })?;
        debug!(repo = %repo, count = records.len(), ?mode, "Loading pull requests");

        for record in &records {
            cache.apply_event(&record.to_event(), mode).await;
        }
        seen += records.len();
    }
    Ok(seen)
}
