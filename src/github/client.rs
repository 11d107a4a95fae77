//! Octocrab client scoped to the configured repository owner.
//!
//! Only the two listings needed by the bootstrap loader are implemented.
//! Both page through results 100 at a time and retry transient failures.

use octocrab::Octocrab;
use octocrab::models::Repository;
use octocrab::models::pulls::PullRequest;
use serde::Serialize;

use crate::bootstrap::{PullRequestRecord, PullRequestSource};
use crate::directives::extract_dependency_tokens;
use crate::types::{PrNumber, RepoName};

use super::error::GitHubApiError;
use super::retry::{RetryConfig, retry_with_backoff};

const PAGE_SIZE: u8 = 100;

#[derive(Serialize)]
struct PageParams {
    per_page: u8,
    page: u32,
}

/// A GitHub API client for one user or organization.
#[derive(Clone)]
pub struct GitHubClient {
    client: Octocrab,
    owner: String,
    organization: bool,
    retry: RetryConfig,
}

impl GitHubClient {
    pub fn new(client: Octocrab, owner: impl Into<String>, organization: bool) -> Self {
        Self {
            client,
            owner: owner.into(),
            organization,
            retry: RetryConfig::DEFAULT,
        }
    }

    /// Creates a client from a personal access token.
    pub fn from_token(
        token: impl Into<String>,
        owner: impl Into<String>,
        organization: bool,
    ) -> Result<Self, octocrab::Error> {
        let client = Octocrab::builder().personal_token(token.into()).build()?;
        Ok(Self::new(client, owner, organization))
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// The repository listing route for the owner.
    fn repositories_route(&self) -> String {
        if self.organization {
            format!("/orgs/{}/repos", self.owner)
        } else {
            format!("/users/{}/repos", self.owner)
        }
    }

    async fn repositories_page(&self, page: u32) -> Result<Vec<Repository>, GitHubApiError> {
        let params = PageParams {
            per_page: PAGE_SIZE,
            page,
        };
        self.client
            .get(self.repositories_route(), Some(&params))
            .await
            .map_err(GitHubApiError::from_octocrab)
    }

    async fn pull_requests_page(
        &self,
        repo: &RepoName,
        page: u32,
    ) -> Result<Vec<PullRequest>, GitHubApiError> {
        self.client
            .pulls(&self.owner, repo.as_str())
            .list()
            .state(octocrab::params::State::Open)
            .per_page(PAGE_SIZE)
            .page(page)
            .send()
            .await
            .map(|page| page.items)
            .map_err(GitHubApiError::from_octocrab)
    }
}

impl PullRequestSource for GitHubClient {
    async fn list_repositories(&self) -> Result<Vec<RepoName>, GitHubApiError> {
        let mut page = 1u32;
        let mut names = Vec::new();

        loop {
            let items = retry_with_backoff(self.retry, || self.repositories_page(page)).await?;
            let is_last_page = items.len() < usize::from(PAGE_SIZE);
            names.extend(items.into_iter().map(|repo| RepoName::new(repo.name)));

            if is_last_page {
                break;
            }
            page += 1;
        }

        Ok(names)
    }

    async fn list_pull_requests(
        &self,
        repo: &RepoName,
    ) -> Result<Vec<PullRequestRecord>, GitHubApiError> {
        let mut page = 1u32;
        let mut records = Vec::new();

        loop {
            let items =
                retry_with_backoff(self.retry, || self.pull_requests_page(repo, page)).await?;
            let is_last_page = items.len() < usize::from(PAGE_SIZE);
            records.extend(items.into_iter().map(|pull| to_record(repo, pull)));

            if is_last_page {
                break;
            }
            page += 1;
        }

        Ok(records)
    }
}

fn to_record(repo: &RepoName, pull: PullRequest) -> PullRequestRecord {
    PullRequestRecord {
        repository: repo.clone(),
        number: PrNumber(pull.number),
        branch: pull.head.ref_field,
        depends_on: pull
            .body
            .as_deref()
            .map(extract_dependency_tokens)
            .unwrap_or_default(),
    }
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("owner", &self.owner)
            .field("organization", &self.organization)
            .finish_non_exhaustive()
    }
}
