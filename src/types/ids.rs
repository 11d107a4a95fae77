//! Newtype wrappers for domain identifiers.
//!
//! These types prevent accidental mixing of repository names, pull request
//! numbers, and branch names, and make map keys in the dependency graph
//! self-documenting.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A pull request number within a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrNumber(pub u64);

impl fmt::Display for PrNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for PrNumber {
    fn from(n: u64) -> Self {
        PrNumber(n)
    }
}

/// A repository name, without the owner.
///
/// Dependency directives only ever name repositories belonging to the
/// configured owner, so the owner is not part of the identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepoName(pub String);

impl RepoName {
    pub fn new(s: impl Into<String>) -> Self {
        RepoName(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RepoName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RepoName {
    fn from(s: String) -> Self {
        RepoName(s)
    }
}

impl From<&str> for RepoName {
    fn from(s: &str) -> Self {
        RepoName(s.to_string())
    }
}

/// Identifies a tracked pull request: repository name plus number.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PrKey {
    pub repo: RepoName,
    pub number: PrNumber,
}

impl PrKey {
    pub fn new(repo: impl Into<RepoName>, number: impl Into<PrNumber>) -> Self {
        PrKey {
            repo: repo.into(),
            number: number.into(),
        }
    }
}

impl fmt::Display for PrKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Same form as a DependsOn token: `repo#number`
        write!(f, "{}{}", self.repo, self.number)
    }
}
