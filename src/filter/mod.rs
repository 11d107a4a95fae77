//! Repository Filter: decides which repositories are in scope.
//!
//! Inclusion rules are evaluated first, in order; the first match includes
//! the repository. Exclusion rules are then evaluated in order; the first
//! match excludes it again. A repository that matches no inclusion rule is
//! out of scope whatever the exclusions say.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// A repository rule as written in the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRuleConfig {
    /// Literal repository name, `*`, or a regex pattern.
    pub name: String,
    /// Interpret `name` as a regex (unanchored search).
    #[serde(default)]
    pub regexp: bool,
}

/// A compiled repository rule.
#[derive(Debug, Clone)]
pub enum RepositoryRule {
    /// `*`: matches every repository.
    Any,
    /// Exact repository name.
    Literal(String),
    /// Regex searched anywhere in the name.
    Pattern(Regex),
}

impl RepositoryRule {
    /// Compiles a configured rule.
    ///
    /// `*` is only a wildcard for literal rules; as a regex it is invalid.
    pub fn compile(config: &RepositoryRuleConfig) -> Result<Self, regex::Error> {
        if config.regexp {
            Ok(RepositoryRule::Pattern(Regex::new(&config.name)?))
        } else if config.name == "*" {
            Ok(RepositoryRule::Any)
        } else {
            Ok(RepositoryRule::Literal(config.name.clone()))
        }
    }

    pub fn matches(&self, repo: &str) -> bool {
        match self {
            RepositoryRule::Any => true,
            RepositoryRule::Literal(name) => name == repo,
            RepositoryRule::Pattern(re) => re.is_match(repo),
        }
    }
}

/// Ordered inclusion and exclusion rules.
#[derive(Debug, Clone, Default)]
pub struct RepositoryFilter {
    include: Vec<RepositoryRule>,
    exclude: Vec<RepositoryRule>,
}

impl RepositoryFilter {
    pub fn new(include: Vec<RepositoryRule>, exclude: Vec<RepositoryRule>) -> Self {
        RepositoryFilter { include, exclude }
    }

    /// A filter that rejects every repository.
    pub fn reject_all() -> Self {
        Self::default()
    }

    /// Compiles the configured rule lists.
    pub fn compile(
        include: &[RepositoryRuleConfig],
        exclude: &[RepositoryRuleConfig],
    ) -> Result<Self, regex::Error> {
        let include = include
            .iter()
            .map(RepositoryRule::compile)
            .collect::<Result<Vec<_>, _>>()?;
        let exclude = exclude
            .iter()
            .map(RepositoryRule::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RepositoryFilter { include, exclude })
    }

    /// Returns true if `repo` is in scope.
    pub fn should_include(&self, repo: &str) -> bool {
        let included = self.include.iter().any(|rule| rule.matches(repo));
        included && !self.exclude.iter().any(|rule| rule.matches(repo))
    }
}
