//! Daemon configuration.
//!
//! The configuration is a single JSON file read once at startup. Everything
//! that can be checked up front (the listen port, repository rule patterns)
//! is validated by [`Config::load`]; endpoint retry settings are kept raw
//! and interpreted each time a job is triggered.

use std::fmt;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::filter::{RepositoryFilter, RepositoryRuleConfig};
use crate::jenkins::{EndpointDefinition, RawSetting};
use crate::server::ApiToken;
use crate::webhooks::WebhookSecret;

/// Errors that can occur while loading the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Which repositories are tracked and who owns them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DependsOnConfig {
    pub owner: String,
    /// Whether `owner` is an organization rather than a user.
    #[serde(default)]
    pub organization: bool,
    #[serde(default)]
    pub repositories: Vec<RepositoryRuleConfig>,
    #[serde(default)]
    pub exclude_repositories: Vec<RepositoryRuleConfig>,
}

/// Build system credentials and the endpoints hit when a job is triggered.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
pub struct JenkinsConfig {
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub endpoints: Vec<EndpointDefinition>,
}

impl fmt::Debug for JenkinsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JenkinsConfig")
            .field("user", &self.user)
            .field("token", &redacted(&self.token))
            .field("base_url", &self.base_url)
            .field("endpoints", &self.endpoints)
            .finish()
    }
}

/// The whole configuration file.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    /// Listen port, written as a string or a number.
    pub port: RawSetting,
    /// GitHub personal access token used for the bootstrap listings.
    #[serde(default)]
    pub token: String,
    /// Webhook secret. Empty disables signature verification.
    #[serde(default)]
    pub secret: String,
    #[serde(default)]
    pub api_token_header: String,
    #[serde(default)]
    pub api_token_value: String,
    /// Absent means no repository is tracked.
    #[serde(default)]
    pub pull_request_depends_on: Option<DependsOnConfig>,
    #[serde(default)]
    pub jenkins: JenkinsConfig,
}

impl Config {
    /// Reads, parses and validates a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    /// Parses and validates configuration JSON.
    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(contents)?;
        config.listen_addr()?;
        config.repository_filter()?;
        Ok(config)
    }

    /// The address the server binds, `0.0.0.0:<port>`.
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        let port = self
            .port
            .as_non_negative()
            .and_then(|p| u16::try_from(p).ok())
            .ok_or_else(|| ConfigError::Invalid(format!("port '{}' is not valid", self.port)))?;
        Ok(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)))
    }

    /// Compiles the repository rules. Without a `pull_request_depends_on`
    /// section every repository is rejected.
    pub fn repository_filter(&self) -> Result<RepositoryFilter, ConfigError> {
        match &self.pull_request_depends_on {
            None => Ok(RepositoryFilter::reject_all()),
            Some(depends_on) => RepositoryFilter::compile(
                &depends_on.repositories,
                &depends_on.exclude_repositories,
            )
            .map_err(|e| ConfigError::Invalid(format!("repository rule: {}", e))),
        }
    }

    pub fn webhook_secret(&self) -> Option<WebhookSecret> {
        (!self.secret.is_empty()).then(|| WebhookSecret::new(self.secret.as_str()))
    }

    pub fn api_token(&self) -> Option<ApiToken> {
        ApiToken::from_parts(self.api_token_header.as_str(), self.api_token_value.as_str())
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("token", &redacted(&self.token))
            .field("secret", &redacted(&self.secret))
            .field("api_token_header", &self.api_token_header)
            .field("api_token_value", &redacted(&self.api_token_value))
            .field("pull_request_depends_on", &self.pull_request_depends_on)
            .field("jenkins", &self.jenkins)
            .finish()
    }
}

fn redacted(value: &str) -> &'static str {
    if value.is_empty() { "" } else { "***" }
}
