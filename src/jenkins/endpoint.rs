//! Configured build system endpoints.
//!
//! An endpoint is a path template plus its own retry policy and accepted
//! status codes. Retry settings are kept as written and only interpreted when
//! a trigger runs, so a bad value aborts that trigger instead of startup.

use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

use serde::Deserialize;

use crate::types::PrKey;

use super::error::EndpointConfigError;

const REPOSITORY_PLACEHOLDER: &str = "{{.repository}}";
const NUMBER_PLACEHOLDER: &str = "{{.number}}";

/// A setting that may be written as a JSON string or number.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawSetting {
    Number(i64),
    Text(String),
}

impl Default for RawSetting {
    fn default() -> Self {
        RawSetting::Text(String::new())
    }
}

impl RawSetting {
    /// Interprets the setting as a non-negative integer.
    pub fn as_non_negative(&self) -> Option<u64> {
        match self {
            RawSetting::Number(n) => u64::try_from(*n).ok(),
            RawSetting::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for RawSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawSetting::Number(n) => write!(f, "{}", n),
            RawSetting::Text(s) => f.write_str(s),
        }
    }
}

/// Accepted HTTP status codes, parsed from `"200,201"` or `201`.
///
/// Entries that are not valid status codes are dropped. An empty set accepts
/// any 2xx status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "RawSetting")]
pub struct StatusSet(BTreeSet<u16>);

impl StatusSet {
    pub fn accepts(&self, status: u16) -> bool {
        if self.0.is_empty() {
            (200..300).contains(&status)
        } else {
            self.0.contains(&status)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<RawSetting> for StatusSet {
    fn from(raw: RawSetting) -> Self {
        let codes: Vec<u16> = match raw {
            RawSetting::Number(n) => u16::try_from(n).into_iter().collect(),
            RawSetting::Text(s) => s
                .split(',')
                .filter_map(|part| part.trim().parse::<u16>().ok())
                .collect(),
        };
        StatusSet(
            codes
                .into_iter()
                .filter(|code| (100..600).contains(code))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RetrySettings {
    /// Seconds to wait between attempts.
    #[serde(default)]
    pub delay: RawSetting,
    /// Maximum number of attempts.
    #[serde(default)]
    pub count: RawSetting,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SuccessCriteria {
    #[serde(default)]
    pub http_status: StatusSet,
}

/// One build system call made for every triggered pull request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EndpointDefinition {
    /// Path relative to the build system base URL. May contain
    /// `{{.repository}}` and `{{.number}}`.
    pub path: String,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub success: SuccessCriteria,
}

impl EndpointDefinition {
    pub fn retry_delay(&self) -> Result<Duration, EndpointConfigError> {
        self.retry
            .delay
            .as_non_negative()
            .map(Duration::from_secs)
            .ok_or_else(|| EndpointConfigError::InvalidDelay {
                path: self.path.clone(),
                value: self.retry.delay.to_string(),
            })
    }

    pub fn retry_count(&self) -> Result<u64, EndpointConfigError> {
        self.retry
            .count
            .as_non_negative()
            .ok_or_else(|| EndpointConfigError::InvalidCount {
                path: self.path.clone(),
                value: self.retry.count.to_string(),
            })
    }

    pub fn accepts(&self, status: u16) -> bool {
        self.success.http_status.accepts(status)
    }

    /// Substitutes the pull request into the path template.
    pub fn render_path(&self, pr: &PrKey) -> String {
        self.path
            .replace(REPOSITORY_PLACEHOLDER, pr.repo.as_str())
            .replace(NUMBER_PLACEHOLDER, &pr.number.0.to_string())
    }
}
