//! Pull request lifecycle actions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle action carried by a `pull_request` event.
///
/// Only the four actions that affect the dependency graph are represented.
/// Other GitHub actions (`labeled`, `synchronize`, ...) parse to `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrAction {
    /// PR was opened.
    Opened,
    /// PR title, body or base was edited.
    Edited,
    /// PR was reopened after being closed.
    Reopened,
    /// PR was closed (merged or not).
    Closed,
}

impl PrAction {
    /// Parses a GitHub action string.
    pub fn parse(action: &str) -> Option<Self> {
        match action {
            "opened" => Some(PrAction::Opened),
            "edited" => Some(PrAction::Edited),
            "reopened" => Some(PrAction::Reopened),
            "closed" => Some(PrAction::Closed),
            _ => None,
        }
    }

    /// Returns true for actions that leave the PR open and tracked.
    pub fn is_open(&self) -> bool {
        !matches!(self, PrAction::Closed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PrAction::Opened => "opened",
            PrAction::Edited => "edited",
            PrAction::Reopened => "reopened",
            PrAction::Closed => "closed",
        }
    }
}

impl fmt::Display for PrAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
