//! Immutable, serializable copy of the dependency cache.
//!
//! This is what the read endpoint returns. The JSON shape is:
//!
//! ```json
//! {
//!   "branches":     { "svc": { "1": "feature/x" } },
//!   "dependencies": { "svc": { "1": { "lib": 5 } } },
//!   "dependents":   { "lib": { "5": { "svc": 1 } } },
//!   "version": "1"
//! }
//! ```
//!
//! PR numbers used as object keys are rendered as decimal strings.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{PrNumber, RepoName};

use super::graph::{DependencyGraph, EdgeSet};

/// Format version of the snapshot document.
pub const SNAPSHOT_VERSION: &str = "1";

/// A point-in-time copy of the dependency cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    pub branches: BTreeMap<RepoName, BTreeMap<PrNumber, String>>,
    pub dependencies: BTreeMap<RepoName, BTreeMap<PrNumber, EdgeSet>>,
    pub dependents: BTreeMap<RepoName, BTreeMap<PrNumber, EdgeSet>>,
    pub version: String,
}

impl CacheSnapshot {
    pub(crate) fn from_graph(graph: &DependencyGraph) -> Self {
        CacheSnapshot {
            branches: graph.branches().as_map().clone(),
            dependencies: graph.dependencies().as_map().clone(),
            dependents: graph.dependents().as_map().clone(),
            version: SNAPSHOT_VERSION.to_string(),
        }
    }
}
