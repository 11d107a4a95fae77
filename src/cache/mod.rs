//! The in-memory pull request dependency cache.
//!
//! [`DependencyCache`] is a cheaply cloneable handle shared by the webhook
//! handler, the bootstrap loader and the read endpoint. Updates take the
//! write lock for the whole of [`apply_event`], so two events never
//! interleave. Snapshots take the read lock and therefore never observe a
//! half-applied event.

pub mod engine;
pub mod graph;
mod snapshot;


use std::sync::Arc;

use tokio::sync::RwLock;

pub use engine::{ApplyMode, ApplyOutcome, CacheEvent, apply_event};
pub use graph::{DependencyGraph, EdgeSet};
pub use snapshot::{CacheSnapshot, SNAPSHOT_VERSION};

/// Shared handle to the dependency graph.
#[derive(Debug, Clone, Default)]
pub struct DependencyCache {
    graph: Arc<RwLock<DependencyGraph>>,
}

impl DependencyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one event under the write lock.
    pub async fn apply_event(&self, event: &CacheEvent, mode: ApplyMode) -> ApplyOutcome {
        let mut graph = self.graph.write().await;
        apply_event(&mut graph, event, mode)
    }

    /// Returns a consistent copy of the whole cache.
    pub async fn snapshot(&self) -> CacheSnapshot {
        let graph = self.graph.read().await;
        CacheSnapshot::from_graph(&graph)
    }

    /// Number of open pull requests currently tracked.
    pub async fn open_count(&self) -> usize {
        self.graph.read().await.branches().len()
    }
}
