//! Cache update engine: applies one lifecycle event to the dependency graph.
//!
//! This is a pure function over [`DependencyGraph`]. Exclusive access is the
//! caller's responsibility (see [`super::DependencyCache`]); the engine never
//! performs I/O and never triggers jobs itself. It reports whether a job
//! should be triggered and the caller acts on that once the lock is released.
//!
//! # Algorithm
//!
//! 1. `opened`/`edited`/`reopened` record the branch; `closed` removes it.
//! 2. In [`ApplyMode::BranchesOnly`] processing stops here.
//! 3. Open actions replace the PR's dependency edges wholesale: old edges are
//!    unlinked (stale targets tidied up), then each declared token whose
//!    target is open becomes an edge. Tokens naming unknown PRs are tidied
//!    up and skipped.
//! 4. `closed` removes the PR's own forward and reverse nodes, unlinks the
//!    reverse entries named by the supplied tokens, and tidies up stale
//!    targets. Dependents keep their edges to the closed PR until their own
//!    next update drops them.
//! 5. `edited` requests a job trigger when the dependency set changed.

use tracing::{debug, trace};

use crate::directives::parse_dependency_token;
use crate::types::{PrAction, PrKey};

use super::graph::{DependencyGraph, EdgeSet};

/// A lifecycle event, already normalized and with directives extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEvent {
    pub action: PrAction,
    pub key: PrKey,
    /// Head branch of the PR.
    pub branch: String,
    /// `repo#number` tokens. For `closed`, the last known set.
    pub dependency_tokens: Vec<String>,
}

impl CacheEvent {
    pub fn new(
        action: PrAction,
        key: PrKey,
        branch: impl Into<String>,
        dependency_tokens: Vec<String>,
    ) -> Self {
        CacheEvent {
            action,
            key,
            branch: branch.into(),
            dependency_tokens,
        }
    }
}

/// How much of an event to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApplyMode {
    /// Update the branch index only.
    ///
    /// Used by the first bootstrap pass, when not all branches are known yet
    /// and dependency targets cannot be validated.
    BranchesOnly,

    /// Update branches and dependency edges.
    #[default]
    Full,
}

/// What an applied event changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// Dependencies of the PR before the event.
    pub before: EdgeSet,
    /// Dependencies of the PR after the event.
    pub after: EdgeSet,
    /// True when the event requires the PR's job to be triggered.
    pub trigger_job: bool,
}

impl ApplyOutcome {
    fn unchanged(edges: EdgeSet) -> Self {
        ApplyOutcome {
            before: edges.clone(),
            after: edges,
            trigger_job: false,
        }
    }
}

/// Applies one lifecycle event to the graph.
pub fn apply_event(
    graph: &mut DependencyGraph,
    event: &CacheEvent,
    mode: ApplyMode,
) -> ApplyOutcome {
    let key = &event.key;

    if event.action.is_open() {
        graph.set_branch(key, event.branch.clone());
    } else {
        graph.remove_branch(key);
    }

    if mode == ApplyMode::BranchesOnly {
        let current = graph.dependencies_of(key).cloned().unwrap_or_default();
        return ApplyOutcome::unchanged(current);
    }

    let targets: Vec<PrKey> = event
        .dependency_tokens
        .iter()
        .filter_map(|token| {
            let parsed = parse_dependency_token(token);
            if parsed.is_none() {
                trace!(token = %token, "Dropping malformed dependency token");
            }
            parsed
        })
        .collect();

    let (before, after) = if event.action.is_open() {
        apply_open(graph, key, &targets)
    } else {
        apply_close(graph, key, &targets)
    };

    let trigger_job = event.action == PrAction::Edited && before != after;
    if trigger_job {
        debug!(pr = %key, ?before, ?after, "Dependencies changed");
    }

    ApplyOutcome {
        before,
        after,
        trigger_job,
    }
}

/// Recomputes the dependency edges of an open PR.
fn apply_open(
    graph: &mut DependencyGraph,
    key: &PrKey,
    targets: &[PrKey],
) -> (EdgeSet, EdgeSet) {
    let before = graph.clear_dependencies(key);

    for (repo, number) in &before {
        let old_target = PrKey::new(repo.clone(), *number);
        if graph.purge_if_stale(&old_target) {
            debug!(pr = %old_target, "Tidied up closed dependency");
        }
    }

    for target in targets {
        if graph.is_open(target) {
            graph.link(key, target);
        } else {
            graph.purge_if_stale(target);
            debug!(pr = %key, target = %target, "Skipping dependency on unknown pull request");
        }
    }

    let after = graph.dependencies_of(key).cloned().unwrap_or_default();
    (before, after)
}

/// Removes a closed PR from the dependency graph.
fn apply_close(
    graph: &mut DependencyGraph,
    key: &PrKey,
    targets: &[PrKey],
) -> (EdgeSet, EdgeSet) {
    let before = graph.dependencies_of(key).cloned().unwrap_or_default();
    graph.remove_node(key);

    let known_targets = before
        .iter()
        .map(|(repo, number)| PrKey::new(repo.clone(), *number));

    for target in targets.iter().cloned().chain(known_targets) {
        graph.unlink_dependent(&target, key);
        graph.purge_if_stale(&target);
    }

    (before, EdgeSet::new())
}
