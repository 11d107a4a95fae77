//! Typed dependency graph: branch index plus forward and reverse edge indices.
//!
//! All edge mutation goes through [`DependencyGraph`], which keeps every
//! reverse entry backed by a forward edge. Callers never touch the nested
//! maps directly.
//!
//! # Shape
//!
//! - `branches`: repo → number → branch name. Presence means the PR is open.
//! - `dependencies`: dependent PR → target repo → target number.
//! - `dependents`: target PR → dependent repo → dependent number.
//!
//! Both edge indices hold at most one edge per (node, repository) pair. A
//! second edge to the same repository replaces the first.

use std::collections::BTreeMap;

use crate::types::{PrKey, PrNumber, RepoName};

/// The edges of one node, keyed by the repository at the other end.
pub type EdgeSet = BTreeMap<RepoName, PrNumber>;

/// Index of open pull requests and their head branches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchIndex {
    repos: BTreeMap<RepoName, BTreeMap<PrNumber, String>>,
}

impl BranchIndex {
    /// Returns the branch of an open PR.
    pub fn get(&self, key: &PrKey) -> Option<&str> {
        self.repos
            .get(&key.repo)
            .and_then(|prs| prs.get(&key.number))
            .map(String::as_str)
    }

    pub fn contains(&self, key: &PrKey) -> bool {
        self.get(key).is_some()
    }

    fn insert(&mut self, key: &PrKey, branch: String) {
        self.repos
            .entry(key.repo.clone())
            .or_default()
            .insert(key.number, branch);
    }

    fn remove(&mut self, key: &PrKey) -> Option<String> {
        let prs = self.repos.get_mut(&key.repo)?;
        let removed = prs.remove(&key.number);
        if prs.is_empty() {
            self.repos.remove(&key.repo);
        }
        removed
    }

    /// Number of open PRs across all repositories.
    pub fn len(&self) -> usize {
        self.repos.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.repos.is_empty()
    }

    pub fn as_map(&self) -> &BTreeMap<RepoName, BTreeMap<PrNumber, String>> {
        &self.repos
    }
}

/// One direction of the edge relation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeIndex {
    nodes: BTreeMap<RepoName, BTreeMap<PrNumber, EdgeSet>>,
}

impl EdgeIndex {
    /// Returns the edges of a node, if the node exists.
    pub fn get(&self, key: &PrKey) -> Option<&EdgeSet> {
        self.nodes
            .get(&key.repo)
            .and_then(|prs| prs.get(&key.number))
    }

    pub fn contains_node(&self, key: &PrKey) -> bool {
        self.get(key).is_some()
    }

    /// Returns the edges of a node, inserting an empty node if absent.
    fn node_mut(&mut self, key: &PrKey) -> &mut EdgeSet {
        self.nodes
            .entry(key.repo.clone())
            .or_default()
            .entry(key.number)
            .or_default()
    }

    fn remove_node(&mut self, key: &PrKey) -> Option<EdgeSet> {
        let prs = self.nodes.get_mut(&key.repo)?;
        let removed = prs.remove(&key.number);
        if prs.is_empty() {
            self.nodes.remove(&key.repo);
        }
        removed
    }

    /// Removes `key`'s edge towards `other.repo`, but only if it points at
    /// `other.number`. Returns true if an edge was removed.
    fn remove_edge_to(&mut self, key: &PrKey, other: &PrKey) -> bool {
        let Some(edges) = self
            .nodes
            .get_mut(&key.repo)
            .and_then(|prs| prs.get_mut(&key.number))
        else {
            return false;
        };
        if edges.get(&other.repo) == Some(&other.number) {
            edges.remove(&other.repo);
            true
        } else {
            false
        }
    }

    /// Iterates over all nodes and their edge sets.
    pub fn iter(&self) -> impl Iterator<Item = (PrKey, &EdgeSet)> + '_ {
        self.nodes.iter().flat_map(|(repo, prs)| {
            prs.iter()
                .map(move |(number, edges)| (PrKey::new(repo.clone(), *number), edges))
        })
    }

    /// Total number of edges in this direction.
    pub fn edge_count(&self) -> usize {
        self.nodes
            .values()
            .flat_map(BTreeMap::values)
            .map(BTreeMap::len)
            .sum()
    }

    pub fn as_map(&self) -> &BTreeMap<RepoName, BTreeMap<PrNumber, EdgeSet>> {
        &self.nodes
    }
}

/// The dependency graph between pull requests.
///
/// Invariants maintained by every mutation:
/// - Every reverse entry `dependents[t][r] == n` is backed by the forward edge
///   `dependencies[r#n][t.repo] == t.number`.
/// - Removing a node removes its forward edges together with their mirrors,
///   and its own reverse node. Forward edges of its dependents are left in
///   place until those dependents are next updated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    branches: BranchIndex,
    dependencies: EdgeIndex,
    dependents: EdgeIndex,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn branches(&self) -> &BranchIndex {
        &self.branches
    }

    pub fn dependencies(&self) -> &EdgeIndex {
        &self.dependencies
    }

    pub fn dependents(&self) -> &EdgeIndex {
        &self.dependents
    }

    /// Returns true if the PR has a branch entry (is open and tracked).
    pub fn is_open(&self, key: &PrKey) -> bool {
        self.branches.contains(key)
    }

    pub fn set_branch(&mut self, key: &PrKey, branch: impl Into<String>) {
        self.branches.insert(key, branch.into());
    }

    pub fn remove_branch(&mut self, key: &PrKey) -> Option<String> {
        self.branches.remove(key)
    }

    /// Returns the forward edges of a PR.
    pub fn dependencies_of(&self, key: &PrKey) -> Option<&EdgeSet> {
        self.dependencies.get(key)
    }

    /// Returns the reverse edges of a PR.
    pub fn dependents_of(&self, key: &PrKey) -> Option<&EdgeSet> {
        self.dependents.get(key)
    }

    /// Resets the forward edges of `dependent` to an empty set, unlinking the
    /// reverse entry of every edge it had. Returns the previous edges.
    pub fn clear_dependencies(&mut self, dependent: &PrKey) -> EdgeSet {
        let before = std::mem::take(self.dependencies.node_mut(dependent));
        for (repo, number) in &before {
            let target = PrKey::new(repo.clone(), *number);
            self.dependents.remove_edge_to(&target, dependent);
        }
        before
    }

    /// Adds the edge `dependent → target` and its mirror.
    ///
    /// If `dependent` already depends on another PR in `target.repo`, that
    /// edge is replaced and its mirror removed.
    pub fn link(&mut self, dependent: &PrKey, target: &PrKey) {
        let replaced = self
            .dependencies
            .node_mut(dependent)
            .insert(target.repo.clone(), target.number);

        if let Some(previous) = replaced.filter(|n| *n != target.number) {
            let old_target = PrKey::new(target.repo.clone(), previous);
            self.dependents.remove_edge_to(&old_target, dependent);
        }

        self.dependents
            .node_mut(target)
            .insert(dependent.repo.clone(), dependent.number);
    }

    /// Removes the reverse entry `target ← dependent` if it names `dependent`.
    pub fn unlink_dependent(&mut self, target: &PrKey, dependent: &PrKey) -> bool {
        self.dependents.remove_edge_to(target, dependent)
    }

    /// Removes the forward and reverse nodes of `key`. Returns true if
    /// anything was removed.
    ///
    /// Dependents keep their forward edges to `key`, so their next update
    /// still sees the old dependency and can report the change.
    pub fn remove_node(&mut self, key: &PrKey) -> bool {
        let forward = self.dependencies.remove_node(key);
        for (repo, number) in forward.iter().flatten() {
            let target = PrKey::new(repo.clone(), *number);
            self.dependents.remove_edge_to(&target, key);
        }

        let reverse = self.dependents.remove_node(key);
        forward.is_some() || reverse.is_some()
    }

    /// Tidy-up: removes the nodes of `key` if its branch is gone.
    pub fn purge_if_stale(&mut self, key: &PrKey) -> bool {
        if self.is_open(key) {
            return false;
        }
        self.remove_node(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(repo: &str, n: u64) -> PrKey {
        PrKey::new(repo, n)
    }

    fn open_graph(keys: &[PrKey]) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        for k in keys {
            graph.set_branch(k, format!("feature/{}", k.number.0));
        }
        graph
    }

    mod branch_index {
        use super::*;

        #[test]
        fn set_and_remove_branch() {
            let mut graph = DependencyGraph::new();
            let svc = key("svc", 1);

            graph.set_branch(&svc, "feature/a");
            assert_eq!(graph.branches().get(&svc), Some("feature/a"));
            assert!(graph.is_open(&svc));

            graph.set_branch(&svc, "feature/b");
            assert_eq!(graph.branches().get(&svc), Some("feature/b"));
            assert_eq!(graph.branches().len(), 1);

            assert_eq!(graph.remove_branch(&svc), Some("feature/b".to_string()));
            assert!(!graph.is_open(&svc));
        }

        #[test]
        fn removing_last_pr_drops_repository() {
            let mut graph = open_graph(&[key("svc", 1)]);
            graph.remove_branch(&key("svc", 1));
            assert!(graph.branches().is_empty());
            assert!(graph.branches().as_map().get(&RepoName::new("svc")).is_none());
        }

        #[test]
        fn removing_unknown_pr_is_noop() {
            let mut graph = open_graph(&[key("svc", 1)]);
            assert_eq!(graph.remove_branch(&key("svc", 2)), None);
            assert_eq!(graph.remove_branch(&key("lib", 1)), None);
            assert_eq!(graph.branches().len(), 1);
        }
    }

    mod link {
        use super::*;

        #[test]
        fn link_mirrors_edge() {
            let svc = key("svc", 1);
            let lib = key("lib", 5);
            let mut graph = open_graph(&[svc.clone(), lib.clone()]);

            graph.link(&svc, &lib);

            assert_eq!(
                graph.dependencies_of(&svc).unwrap().get(&RepoName::new("lib")),
                Some(&PrNumber(5))
            );
            assert_eq!(
                graph.dependents_of(&lib).unwrap().get(&RepoName::new("svc")),
                Some(&PrNumber(1))
            );
        }

        #[test]
        fn second_edge_to_same_repo_replaces_first() {
            let svc = key("svc", 1);
            let lib5 = key("lib", 5);
            let lib6 = key("lib", 6);
            let mut graph = open_graph(&[svc.clone(), lib5.clone(), lib6.clone()]);

            graph.link(&svc, &lib5);
            graph.link(&svc, &lib6);

            let deps = graph.dependencies_of(&svc).unwrap();
            assert_eq!(deps.len(), 1);
            assert_eq!(deps.get(&RepoName::new("lib")), Some(&PrNumber(6)));

            // The mirror of the replaced edge is gone
            assert!(graph.dependents_of(&lib5).unwrap().is_empty());
            assert_eq!(
                graph.dependents_of(&lib6).unwrap().get(&RepoName::new("svc")),
                Some(&PrNumber(1))
            );
        }

        #[test]
        fn relinking_same_edge_is_idempotent() {
            let svc = key("svc", 1);
            let lib = key("lib", 5);
            let mut graph = open_graph(&[svc.clone(), lib.clone()]);

            graph.link(&svc, &lib);
            let once = graph.clone();
            graph.link(&svc, &lib);

            assert_eq!(graph, once);
        }
    }

    mod clear_dependencies {
        use super::*;

        #[test]
        fn returns_previous_edges_and_unlinks_mirrors() {
            let svc = key("svc", 1);
            let lib = key("lib", 5);
            let api = key("api", 2);
            let mut graph = open_graph(&[svc.clone(), lib.clone(), api.clone()]);
            graph.link(&svc, &lib);
            graph.link(&svc, &api);

            let before = graph.clear_dependencies(&svc);

            assert_eq!(before.len(), 2);
            assert_eq!(graph.dependencies_of(&svc), Some(&EdgeSet::new()));
            assert!(graph.dependents_of(&lib).unwrap().is_empty());
            assert!(graph.dependents_of(&api).unwrap().is_empty());
        }

        #[test]
        fn does_not_unlink_other_dependent_in_same_repo() {
            let svc1 = key("svc", 1);
            let svc2 = key("svc", 2);
            let lib = key("lib", 5);
            let mut graph = open_graph(&[svc1.clone(), svc2.clone(), lib.clone()]);

            graph.link(&svc1, &lib);
            // svc#2 takes over the single svc slot in lib#5's reverse node
            graph.link(&svc2, &lib);
            graph.clear_dependencies(&svc1);

            assert_eq!(
                graph.dependents_of(&lib).unwrap().get(&RepoName::new("svc")),
                Some(&PrNumber(2))
            );
        }

        #[test]
        fn creates_empty_node_for_new_pr() {
            let svc = key("svc", 1);
            let mut graph = open_graph(std::slice::from_ref(&svc));

            let before = graph.clear_dependencies(&svc);

            assert!(before.is_empty());
            assert!(graph.dependencies().contains_node(&svc));
        }
    }

    mod remove_node {
        use super::*;

        #[test]
        fn removes_forward_edges_with_mirrors() {
            let svc = key("svc", 1);
            let lib = key("lib", 5);
            let mut graph = open_graph(&[svc.clone(), lib.clone()]);
            graph.link(&svc, &lib);

            assert!(graph.remove_node(&svc));

            assert!(graph.dependencies_of(&svc).is_none());
            assert!(graph.dependents_of(&lib).unwrap().is_empty());
        }

        #[test]
        fn leaves_dependents_forward_edges_in_place() {
            let svc = key("svc", 1);
            let web = key("web", 3);
            let lib = key("lib", 5);
            let mut graph = open_graph(&[svc.clone(), web.clone(), lib.clone()]);
            graph.link(&svc, &lib);
            graph.link(&web, &lib);

            assert!(graph.remove_node(&lib));

            let expected = EdgeSet::from([(RepoName::new("lib"), PrNumber(5))]);
            assert!(graph.dependents_of(&lib).is_none());
            assert_eq!(graph.dependencies_of(&svc), Some(&expected));
            assert_eq!(graph.dependencies_of(&web), Some(&expected));
        }

        #[test]
        fn same_repo_dependents_both_keep_their_edges() {
            let first = key("svc", 1);
            let second = key("svc", 2);
            let lib = key("lib", 5);
            let mut graph = open_graph(&[first.clone(), second.clone(), lib.clone()]);
            graph.link(&first, &lib);
            graph.link(&second, &lib);

            graph.remove_node(&lib);

            let expected = EdgeSet::from([(RepoName::new("lib"), PrNumber(5))]);
            assert_eq!(graph.dependencies_of(&first), Some(&expected));
            assert_eq!(graph.dependencies_of(&second), Some(&expected));
        }

        #[test]
        fn self_dependency_is_fully_removed() {
            let svc = key("svc", 1);
            let mut graph = open_graph(std::slice::from_ref(&svc));
            graph.link(&svc, &svc);

            graph.remove_node(&svc);

            assert!(graph.dependencies().as_map().is_empty());
            assert!(graph.dependents().as_map().is_empty());
        }

        #[test]
        fn unknown_node_reports_nothing_removed() {
            let mut graph = DependencyGraph::new();
            assert!(!graph.remove_node(&key("svc", 1)));
        }
    }

    mod purge_if_stale {
        use super::*;

        #[test]
        fn keeps_open_node() {
            let svc = key("svc", 1);
            let lib = key("lib", 5);
            let mut graph = open_graph(&[svc.clone(), lib.clone()]);
            graph.link(&svc, &lib);

            assert!(!graph.purge_if_stale(&lib));
            assert!(graph.dependents().contains_node(&lib));
        }

        #[test]
        fn purges_node_without_branch() {
            let svc = key("svc", 1);
            let lib = key("lib", 5);
            let mut graph = open_graph(&[svc.clone(), lib.clone()]);
            graph.link(&svc, &lib);
            graph.remove_branch(&lib);

            assert!(graph.purge_if_stale(&lib));
            assert!(!graph.dependents().contains_node(&lib));
            assert_eq!(graph.dependencies_of(&svc).unwrap().len(), 1);
        }
    }

    mod edge_index {
        use super::*;

        #[test]
        fn iter_and_edge_count() {
            let svc = key("svc", 1);
            let web = key("web", 3);
            let lib = key("lib", 5);
            let api = key("api", 2);
            let mut graph = open_graph(&[svc.clone(), web.clone(), lib.clone(), api.clone()]);
            graph.link(&svc, &lib);
            graph.link(&svc, &api);
            graph.link(&web, &lib);

            assert_eq!(graph.dependencies().edge_count(), 3);
            assert_eq!(graph.dependents().edge_count(), 3);

            let nodes: Vec<PrKey> = graph.dependencies().iter().map(|(k, _)| k).collect();
            assert_eq!(nodes, vec![svc, web]);
        }
    }
}
