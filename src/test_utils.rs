//! Shared test utilities and arbitrary generators for property-based testing.

use crate::cache::{ApplyMode, CacheEvent};
use crate::types::{PrAction, PrKey, PrNumber, RepoName};
use proptest::prelude::*;

/// A small repository pool so that generated events collide often.
pub const REPOS: &[&str] = &["svc", "lib", "api", "web-ui"];

pub fn arb_repo() -> impl Strategy<Value = RepoName> + Clone {
    prop::sample::select(REPOS).prop_map(RepoName::new)
}

pub fn arb_pr_number() -> impl Strategy<Value = PrNumber> + Clone {
    (1u64..4).prop_map(PrNumber)
}

/// Keys drawn from a space where several PRs share a repository.
pub fn arb_pr_key() -> impl Strategy<Value = PrKey> + Clone {
    (arb_repo(), arb_pr_number()).prop_map(|(repo, number)| PrKey { repo, number })
}

/// Keys drawn from a space with exactly one PR per repository.
///
/// Every edge index slot can only ever name one PR here, so a freshly linked
/// edge and its reverse mirror always agree.
pub fn arb_unique_pr_key() -> impl Strategy<Value = PrKey> + Clone {
    arb_repo().prop_map(|repo| PrKey::new(repo, 1))
}

pub fn arb_action() -> impl Strategy<Value = PrAction> {
    prop_oneof![
        Just(PrAction::Opened),
        Just(PrAction::Edited),
        Just(PrAction::Reopened),
        Just(PrAction::Closed),
    ]
}

pub fn arb_branch_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9/-]{0,20}".prop_map(String::from)
}

/// A dependency token, occasionally malformed.
pub fn arb_token<S>(keys: S) -> impl Strategy<Value = String>
where
    S: Strategy<Value = PrKey>,
{
    prop_oneof![
        8 => keys.prop_map(|k| k.to_string()),
        1 => Just("lib".to_string()),
        1 => Just("lib#five".to_string()),
    ]
}

/// An event plus the mode to apply it in.
///
/// [`ApplyMode::BranchesOnly`] is only paired with `opened`, which is how the
/// bootstrap loader uses it.
pub fn arb_cache_event<S>(keys: S) -> impl Strategy<Value = (CacheEvent, ApplyMode)>
where
    S: Strategy<Value = PrKey> + Clone,
{
    (
        arb_action(),
        keys.clone(),
        arb_branch_name(),
        prop::collection::vec(arb_token(keys), 0..4),
        any::<bool>(),
    )
        .prop_map(|(action, key, branch, tokens, branches_only)| {
            let mode = if branches_only && action == PrAction::Opened {
                ApplyMode::BranchesOnly
            } else {
                ApplyMode::Full
            };
            (CacheEvent::new(action, key, branch, tokens), mode)
        })
}
