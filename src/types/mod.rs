//! Core domain types for the pull request dependency daemon.

pub mod action;
pub mod ids;

pub use action::PrAction;
pub use ids::{PrKey, PrNumber, RepoName};
