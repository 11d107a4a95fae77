//! pullrequestd - a cache of DependsOn links between GitHub pull requests.
//!
//! This library provides the dependency cache and its update algorithm, the
//! GitHub bootstrap and webhook intake, and the retrying Jenkins job trigger.

pub mod bootstrap;
pub mod cache;
pub mod config;
pub mod directives;
pub mod filter;
pub mod github;
pub mod ingest;
pub mod jenkins;
pub mod server;
pub mod types;
pub mod webhooks;

#[cfg(test)]
mod test_utils;
