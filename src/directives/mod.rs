//! Dependency directives declared in pull request descriptions.
//!
//! A pull request declares that it depends on another pull request by
//! including a line `DependsOn:<repo>#<number>` in its description.

mod parser;

pub use parser::{extract_dependency_tokens, parse_dependency_token};
