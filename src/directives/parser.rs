//! Parser for `DependsOn:` directives in pull request descriptions.
//!
//! A directive is a whole line of the form `DependsOn:<repo>#<number>`. The
//! parser is pure: it turns unstructured description text into dependency
//! tokens, and tokens into [`PrKey`]s.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::{PrKey, PrNumber, RepoName};

/// A whole-line directive. Repository names are lowercase, 3-40 characters.
static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^DependsOn:[a-z0-9\-_]{3,40}#[0-9]{1,10}$").expect("directive pattern is valid")
});

/// Extracts the dependency tokens declared in a pull request description.
///
/// Returns the `repo#number` part of every line that is exactly a directive,
/// in the order they appear. Lines may end in `\r\n` or a bare `\n`, and
/// one body may mix the two. GitHub sends `\r\n`, but descriptions written
/// through the API often use `\n` alone, so both are accepted.
///
/// # Examples
///
/// ```
/// use pullrequestd::directives::extract_dependency_tokens;
///
/// let body = "Adds the thing.\r\nDependsOn:shared-lib#12\r\nDependsOn:api#7";
/// assert_eq!(extract_dependency_tokens(body), vec!["shared-lib#12", "api#7"]);
///
/// // Must be the whole line
/// assert!(extract_dependency_tokens("see DependsOn:shared-lib#12").is_empty());
/// ```
pub fn extract_dependency_tokens(body: &str) -> Vec<String> {
    body.lines()
        .filter(|line| DIRECTIVE.is_match(line))
        .filter_map(|line| line.split_once(':').map(|(_, token)| token.to_string()))
        .collect()
}

/// Parses a `repo#number` token into a pull request key.
///
/// Returns `None` for malformed tokens (no `#`, empty repository, or a
/// non-numeric suffix). Callers drop these silently.
///
/// # Examples
///
/// ```
/// use pullrequestd::directives::parse_dependency_token;
/// use pullrequestd::types::PrKey;
///
/// assert_eq!(parse_dependency_token("lib#5"), Some(PrKey::new("lib", 5)));
/// assert_eq!(parse_dependency_token("lib#five"), None);
/// assert_eq!(parse_dependency_token("lib"), None);
/// ```
pub fn parse_dependency_token(token: &str) -> Option<PrKey> {
    let (repo, number) = token.split_once('#')?;
    if repo.is_empty() {
        return None;
    }
    let number: u64 = number.parse().ok()?;
    Some(PrKey {
        repo: RepoName::new(repo),
        number: PrNumber(number),
    })
}
