//! Event key matching for handler patterns.
//!
//! A pattern is either the match-all sentinel, an exact (case-insensitive)
//! key, or a regular expression marked by a leading `^`.

use regex::Regex;
use thiserror::Error;

/// Sentinel pattern that matches every key. An empty pattern behaves the same.
pub const MATCH_ALL: &str = "*";

/// Error raised when a pattern cannot be compiled at registration.
#[derive(Debug, Error)]
pub enum PatternError {
    /// The pattern text started with `^` but is not a valid regular expression.
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidRegex {
        /// The offending pattern text.
        pattern: String,
        /// The underlying regex compile error.
        source: regex::Error,
    },
}

/// A compiled match rule attached to a handler.
///
/// Exact patterns are stored lower-cased, so matching is case-insensitive by
/// construction. Regex patterns keep their author's casing and are run
/// against the lower-cased key.
///
/// # Examples
///
/// ```
/// use vaplug::core::Pattern;
///
/// let exact = Pattern::parse("Different Test").unwrap();
/// assert!(exact.matches("different test"));
/// assert!(!exact.matches("different"));
///
/// let regex = Pattern::parse("^foo.*").unwrap();
/// assert!(regex.matches("foobar"));
/// assert!(!regex.matches("barfoo"));
/// ```
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Matches every key.
    Any,
    /// Case-insensitive exact match (stored lower-cased).
    Exact(String),
    /// Regular expression, matched anywhere in the key.
    Regex(Regex),
}

impl Pattern {
    /// Compile a pattern from its textual form.
    ///
    /// Empty text and [`MATCH_ALL`] compile to [`Pattern::Any`]; text starting
    /// with `^` is compiled as a regular expression; anything else becomes an
    /// exact match. A malformed regex fails here, not at match time.
    pub fn parse(text: &str) -> Result<Self, PatternError> {
        if text.is_empty() || text == MATCH_ALL {
            Ok(Pattern::Any)
        } else if text.starts_with('^') {
            Regex::new(text)
                .map(Pattern::Regex)
                .map_err(|source| PatternError::InvalidRegex {
                    pattern: text.to_string(),
                    source,
                })
        } else {
            Ok(Pattern::Exact(text.to_lowercase()))
        }
    }

    /// Check whether the given key matches this pattern.
    ///
    /// The key is lower-cased before comparison. Regex patterns match
    /// anywhere in the key rather than requiring a full-string match.
    pub fn matches(&self, key: &str) -> bool {
        match self {
            Pattern::Any => true,
            Pattern::Exact(pattern) => key.to_lowercase() == *pattern,
            Pattern::Regex(regex) => regex.is_match(&key.to_lowercase()),
        }
    }

    /// The textual form of this pattern.
    pub fn text(&self) -> &str {
        match self {
            Pattern::Any => MATCH_ALL,
            Pattern::Exact(pattern) => pattern,
            Pattern::Regex(regex) => regex.as_str(),
        }
    }

    /// Check if this is the match-all pattern.
    #[inline]
    pub fn is_any(&self) -> bool {
        matches!(self, Pattern::Any)
    }
}
