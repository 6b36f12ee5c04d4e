//! Compiled regular expressions for pattern leaves.

use crate::error::{MatcherError, Result};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Matches any identifier when a regex leaf is left unspecified.
pub const DEFAULT_IDENTIFIER_REGEX: &str = r"\w+";

/// A regex compiled in both case modes.
///
/// Which one is used depends on the language of the tree being matched, not on
/// the pattern. Both are compiled at load time and shared read-only between
/// matching threads afterwards.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PatternRegex {
    source: String,
    sensitive: Regex,
    insensitive: Regex,
}

impl PatternRegex {
    pub fn new(source: &str) -> Result<Self> {
        let compile = |case_insensitive: bool| {
            RegexBuilder::new(source)
                .case_insensitive(case_insensitive)
                .build()
                .map_err(|e| MatcherError::InvalidRegex {
                    pattern: source.to_string(),
                    source: e,
                })
        };
        Ok(Self {
            source: source.to_string(),
            sensitive: compile(false)?,
            insensitive: compile(true)?,
        })
    }

    /// Regex accepting any identifier.
    pub fn any_identifier() -> Self {
        Self::new(DEFAULT_IDENTIFIER_REGEX).expect("default identifier regex compiles")
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn regex(&self, case_insensitive: bool) -> &Regex {
        if case_insensitive {
            &self.insensitive
        } else {
            &self.sensitive
        }
    }

    pub fn is_match(&self, text: &str, case_insensitive: bool) -> bool {
        self.regex(case_insensitive).is_match(text)
    }
}

impl TryFrom<String> for PatternRegex {
    type Error = MatcherError;

    fn try_from(source: String) -> Result<Self> {
        PatternRegex::new(&source)
    }
}

impl From<PatternRegex> for String {
    fn from(regex: PatternRegex) -> String {
        regex.source
    }
}

impl PartialEq for PatternRegex {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl fmt::Debug for PatternRegex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PatternRegex({:?})", self.source)
    }
}

impl fmt::Display for PatternRegex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_modes() {
        let re = PatternRegex::new("^sha1$").unwrap();
        assert!(re.is_match("sha1", false));
        assert!(!re.is_match("SHA1", false));
        assert!(re.is_match("SHA1", true));
    }

    #[test]
    fn test_invalid_regex_is_load_error() {
        let err = PatternRegex::new("(unclosed").unwrap_err();
        assert!(matches!(err, MatcherError::InvalidRegex { .. }));

        let parsed: std::result::Result<PatternRegex, _> = serde_json::from_str("\"[a-\"");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_default_matches_identifiers() {
        let re = PatternRegex::any_identifier();
        assert!(re.is_match("document", false));
        assert!(!re.is_match("", false));
    }
}
