//! Error types for the matcher.

use thiserror::Error;

/// Main error type for the matcher.
///
/// A pattern that simply does not match is not an error; it is a failed
/// [`MatchingContext`](crate::matching::MatchingContext).
#[derive(Error, Debug)]
pub enum MatcherError {
    #[error("Pattern {key} could not be loaded: {reason}")]
    PatternLoad { key: String, reason: String },

    #[error("Invalid regular expression {pattern:?}: {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Unsupported pattern data format: {0}")]
    UnsupportedDataFormat(String),

    #[error("UST conversion failed for {file}: {reason}")]
    Conversion { file: String, reason: String },

    #[error("Matching interrupted for {file}")]
    Interrupted { file: String },

    #[error("Matching timed out for {file} after {elapsed_ms} ms")]
    Timeout { file: String, elapsed_ms: u64 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid filename wildcard: {0}")]
    Glob(#[from] glob::PatternError),

    #[error("Worker pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl MatcherError {
    /// Whether the error aborted a file pass part way through.
    pub fn is_interruption(&self) -> bool {
        matches!(self, MatcherError::Interrupted { .. } | MatcherError::Timeout { .. })
    }
}

/// Result type alias for matcher operations.
pub type Result<T> = std::result::Result<T, MatcherError>;
