//! Matching results and run summaries.

use super::{SourceFile, TextSpan};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One confirmed occurrence of a pattern in a file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingResult {
    /// Key of the pattern that matched
    pub pattern_key: String,

    /// File the match was found in
    pub file: Arc<SourceFile>,

    /// Matched locations, never empty
    pub text_spans: Vec<TextSpan>,
}

impl MatchingResult {
    pub fn new(pattern_key: impl Into<String>, file: Arc<SourceFile>, text_spans: Vec<TextSpan>) -> Self {
        debug_assert!(!text_spans.is_empty(), "a result carries at least one span");
        Self {
            pattern_key: pattern_key.into(),
            file,
            text_spans,
        }
    }

    /// Span covering every matched location.
    pub fn span(&self) -> TextSpan {
        self.text_spans
            .iter()
            .fold(TextSpan::EMPTY, |acc, span| acc.union(span))
    }
}

/// Statistics about a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    /// Number of UST files handed to the engine
    pub files_total: usize,

    /// Files whose pass completed
    pub files_matched: usize,

    /// Files that could not be loaded or converted
    pub files_failed: usize,

    /// Files aborted by timeout or shutdown
    pub files_interrupted: usize,

    /// Patterns available to the run
    pub patterns_loaded: usize,

    /// Pattern records rejected at load time
    pub patterns_skipped: usize,

    /// Patterns disabled after faulting during matching
    pub patterns_quarantined: usize,

    /// Number of results produced
    pub results: usize,

    /// Run duration in milliseconds
    pub duration_ms: u64,
}

/// Outcome of one matching run over a set of files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// All results, ordered by file then by discovery
    pub results: Vec<MatchingResult>,

    pub stats: RunStats,

    /// Human-readable descriptions of skipped files and patterns
    pub errors: Vec<String>,

    pub started_at: chrono::DateTime<chrono::Utc>,

    pub completed_at: chrono::DateTime<chrono::Utc>,
}

impl RunSummary {
    pub fn new() -> Self {
        let now = chrono::Utc::now();
        Self {
            results: Vec::new(),
            stats: RunStats::default(),
            errors: Vec::new(),
            started_at: now,
            completed_at: now,
        }
    }

    /// Add results of one completed file pass.
    pub fn add_file_results(&mut self, results: Vec<MatchingResult>) {
        self.stats.files_matched += 1;
        self.stats.results += results.len();
        self.results.extend(results);
    }

    pub fn add_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    /// Results produced by one pattern.
    pub fn results_for_pattern(&self, key: &str) -> Vec<&MatchingResult> {
        self.results.iter().filter(|r| r.pattern_key == key).collect()
    }

    /// Whether every file completed.
    pub fn is_complete(&self) -> bool {
        self.stats.files_failed == 0 && self.stats.files_interrupted == 0
    }

    pub fn finish(&mut self) {
        self.completed_at = chrono::Utc::now();
        self.stats.duration_ms = (self.completed_at - self.started_at)
            .num_milliseconds()
            .max(0) as u64;
    }
}

impl Default for RunSummary {
    fn default() -> Self {
        Self::new()
    }
}
