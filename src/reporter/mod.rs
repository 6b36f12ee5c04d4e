//! Reporting module for outputting run summaries.

mod sarif;
mod text;

pub use sarif::*;
pub use text::*;

use crate::config::OutputFormat;
use crate::models::{LineColumnTextSpan, MatchingResult, RunStats, RunSummary};
use crate::pattern::PatternRoot;
use serde::Serialize;
use std::sync::Arc;

/// Report generator trait.
pub trait Reporter {
    /// Generate a report from a run summary.
    fn generate(&self, summary: &RunSummary) -> String;
}

/// Create a reporter based on output format. `patterns` describe the rules
/// in formats that carry rule metadata.
pub fn create_reporter(format: OutputFormat, colors: bool, patterns: &[Arc<PatternRoot>]) -> Box<dyn Reporter> {
    match format {
        OutputFormat::Sarif => Box::new(SarifReporter::new().with_patterns(patterns)),
        OutputFormat::Json => Box::new(JsonReporter::new()),
        OutputFormat::Text if colors => Box::new(TextReporter::new()),
        OutputFormat::Text => Box::new(TextReporter::new().without_colors()),
    }
}

/// JSON reporter for simple JSON output.
pub struct JsonReporter;

impl JsonReporter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    results: Vec<JsonResult<'a>>,
    stats: &'a RunStats,
    errors: &'a [String],
    started_at: String,
    completed_at: String,
}

#[derive(Serialize)]
struct JsonResult<'a> {
    pattern_key: &'a str,
    file: String,
    locations: Vec<JsonLocation>,
}

#[derive(Serialize)]
struct JsonLocation {
    start: usize,
    length: usize,
    #[serde(flatten)]
    line_column: LineColumnTextSpan,
}

impl<'a> JsonResult<'a> {
    // Source text stays out of the report; spans are enough to find it.
    fn new(result: &'a MatchingResult) -> Self {
        Self {
            pattern_key: &result.pattern_key,
            file: result.file.to_string(),
            locations: result
                .text_spans
                .iter()
                .map(|span| JsonLocation {
                    start: span.start,
                    length: span.length,
                    line_column: result.file.line_column_span(*span),
                })
                .collect(),
        }
    }
}

impl Reporter for JsonReporter {
    fn generate(&self, summary: &RunSummary) -> String {
        let report = JsonReport {
            results: summary.results.iter().map(JsonResult::new).collect(),
            stats: &summary.stats,
            errors: &summary.errors,
            started_at: summary.started_at.to_rfc3339(),
            completed_at: summary.completed_at.to_rfc3339(),
        };
        serde_json::to_string_pretty(&report).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SourceFile, TextSpan};

    #[test]
    fn test_json_report() {
        let file = Arc::new(SourceFile::new("web/app.js", "let a;\nsha1(a);"));
        let mut summary = RunSummary::new();
        summary.add_file_results(vec![MatchingResult::new(
            "weak-hash-invocation",
            file,
            vec![TextSpan::new(7, 7)],
        )]);

        let report = JsonReporter::new().generate(&summary);
        let parsed: serde_json::Value = serde_json::from_str(&report).unwrap();

        let result = &parsed["results"][0];
        assert_eq!(result["pattern_key"], "weak-hash-invocation");
        assert_eq!(result["file"], "web/app.js");
        assert_eq!(result["locations"][0]["begin_line"], 2);
        assert_eq!(result["locations"][0]["begin_column"], 1);
        assert!(result.get("code").is_none());
        assert_eq!(parsed["stats"]["files_matched"], 1);
    }
}
