//! Human-readable text reporter.

use super::Reporter;
use crate::models::{MatchingResult, RunSummary};
use std::collections::BTreeMap;

/// Text format reporter for terminal output.
pub struct TextReporter {
    /// Use colors in output
    use_colors: bool,

    /// Show the matched source line
    show_snippets: bool,
}

impl TextReporter {
    /// Create a new text reporter.
    pub fn new() -> Self {
        Self {
            use_colors: true,
            show_snippets: true,
        }
    }

    /// Disable colors.
    pub fn without_colors(mut self) -> Self {
        self.use_colors = false;
        self
    }

    /// Disable snippets.
    pub fn without_snippets(mut self) -> Self {
        self.show_snippets = false;
        self
    }

    fn paint(&self, code: &'static str) -> &'static str {
        if self.use_colors {
            code
        } else {
            ""
        }
    }

    fn reset(&self) -> &'static str {
        self.paint("\x1b[0m")
    }

    fn bold(&self) -> &'static str {
        self.paint("\x1b[1m")
    }

    fn dim(&self) -> &'static str {
        self.paint("\x1b[2m")
    }

    fn red(&self) -> &'static str {
        self.paint("\x1b[31m")
    }

    fn yellow(&self) -> &'static str {
        self.paint("\x1b[33m")
    }

    fn green(&self) -> &'static str {
        self.paint("\x1b[32m")
    }

    fn write_result(&self, output: &mut String, result: &MatchingResult) {
        let location = result.file.line_column_span(result.span());
        output.push_str(&format!(
            "{}[{}]{} {}{}:{}:{}{}\n",
            self.yellow(),
            result.pattern_key,
            self.reset(),
            self.bold(),
            result.file,
            location.begin_line,
            location.begin_column,
            self.reset()
        ));

        for span in &result.text_spans {
            let lc = result.file.line_column_span(*span);
            match result.file.text(*span).filter(|_| self.show_snippets) {
                Some(text) => {
                    let first_line = text.lines().next().unwrap_or_default();
                    let ellipsis = if text.contains('\n') { " ..." } else { "" };
                    output.push_str(&format!(
                        "  {}{:>5} |{} {}{}\n",
                        self.dim(),
                        lc.begin_line,
                        self.reset(),
                        first_line,
                        ellipsis
                    ));
                }
                None => output.push_str(&format!("  {}at {}{}\n", self.dim(), lc, self.reset())),
            }
        }
    }
}

impl Default for TextReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for TextReporter {
    fn generate(&self, summary: &RunSummary) -> String {
        let mut output = String::new();
        let stats = &summary.stats;

        // Header
        output.push_str(&format!(
            "\n{}=== Pattern Matching Report ==={}\n\n",
            self.bold(),
            self.reset()
        ));
        output.push_str(&format!(
            "{}Run Time:{} {} - {}\n",
            self.bold(),
            self.reset(),
            summary.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
            summary.completed_at.format("%H:%M:%S UTC")
        ));
        output.push_str(&format!(
            "{}Duration:{} {}ms\n\n",
            self.bold(),
            self.reset(),
            stats.duration_ms
        ));

        // Summary
        output.push_str(&format!("{}--- Summary ---{}\n", self.bold(), self.reset()));
        output.push_str(&format!(
            "Files: {} matched, {} failed, {} interrupted ({} total)\n",
            stats.files_matched, stats.files_failed, stats.files_interrupted, stats.files_total
        ));
        output.push_str(&format!(
            "Patterns: {} loaded, {} skipped, {} quarantined\n",
            stats.patterns_loaded, stats.patterns_skipped, stats.patterns_quarantined
        ));
        output.push_str(&format!("Results: {}\n", stats.results));

        let mut per_pattern: BTreeMap<&str, usize> = BTreeMap::new();
        for result in &summary.results {
            *per_pattern.entry(result.pattern_key.as_str()).or_default() += 1;
        }
        for (key, count) in &per_pattern {
            output.push_str(&format!("  {}{}:{} {}\n", self.yellow(), key, self.reset(), count));
        }
        output.push('\n');

        // Results detail
        if summary.results.is_empty() {
            output.push_str(&format!("{}No matches found.{}\n", self.dim(), self.reset()));
        } else {
            output.push_str(&format!("{}--- Results ---{}\n\n", self.bold(), self.reset()));

            for result in &summary.results {
                self.write_result(&mut output, result);
                output.push('\n');
            }
        }

        // Errors
        if !summary.errors.is_empty() {
            output.push_str(&format!("\n{}--- Errors ---{}\n", self.bold(), self.reset()));
            for message in &summary.errors {
                output.push_str(&format!("  {}{}{}\n", self.red(), message, self.reset()));
            }
        }

        // Status
        output.push_str(&format!("\n{}--- Status ---{}\n", self.bold(), self.reset()));
        if summary.is_complete() {
            output.push_str(&format!("{}Run completed.{}\n", self.green(), self.reset()));
        } else {
            output.push_str(&format!(
                "{}Run incomplete: {} files not matched.{}\n",
                self.red(),
                stats.files_failed + stats.files_interrupted,
                self.reset()
            ));
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SourceFile, TextSpan};
    use std::sync::Arc;

    fn summary() -> RunSummary {
        let file = Arc::new(SourceFile::new("db/init.sql", "SELECT 1;\nSELECT sha1(pwd);\n"));
        let mut summary = RunSummary::new();
        summary.stats.files_total = 2;
        summary.add_file_results(vec![MatchingResult::new(
            "mysql-weak-hash",
            file,
            vec![TextSpan::new(17, 9)],
        )]);
        summary
    }

    #[test]
    fn test_text_report_generation() {
        let report = TextReporter::new().without_colors().generate(&summary());

        assert!(report.contains("Pattern Matching Report"));
        assert!(report.contains("[mysql-weak-hash] db/init.sql:2:8"));
        assert!(report.contains("sha1(pwd)"));
        assert!(report.contains("Run completed."));
        assert!(!report.contains('\x1b'));
    }

    #[test]
    fn test_incomplete_run() {
        let mut summary = summary();
        summary.stats.files_failed = 1;
        summary.add_error("broken.ust.json: invalid UST");

        let report = TextReporter::new().without_colors().without_snippets().generate(&summary);
        assert!(report.contains("broken.ust.json: invalid UST"));
        assert!(report.contains("Run incomplete: 1 files not matched."));
        assert!(report.contains("at 2:8-2:17"));
    }

    #[test]
    fn test_empty_report() {
        let report = TextReporter::new().without_colors().generate(&RunSummary::new());
        assert!(report.contains("No matches found"));
    }
}
