//! SARIF (Static Analysis Results Interchange Format) reporter.

use super::Reporter;
use crate::models::{MatchingResult, RunSummary};
use crate::pattern::PatternRoot;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// SARIF format reporter.
pub struct SarifReporter {
    /// Tool name
    tool_name: String,

    /// Tool version
    tool_version: String,

    /// Pattern metadata for rule descriptors, by key
    rules: HashMap<String, Arc<PatternRoot>>,
}

impl SarifReporter {
    /// Create a new SARIF reporter.
    pub fn new() -> Self {
        Self {
            tool_name: "ust-matcher".to_string(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            rules: HashMap::new(),
        }
    }

    /// Describe rules with the metadata of these patterns.
    pub fn with_patterns(mut self, patterns: &[Arc<PatternRoot>]) -> Self {
        self.rules = patterns.iter().map(|p| (p.key.clone(), Arc::clone(p))).collect();
        self
    }

    /// Build a SARIF rule for a pattern key.
    fn build_rule(&self, key: &str) -> Value {
        let mut rule = json!({ "id": key });

        if let Some(pattern) = self.rules.get(key) {
            rule["name"] = json!(pattern.debug_info);
            rule["shortDescription"] = json!({ "text": pattern.debug_info });
            if !pattern.description.is_empty() {
                rule["fullDescription"] = json!({ "text": pattern.description });
            }
            if let Some(ref cwe) = pattern.cwe_id {
                rule["properties"] = json!({ "tags": [cwe] });
            }
        }

        rule
    }

    /// Build a SARIF result from a matching result.
    fn build_result(&self, result: &MatchingResult) -> Value {
        let locations: Vec<Value> = result
            .text_spans
            .iter()
            .map(|span| {
                let lc = result.file.line_column_span(*span);
                json!({
                    "physicalLocation": {
                        "artifactLocation": {
                            "uri": result.file.path().to_string_lossy().replace('\\', "/"),
                            "uriBaseId": "%SRCROOT%"
                        },
                        "region": {
                            "startLine": lc.begin_line,
                            "startColumn": lc.begin_column,
                            "endLine": lc.end_line,
                            "endColumn": lc.end_column,
                            "charOffset": span.start,
                            "charLength": span.length
                        }
                    }
                })
            })
            .collect();

        let message = self
            .rules
            .get(&result.pattern_key)
            .map(|p| p.debug_info.clone())
            .unwrap_or_else(|| format!("Pattern {} matched", result.pattern_key));

        json!({
            "ruleId": result.pattern_key,
            "level": "warning",
            "message": { "text": message },
            "locations": locations
        })
    }
}

impl Default for SarifReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for SarifReporter {
    fn generate(&self, summary: &RunSummary) -> String {
        // Collect unique rules in order of first match
        let mut rules: Vec<Value> = Vec::new();
        let mut seen_rules = std::collections::HashSet::new();

        for result in &summary.results {
            if seen_rules.insert(result.pattern_key.as_str()) {
                rules.push(self.build_rule(&result.pattern_key));
            }
        }

        let results: Vec<Value> = summary.results.iter().map(|r| self.build_result(r)).collect();

        let notifications: Vec<Value> = summary
            .errors
            .iter()
            .map(|message| json!({ "level": "error", "message": { "text": message } }))
            .collect();

        let sarif = json!({
            "$schema": "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json",
            "version": "2.1.0",
            "runs": [{
                "tool": {
                    "driver": {
                        "name": self.tool_name,
                        "version": self.tool_version,
                        "rules": rules
                    }
                },
                "results": results,
                "invocations": [{
                    "executionSuccessful": summary.is_complete(),
                    "startTimeUtc": summary.started_at.to_rfc3339(),
                    "endTimeUtc": summary.completed_at.to_rfc3339(),
                    "toolExecutionNotifications": notifications
                }],
                "properties": {
                    "stats": {
                        "filesTotal": summary.stats.files_total,
                        "filesMatched": summary.stats.files_matched,
                        "filesFailed": summary.stats.files_failed,
                        "filesInterrupted": summary.stats.files_interrupted,
                        "patternsLoaded": summary.stats.patterns_loaded,
                        "patternsQuarantined": summary.stats.patterns_quarantined,
                        "durationMs": summary.stats.duration_ms
                    }
                }
            }]
        });

        serde_json::to_string_pretty(&sarif).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
    }
}
