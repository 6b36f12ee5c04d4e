//! Configuration management for the matcher.

use crate::concurrency::WorkerPoolConfig;
use crate::error::{MatcherError, Result};
use crate::matching::MatchingOptions;
use crate::models::Language;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration for a matching run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Matching configuration
    #[serde(default)]
    pub matching: MatchingConfig,

    /// Pattern sources
    #[serde(default)]
    pub patterns: PatternsConfig,

    /// Concurrency settings
    #[serde(default)]
    pub concurrency: ConcurrencyConfig,

    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
}

/// Matching configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Report every occurrence, including ones nested in an earlier match
    #[serde(default)]
    pub find_all_alternatives: bool,

    /// Report spans of structural pattern nodes, not only of leaves
    #[serde(default)]
    pub include_nonterminal_text_spans: bool,

    /// Languages to match (empty = all)
    #[serde(default)]
    pub languages: Vec<Language>,

    /// Only run patterns with these keys
    #[serde(default)]
    pub pattern_ids: Option<Vec<String>>,
}

/// Pattern sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternsConfig {
    /// JSON pattern files
    #[serde(default)]
    pub paths: Vec<PathBuf>,

    /// Include the built-in patterns
    #[serde(default = "default_true")]
    pub builtin: bool,
}

/// Concurrency configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcurrencyConfig {
    /// Number of matching threads (0 = auto)
    #[serde(default)]
    pub threads: usize,

    /// Per-file matching budget in milliseconds (0 = unlimited)
    #[serde(default)]
    pub file_timeout_ms: u64,

    /// Maximum files to match in a single parallel batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output format
    #[serde(default)]
    pub format: OutputFormat,

    /// Output file path (stdout if not specified)
    pub output_path: Option<PathBuf>,

    /// Colorize text output
    #[serde(default = "default_true")]
    pub colors: bool,
}

/// Output format enumeration.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON format
    Json,
    /// SARIF (Static Analysis Results Interchange Format)
    Sarif,
}

fn default_true() -> bool {
    true
}

fn default_batch_size() -> usize {
    64
}

impl Default for PatternsConfig {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            builtin: true,
        }
    }
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            threads: 0,
            file_timeout_ms: 0,
            batch_size: default_batch_size(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            output_path: None,
            colors: true,
        }
    }
}

impl MatchingConfig {
    pub fn options(&self) -> MatchingOptions {
        MatchingOptions {
            find_all_alternatives: self.find_all_alternatives,
            include_nonterminal_text_spans: self.include_nonterminal_text_spans,
        }
    }

    pub fn accepts(&self, language: Language) -> bool {
        self.languages.is_empty() || self.languages.contains(&language)
    }
}

impl ConcurrencyConfig {
    pub fn pool(&self) -> WorkerPoolConfig {
        WorkerPoolConfig {
            threads: self.threads,
            batch_size: self.batch_size,
        }
    }

    pub fn file_timeout(&self) -> Option<Duration> {
        (self.file_timeout_ms > 0).then(|| Duration::from_millis(self.file_timeout_ms))
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Reject settings that would silently match nothing. Run after CLI
    /// overrides are applied.
    pub fn validate(&self) -> Result<()> {
        if let Some(ids) = &self.matching.pattern_ids {
            if ids.iter().all(|id| id.trim().is_empty()) {
                return Err(MatcherError::Config(
                    "matching.pattern_ids is empty; omit it to run every pattern".to_string(),
                ));
            }
        }
        if !self.patterns.builtin && self.patterns.paths.is_empty() {
            return Err(MatcherError::Config(
                "no pattern source: built-ins disabled and no pattern files given".to_string(),
            ));
        }
        Ok(())
    }

    /// Create a configuration builder.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for creating configurations programmatically.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn find_all_alternatives(mut self, enable: bool) -> Self {
        self.config.matching.find_all_alternatives = enable;
        self
    }

    pub fn include_nonterminal_text_spans(mut self, enable: bool) -> Self {
        self.config.matching.include_nonterminal_text_spans = enable;
        self
    }

    pub fn languages(mut self, languages: Vec<Language>) -> Self {
        self.config.matching.languages = languages;
        self
    }

    pub fn pattern_ids(mut self, ids: Vec<String>) -> Self {
        self.config.matching.pattern_ids = Some(ids);
        self
    }

    pub fn pattern_path(mut self, path: PathBuf) -> Self {
        self.config.patterns.paths.push(path);
        self
    }

    pub fn builtin_patterns(mut self, enable: bool) -> Self {
        self.config.patterns.builtin = enable;
        self
    }

    pub fn threads(mut self, threads: usize) -> Self {
        self.config.concurrency.threads = threads;
        self
    }

    pub fn file_timeout_ms(mut self, timeout: u64) -> Self {
        self.config.concurrency.file_timeout_ms = timeout;
        self
    }

    pub fn batch_size(mut self, size: usize) -> Self {
        self.config.concurrency.batch_size = size;
        self
    }

    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.config.output.format = format;
        self
    }

    pub fn output_path(mut self, path: PathBuf) -> Self {
        self.config.output.output_path = Some(path);
        self
    }

    pub fn colors(mut self, enable: bool) -> Self {
        self.config.output.colors = enable;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [matching]
            find_all_alternatives = true
            languages = ["php", "mysql"]

            [concurrency]
            file_timeout_ms = 250
            "#,
        )
        .unwrap();

        assert!(config.matching.options().find_all_alternatives);
        assert!(config.matching.accepts(Language::MySql));
        assert!(!config.matching.accepts(Language::Java));
        assert_eq!(config.concurrency.file_timeout(), Some(Duration::from_millis(250)));
        assert_eq!(config.concurrency.batch_size, 64);
        assert!(config.patterns.builtin);
        assert_eq!(config.output.format, OutputFormat::Text);
    }

    #[test]
    fn test_validate() {
        assert!(Config::default().validate().is_ok());

        let no_source = Config::builder().builtin_patterns(false).build();
        assert!(matches!(no_source.validate(), Err(MatcherError::Config(_))));

        let empty_ids = Config::builder().pattern_ids(vec![String::new()]).build();
        assert!(empty_ids.validate().is_err());
    }

    #[test]
    fn test_builder() {
        let config = Config::builder()
            .builtin_patterns(false)
            .pattern_ids(vec!["weak-hash-invocation".to_string()])
            .output_format(OutputFormat::Sarif)
            .threads(3)
            .build();

        assert!(!config.patterns.builtin);
        assert_eq!(config.concurrency.pool().threads, 3);
        assert_eq!(config.concurrency.file_timeout(), None);
        assert!(config.matching.accepts(Language::Go));
    }
}
