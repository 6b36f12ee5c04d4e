//! Pattern repositories.
//!
//! The engine only needs the [`PatternRepository`] contract: given a language
//! and an optional id filter, the patterns to try, in an order that is stable
//! across runs. Patterns come from JSON files of [`PatternDto`] records, from
//! the built-in set, or from code.

mod builtins;
mod dto;

pub use builtins::DefaultPatternRepository;
pub use crate::pattern::DataFormat;
pub use dto::{PatternDto, SnippetParser};

use crate::error::Result;
use crate::models::Language;
use crate::pattern::PatternRoot;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Source of patterns for a run.
pub trait PatternRepository: Send + Sync {
    /// Every pattern, in repository order.
    fn all(&self) -> Vec<Arc<PatternRoot>>;

    /// Patterns applying to `language`, restricted to `ids` when given, in
    /// repository order.
    fn patterns(&self, language: Language, ids: Option<&[String]>) -> Vec<Arc<PatternRoot>> {
        self.all()
            .into_iter()
            .filter(|p| p.applies_to(language))
            .filter(|p| ids.map_or(true, |ids| ids.iter().any(|id| *id == p.key)))
            .collect()
    }
}

/// Outcome of loading pattern records.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: usize,
    /// One message per skipped record.
    pub errors: Vec<String>,
}

impl LoadReport {
    pub fn merge(&mut self, other: LoadReport) {
        self.loaded += other.loaded;
        self.skipped += other.skipped;
        self.errors.extend(other.errors);
    }
}

/// Patterns held in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemoryPatternRepository {
    patterns: Vec<Arc<PatternRoot>>,
}

impl MemoryPatternRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pattern. A pattern with a key already present replaces the old
    /// one in its position.
    pub fn add(&mut self, pattern: PatternRoot) {
        let pattern = Arc::new(pattern);
        match self.patterns.iter_mut().find(|p| p.key == pattern.key) {
            Some(existing) => {
                warn!("Pattern {} defined twice, keeping the later one", pattern.key);
                *existing = pattern;
            }
            None => self.patterns.push(pattern),
        }
    }

    pub fn extend(&mut self, patterns: impl IntoIterator<Item = PatternRoot>) {
        for pattern in patterns {
            self.add(pattern);
        }
    }

    /// Add every record that builds, skipping the rest.
    pub fn add_dtos(&mut self, dtos: Vec<PatternDto>, parser: Option<&dyn SnippetParser>) -> LoadReport {
        let mut report = LoadReport::default();
        for dto in dtos {
            match dto.to_root(parser) {
                Ok(root) => {
                    debug!("Loaded pattern {} ({})", root.key, root.debug_info);
                    self.add(root);
                    report.loaded += 1;
                }
                Err(e) => {
                    warn!("Skipping pattern: {}", e);
                    report.skipped += 1;
                    report.errors.push(e.to_string());
                }
            }
        }
        report
    }

    /// Add every element of a JSON array that reads as a record and builds.
    /// Elements that are not objects are skipped like any other bad record.
    pub fn add_values(&mut self, values: Vec<Value>, parser: Option<&dyn SnippetParser>) -> LoadReport {
        let mut report = LoadReport::default();
        let mut dtos = Vec::with_capacity(values.len());
        for (index, value) in values.into_iter().enumerate() {
            match PatternDto::from_value(value) {
                Ok(dto) => dtos.push(dto),
                Err(e) => {
                    warn!("Skipping pattern record #{}: {}", index, e);
                    report.skipped += 1;
                    report.errors.push(format!("Pattern record #{} could not be read: {}", index, e));
                }
            }
        }
        report.merge(self.add_dtos(dtos, parser));
        report
    }

    /// Load a JSON array of [`PatternDto`] records. Only a document that is
    /// not a JSON array fails as a whole.
    pub fn load_json(&mut self, json: &str, parser: Option<&dyn SnippetParser>) -> Result<LoadReport> {
        let values: Vec<Value> = serde_json::from_str(json)?;
        Ok(self.add_values(values, parser))
    }

    /// Load a pattern file. The file as a whole must be a JSON array; bad
    /// records inside it are skipped individually.
    pub fn load_file(&mut self, path: &Path, parser: Option<&dyn SnippetParser>) -> Result<LoadReport> {
        let json = std::fs::read_to_string(path)?;
        let report = self.load_json(&json, parser)?;
        info!(
            "Loaded {} patterns from {} ({} skipped)",
            report.loaded,
            path.display(),
            report.skipped
        );
        Ok(report)
    }

    /// Records for every held pattern.
    pub fn to_dtos(&self) -> Vec<PatternDto> {
        self.patterns.iter().map(|p| PatternDto::from_root(p)).collect()
    }

    pub fn get(&self, key: &str) -> Option<&Arc<PatternRoot>> {
        self.patterns.iter().find(|p| p.key == key)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl PatternRepository for MemoryPatternRepository {
    fn all(&self) -> Vec<Arc<PatternRoot>> {
        self.patterns.clone()
    }
}
