//! ust_matcher - Multi-language pattern matching over Universal Syntax Trees
//!
//! Language front-ends turn source files into a language-neutral Universal
//! Syntax Tree (UST). This crate matches typed pattern trees against those USTs
//! to find security-relevant code shapes, independently of the source language.
//!
//! # Features
//!
//! - **UST model**: arena-backed trees with parent links computed once
//! - **Pattern model**: wildcards, logical combinators, regex leaves, depth-unbounded
//!   search and mirrors of every UST node kind
//! - **Matching engine**: pre-order walk with report-once or find-all semantics,
//!   cooperative per-file timeouts and isolation of faulting patterns
//! - **Pattern repositories**: built-in patterns and tolerant JSON pattern files
//! - **Reports**: text, JSON and SARIF
//!
//! # Architecture
//!
//! Files are independent: each is matched in its own pass on a bounded Rayon pool.
//! Within a pass patterns are tried sequentially, node by node.
//!
//! # Example Usage
//!
//! ```no_run
//! use ust_matcher::{Config, Scanner};
//! use std::path::PathBuf;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let scanner = Scanner::new(Config::default())?;
//!     let files = ust_matcher::collect_ust_files(&[PathBuf::from("out/")]);
//!     let summary = scanner.match_files(&files);
//!     println!("Found {} matches", summary.results.len());
//!     Ok(())
//! }
//! ```

pub mod concurrency;
pub mod config;
pub mod error;
pub mod matching;
pub mod models;
pub mod pattern;
pub mod reporter;
pub mod repository;
pub mod ust;

// Re-export commonly used types
pub use config::{Config, OutputFormat};
pub use error::{MatcherError, Result};
pub use matching::{MatchingContext, MatchingEngine, MatchingOptions};
pub use models::{Language, MatchingResult, RunSummary, SourceFile, TextSpan};
pub use pattern::{PatternNode, PatternRoot};
pub use repository::{DefaultPatternRepository, MemoryPatternRepository, PatternRepository};
pub use ust::{RootUst, UstBuilder};

use concurrency::{Quarantine, Shutdown, WorkerPool};
use config::PatternsConfig;
use rayon::prelude::*;
use repository::LoadReport;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Suffix of serialized front-end output.
pub const UST_FILE_SUFFIX: &str = ".ust.json";

/// Outcome of one file pass.
enum FileOutcome {
    Matched(Vec<MatchingResult>),
    Failed(String),
    Interrupted(String),
}

/// Runs a pattern repository over many trees.
pub struct Scanner {
    /// Configuration
    config: Config,

    /// Pattern source
    repository: Arc<dyn PatternRepository>,

    /// What loading the repository skipped
    load_report: LoadReport,

    /// Per-file matcher
    engine: MatchingEngine,

    /// Matching threads
    pool: WorkerPool,

    /// Shutdown flag polled between node visits
    shutdown: Shutdown,
}

impl Scanner {
    /// Create a scanner with the patterns named by `config`.
    pub fn new(config: Config) -> Result<Self> {
        let (repository, load_report) = load_repository(&config.patterns)?;
        let mut scanner = Self::with_repository(config, Arc::new(repository))?;
        scanner.load_report = load_report;
        Ok(scanner)
    }

    /// Create a scanner over an existing repository.
    pub fn with_repository(config: Config, repository: Arc<dyn PatternRepository>) -> Result<Self> {
        let pool = WorkerPool::new(&config.concurrency.pool())?;
        let engine = MatchingEngine::new(config.matching.options())
            .with_quarantine(Arc::new(Quarantine::new()));

        Ok(Self {
            config,
            repository,
            load_report: LoadReport::default(),
            engine,
            pool,
            shutdown: Shutdown::new(),
        })
    }

    /// Share a shutdown flag, e.g. one set by a signal handler.
    pub fn with_shutdown(mut self, shutdown: Shutdown) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn repository(&self) -> &Arc<dyn PatternRepository> {
        &self.repository
    }

    pub fn load_report(&self) -> &LoadReport {
        &self.load_report
    }

    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }

    /// Match one tree on the calling thread.
    pub fn match_tree(&self, tree: &RootUst) -> Result<Vec<MatchingResult>> {
        let language = tree.language();
        if !self.config.matching.accepts(language) {
            debug!("Skipping {}: {} not selected", tree.file(), language);
            return Ok(Vec::new());
        }
        let ids = self.config.matching.pattern_ids.as_deref();
        let patterns = self.repository.patterns(language, ids);
        let interrupt = self.shutdown.interrupt(self.config.concurrency.file_timeout());
        self.engine.match_tree(tree, &patterns, &interrupt)
    }

    /// Match already built trees in parallel.
    pub fn match_trees(&self, trees: &[RootUst]) -> RunSummary {
        self.run(trees, |tree| self.outcome(tree.file().path.as_path(), self.match_tree(tree)))
    }

    /// Load and match `*.ust.json` files in parallel. A file that cannot be
    /// read or converted yields no results and is counted as failed.
    pub fn match_files(&self, paths: &[PathBuf]) -> RunSummary {
        self.run(paths, |path| {
            let tree = std::fs::read_to_string(path)
                .map_err(MatcherError::from)
                .and_then(|json| RootUst::from_json(&json));
            match tree {
                Ok(tree) => self.outcome(path, self.match_tree(&tree)),
                Err(e) => {
                    warn!("Could not load {}: {}", path.display(), e);
                    FileOutcome::Failed(format!("{}: {}", path.display(), e))
                }
            }
        })
    }

    fn outcome(&self, path: &Path, result: Result<Vec<MatchingResult>>) -> FileOutcome {
        match result {
            Ok(results) => FileOutcome::Matched(results),
            Err(e) if e.is_interruption() => {
                warn!("{}", e);
                FileOutcome::Interrupted(e.to_string())
            }
            Err(e) => {
                error!("Matching failed for {}: {}", path.display(), e);
                FileOutcome::Failed(e.to_string())
            }
        }
    }

    /// Process items in batches to bound memory, each batch on the pool.
    fn run<T, F>(&self, items: &[T], pass: F) -> RunSummary
    where
        T: Sync,
        F: Fn(&T) -> FileOutcome + Sync,
    {
        let start_time = Instant::now();
        let mut summary = RunSummary::new();
        summary.stats.files_total = items.len();
        summary.stats.patterns_loaded = self.repository.all().len();
        summary.stats.patterns_skipped = self.load_report.skipped;
        summary.errors.extend(self.load_report.errors.iter().cloned());

        info!(
            "Matching {} files against {} patterns",
            items.len(),
            summary.stats.patterns_loaded
        );

        let batch_size = self.pool.batch_size();
        let total_batches = (items.len() + batch_size - 1) / batch_size;

        for (batch_idx, batch) in items.chunks(batch_size).enumerate() {
            debug!("Processing batch {}/{} ({} files)", batch_idx + 1, total_batches, batch.len());

            let outcomes: Vec<FileOutcome> = self
                .pool
                .install(|| batch.par_iter().map(&pass).collect());

            for outcome in outcomes {
                match outcome {
                    FileOutcome::Matched(results) => summary.add_file_results(results),
                    FileOutcome::Failed(message) => {
                        summary.stats.files_failed += 1;
                        summary.add_error(message);
                    }
                    FileOutcome::Interrupted(message) => {
                        summary.stats.files_interrupted += 1;
                        summary.add_error(message);
                    }
                }
            }
        }

        let quarantine = self.engine.quarantine();
        summary.stats.patterns_quarantined = quarantine.len();
        for key in quarantine.keys() {
            summary.add_error(format!("Pattern {} disabled after a fault", key));
        }

        summary.finish();
        info!(
            "Matching complete. Found {} results in {}ms",
            summary.results.len(),
            start_time.elapsed().as_millis()
        );
        summary
    }
}

/// Build the repository `config` describes: built-ins first, then each file in
/// order. Unreadable files are fatal, bad records inside them are not.
pub fn load_repository(config: &PatternsConfig) -> Result<(MemoryPatternRepository, LoadReport)> {
    let mut repository = if config.builtin {
        DefaultPatternRepository::new()?.into_inner()
    } else {
        MemoryPatternRepository::new()
    };
    let mut report = LoadReport {
        loaded: repository.len(),
        ..Default::default()
    };

    for path in &config.paths {
        report.merge(repository.load_file(path, None)?);
    }
    Ok((repository, report))
}

/// Expand files and directories into the `*.ust.json` files they hold, sorted.
pub fn collect_ust_files(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_file() {
            files.push(input.clone());
            continue;
        }
        for entry in walkdir::WalkDir::new(input)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let is_ust = entry
                .file_name()
                .to_str()
                .map_or(false, |name| name.ends_with(UST_FILE_SUFFIX));
            if entry.file_type().is_file() && is_ust {
                files.push(entry.into_path());
            }
        }
    }
    files.sort();
    files.dedup();
    files
}
