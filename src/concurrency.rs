//! Concurrency utilities for matching runs.
//!
//! This module provides:
//! - **Worker Pool**: a bounded Rayon pool sized from configuration or core count
//! - **Interrupts**: cooperative cancellation combining a shared shutdown flag with
//!   a per-file deadline, polled by the tree walk between node visits
//! - **Quarantine**: the set of patterns disabled after faulting, shared by all workers
//!
//! File passes share no mutable state besides the quarantine and the shutdown flag.
//! Each pass owns its tree and builds its own matching contexts.

use crate::error::{MatcherError, Result};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

// ============================================================================
// Worker Pool
// ============================================================================

/// Configuration for the matching worker pool.
#[derive(Debug, Clone)]
pub struct WorkerPoolConfig {
    /// Number of worker threads. 0 means one per logical core.
    pub threads: usize,
    /// Files handed to the pool per parallel batch.
    pub batch_size: usize,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            threads: 0,
            batch_size: 64,
        }
    }
}

/// A bounded Rayon pool running one matching pass per file.
pub struct WorkerPool {
    pool: rayon::ThreadPool,
    threads: usize,
    batch_size: usize,
}

impl WorkerPool {
    pub fn new(config: &WorkerPoolConfig) -> Result<Self> {
        let total_cores = num_cpus::get();
        let threads = if config.threads == 0 {
            total_cores
        } else {
            config.threads
        };

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|idx| format!("ust-match-{}", idx))
            .build()?;

        info!(
            "Worker pool: {} threads ({} cores available), batches of {}",
            threads, total_cores, config.batch_size
        );

        Ok(Self {
            pool,
            threads,
            batch_size: config.batch_size.max(1),
        })
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Run `op` inside the pool so that nested `par_iter` calls use its threads.
    pub fn install<R, F>(&self, op: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(op)
    }
}

// ============================================================================
// Interrupts
// ============================================================================

/// Shared shutdown flag, set from a signal handler or by the embedding code.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    flag: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        if !self.flag.swap(true, Ordering::SeqCst) {
            warn!("Shutdown requested, aborting in-flight files");
        }
    }

    pub fn is_requested(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Interrupt for one file pass with an optional deadline.
    pub fn interrupt(&self, timeout: Option<Duration>) -> Interrupt {
        let started = Instant::now();
        Interrupt {
            shutdown: self.clone(),
            started,
            deadline: timeout.map(|t| started + t),
        }
    }
}

/// Cooperative cancellation check for one file pass.
#[derive(Debug, Clone)]
pub struct Interrupt {
    shutdown: Shutdown,
    started: Instant,
    deadline: Option<Instant>,
}

impl Interrupt {
    /// An interrupt that never fires.
    pub fn none() -> Self {
        Shutdown::new().interrupt(None)
    }

    /// Fails with [`MatcherError::Interrupted`] after shutdown and with
    /// [`MatcherError::Timeout`] past the deadline.
    pub fn check(&self, file: &str) -> Result<()> {
        if self.shutdown.is_requested() {
            return Err(MatcherError::Interrupted {
                file: file.to_string(),
            });
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(MatcherError::Timeout {
                    file: file.to_string(),
                    elapsed_ms: self.started.elapsed().as_millis() as u64,
                });
            }
        }
        Ok(())
    }
}

// ============================================================================
// Quarantine
// ============================================================================

/// Patterns disabled for the rest of a run after a fault inside a match attempt.
#[derive(Debug, Default)]
pub struct Quarantine {
    keys: parking_lot::Mutex<HashSet<String>>,
    faults: AtomicU64,
}

impl Quarantine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fault. Returns true the first time a key is quarantined.
    pub fn insert(&self, key: &str) -> bool {
        self.faults.fetch_add(1, Ordering::Relaxed);
        let inserted = self.keys.lock().insert(key.to_string());
        if inserted {
            debug!("Pattern {} quarantined", key);
        }
        inserted
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.lock().contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.lock().is_empty()
    }

    /// Total faults seen, including repeats from workers racing on one key.
    pub fn faults(&self) -> u64 {
        self.faults.load(Ordering::Relaxed)
    }

    /// Sorted quarantined keys.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.keys.lock().iter().cloned().collect();
        keys.sort();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_pool_default() {
        let pool = WorkerPool::new(&WorkerPoolConfig::default()).unwrap();
        assert_eq!(pool.threads(), num_cpus::get());
        assert_eq!(pool.batch_size(), 64);
    }

    #[test]
    fn test_worker_pool_custom() {
        let config = WorkerPoolConfig {
            threads: 2,
            batch_size: 0,
        };
        let pool = WorkerPool::new(&config).unwrap();
        assert_eq!(pool.threads(), 2);
        assert_eq!(pool.batch_size(), 1);
        assert_eq!(pool.install(rayon::current_num_threads), 2);
    }

    #[test]
    fn test_interrupt_on_shutdown() {
        let shutdown = Shutdown::new();
        let interrupt = shutdown.interrupt(None);
        assert!(interrupt.check("a.js").is_ok());

        shutdown.request();
        let err = interrupt.check("a.js").unwrap_err();
        assert!(matches!(err, MatcherError::Interrupted { .. }));
    }

    #[test]
    fn test_interrupt_on_deadline() {
        let interrupt = Shutdown::new().interrupt(Some(Duration::ZERO));
        let err = interrupt.check("slow.php").unwrap_err();
        assert!(matches!(err, MatcherError::Timeout { .. }));
        assert!(Interrupt::none().check("slow.php").is_ok());
    }

    #[test]
    fn test_quarantine() {
        let quarantine = Quarantine::new();
        assert!(quarantine.insert("b"));
        assert!(!quarantine.insert("b"));
        assert!(quarantine.insert("a"));

        assert!(quarantine.contains("a"));
        assert_eq!(quarantine.len(), 2);
        assert_eq!(quarantine.faults(), 3);
        assert_eq!(quarantine.keys(), vec!["a".to_string(), "b".to_string()]);
    }
}
