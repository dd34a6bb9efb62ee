//! Explicit worker pool handle for block (de)compression.
//!
//! A [`WorkerPool`] wraps a rayon thread pool behind an `Arc`, so cloning the
//! handle shares the same threads between several pipelines or writers.
//! Results come back through per-task [`Ticket`]s; a consumer that keeps its
//! tickets in a FIFO gets results in submission order no matter which task
//! finishes first.
//!
//! Two implementations are available:
//! - **rayon** (feature `parallel`, default): tasks run on pool threads
//! - **inline** (without `parallel`): `submit` runs the task on the calling
//!   thread and the ticket is ready immediately
//!
//! # Example
//!
//! ```
//! use fgbam_lib::worker_pool::WorkerPool;
//!
//! let pool = WorkerPool::new(2).unwrap();
//! let tickets: Vec<_> = (0..4u64).map(|i| pool.submit(move || i * 10)).collect();
//! let results: Vec<u64> = tickets.into_iter().map(|t| t.wait().unwrap()).collect();
//! assert_eq!(results, vec![0, 10, 20, 30]);
//! ```

#[cfg(feature = "parallel")]
use std::sync::Arc;

#[cfg(feature = "parallel")]
use crossbeam_channel::{Receiver, bounded};

use crate::errors::{BamError, Result};

fn validate_threads(threads: usize) -> Result<()> {
    if threads == 0 {
        return Err(BamError::invalid_parameter("threads", "must be >= 1"));
    }
    Ok(())
}

// ============================================================================
// rayon backend
// ============================================================================

/// Shared handle to a fixed-size pool of worker threads.
#[cfg(feature = "parallel")]
#[derive(Debug, Clone)]
pub struct WorkerPool {
    pool: Arc<rayon::ThreadPool>,
}

#[cfg(feature = "parallel")]
impl WorkerPool {
    /// Create a pool with `threads` worker threads.
    ///
    /// # Errors
    ///
    /// Returns [`BamError::InvalidParameter`] if `threads` is zero or the
    /// threads cannot be spawned.
    pub fn new(threads: usize) -> Result<Self> {
        validate_threads(threads)?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("fgbam-worker-{i}"))
            .build()
            .map_err(|e| BamError::invalid_parameter("threads", e.to_string()))?;
        Ok(Self { pool: Arc::new(pool) })
    }

    /// Number of worker threads in the pool.
    #[must_use]
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run `task` on the pool, returning a ticket for its result.
    pub fn submit<T, F>(&self, task: F) -> Ticket<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = bounded(1);
        self.pool.spawn(move || {
            // The ticket may have been dropped; the result is discarded then
            let _ = tx.send(task());
        });
        Ticket { rx }
    }
}

/// Handle to the result of one submitted task.
#[cfg(feature = "parallel")]
#[derive(Debug)]
pub struct Ticket<T> {
    rx: Receiver<T>,
}

#[cfg(feature = "parallel")]
impl<T> Ticket<T> {
    /// Block until the task's result is available.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the task died without producing a result.
    pub fn wait(self) -> Result<T> {
        self.rx
            .recv()
            .map_err(|_| BamError::Io(std::io::Error::other("worker task ended without a result")))
    }

    /// Returns true if the result is already available.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        !self.rx.is_empty()
    }
}

// ============================================================================
// Inline backend
// ============================================================================

/// Stand-in pool that runs every task on the calling thread.
#[cfg(not(feature = "parallel"))]
#[derive(Debug, Clone)]
pub struct WorkerPool {
    threads: usize,
}

#[cfg(not(feature = "parallel"))]
impl WorkerPool {
    /// Create a handle; `threads` is recorded but no threads are spawned.
    ///
    /// # Errors
    ///
    /// Returns [`BamError::InvalidParameter`] if `threads` is zero.
    pub fn new(threads: usize) -> Result<Self> {
        validate_threads(threads)?;
        Ok(Self { threads })
    }

    /// Number of threads requested when the handle was created.
    #[must_use]
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Run `task` immediately, returning a ready ticket.
    pub fn submit<T, F>(&self, task: F) -> Ticket<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        Ticket { value: task() }
    }
}

/// Handle to the result of one submitted task.
#[cfg(not(feature = "parallel"))]
#[derive(Debug)]
pub struct Ticket<T> {
    value: T,
}

#[cfg(not(feature = "parallel"))]
impl<T> Ticket<T> {
    /// The task's result.
    pub fn wait(self) -> Result<T> {
        Ok(self.value)
    }

    /// Always true: the task ran at submission.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        true
    }
}
