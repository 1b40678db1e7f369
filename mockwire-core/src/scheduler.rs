//! Deferred task queue.
//!
//! All asynchrony in a simulated network is expressed as tasks on this
//! queue. Nothing runs until the owner drives the queue, so a caller that
//! attaches listeners right after an operation returns still observes every
//! event that operation produces.
//!
//! # Ordering
//!
//! - Tasks run in FIFO order of [`Scheduler::defer`] calls.
//! - Each task runs to completion before the next one starts.
//! - The queue is never locked while a task runs; a task may defer more
//!   work, which lands at the back of the queue.
//!
//! ```rust
//! use mockwire_core::scheduler::Scheduler;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let scheduler = Scheduler::new();
//! let hits = Arc::new(AtomicUsize::new(0));
//!
//! let h = hits.clone();
//! scheduler.defer(move || {
//!     h.fetch_add(1, Ordering::SeqCst);
//! });
//! assert_eq!(hits.load(Ordering::SeqCst), 0);
//!
//! scheduler.run_until_idle();
//! assert_eq!(hits.load(Ordering::SeqCst), 1);
//! ```

use flume::{Receiver, Sender};
use tracing::trace;

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Single-threaded cooperative FIFO task queue.
#[derive(Clone)]
pub struct Scheduler {
    tx: Sender<Task>,
    rx: Receiver<Task>,
}

impl Scheduler {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = flume::unbounded();
        Self { tx, rx }
    }

    /// Schedule `task` to run after the current call stack unwinds.
    pub fn defer<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        // Both halves live in `self`, so the channel cannot be disconnected.
        let _ = self.tx.send(Box::new(task));
    }

    /// Run the tasks that were queued when this call started.
    ///
    /// Tasks enqueued by those tasks wait for the next call. Returns the
    /// number of tasks executed.
    pub fn run_pending(&self) -> usize {
        let batch = self.rx.len();
        let mut ran = 0;
        while ran < batch {
            match self.rx.try_recv() {
                Ok(task) => {
                    task();
                    ran += 1;
                }
                Err(_) => break,
            }
        }
        trace!(ran, remaining = self.rx.len(), "scheduler tick");
        ran
    }

    /// Run tasks until the queue is empty, including newly deferred ones.
    ///
    /// Returns the number of tasks executed.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.rx.try_recv() {
            task();
            ran += 1;
        }
        trace!(ran, "scheduler idle");
        ran
    }

    /// Number of queued tasks.
    #[inline]
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Returns true if nothing is queued.
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.rx.is_empty()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.pending())
            .finish()
    }
}
