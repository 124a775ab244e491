//! Bounded worker pool for inference
//!
//! Admission is FIFO (tokio's semaphore is fair). Tasks run on blocking
//! threads and keep their slot until they finish, even if the caller stops
//! waiting; there is no cancellation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::Semaphore;

use crate::config::PoolConfig;

/// Worker pool errors
#[derive(Error, Debug)]
pub enum PoolError {
    /// The wait queue is at its configured bound
    #[error("worker pool overloaded: {queued} requests already waiting")]
    Overloaded { queued: usize },

    /// The pool was shut down
    #[error("worker pool is shut down")]
    Closed,

    /// The task panicked
    #[error("worker task failed: {0}")]
    TaskFailed(String),
}

/// Pool occupancy snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStatus {
    pub size: usize,
    pub in_flight: usize,
    pub queued: usize,
    pub max_queued: Option<usize>,
}

/// Fixed-capacity execution pool
#[derive(Debug, Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    size: usize,
    max_queued: Option<usize>,
    queued: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
}

/// Decrements a counter when dropped
struct CounterGuard(Arc<AtomicUsize>);

impl CounterGuard {
    fn enter(counter: &Arc<AtomicUsize>) -> (Self, usize) {
        let before = counter.fetch_add(1, Ordering::SeqCst);
        (Self(Arc::clone(counter)), before)
    }
}

impl Drop for CounterGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl WorkerPool {
    /// Create a pool running at most `size` tasks at once
    pub fn new(size: usize, max_queued: Option<usize>) -> Self {
        let size = size.max(1);
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
            max_queued,
            queued: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn from_config(config: &PoolConfig) -> Self {
        Self::new(config.workers, config.max_queued)
    }

    /// Run `task` on a blocking thread once a slot is free
    pub async fn run<F, T>(&self, task: F) -> Result<T, PoolError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (waiting, ahead) = CounterGuard::enter(&self.queued);
        if let Some(limit) = self.max_queued {
            if ahead >= limit && self.permits.available_permits() == 0 {
                tracing::warn!("Worker pool overloaded ({} waiting)", ahead);
                return Err(PoolError::Overloaded { queued: ahead });
            }
        }

        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| PoolError::Closed)?;
        drop(waiting);

        let (active, _) = CounterGuard::enter(&self.in_flight);
        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let _active = active;
            task()
        });

        handle
            .await
            .map_err(|e| PoolError::TaskFailed(e.to_string()))
    }

    /// Stop admitting work. Running tasks finish; waiting callers get `Closed`.
    pub fn close(&self) {
        self.permits.close();
    }

    pub fn is_closed(&self) -> bool {
        self.permits.is_closed()
    }

    pub fn status(&self) -> PoolStatus {
        PoolStatus {
            size: self.size,
            in_flight: self.in_flight.load(Ordering::SeqCst),
            queued: self.queued.load(Ordering::SeqCst),
            max_queued: self.max_queued,
        }
    }
}
