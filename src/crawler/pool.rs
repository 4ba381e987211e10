//! Fixed-capacity worker pool
//!
//! The pool hands out a fixed number of tokens through a semaphore. A task is
//! spawned only after its token is acquired, so no more than `capacity` tasks
//! ever run at once and the dispatcher waits while the pool is saturated.
//! Tokens are released when dropped: on completion, on error paths and when a
//! task panics.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;

/// Live token accounting, shared by the pool and its tokens
#[derive(Debug, Default)]
struct PoolGauge {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

/// One unit of concurrency budget
///
/// Holding a token permits exactly one in-flight task. Dropping it returns
/// the slot to the pool.
#[derive(Debug)]
pub struct PoolToken {
    _permit: OwnedSemaphorePermit,
    gauge: Arc<PoolGauge>,
}

impl Drop for PoolToken {
    fn drop(&mut self) {
        self.gauge.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Bounded pool of spawned tasks
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    gauge: Arc<PoolGauge>,
    tasks: JoinSet<()>,
}

impl WorkerPool {
    /// Creates a pool with `capacity` tokens
    pub fn new(capacity: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            gauge: Arc::new(PoolGauge::default()),
            tasks: JoinSet::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Tokens currently held
    pub fn in_flight(&self) -> usize {
        self.gauge.in_flight.load(Ordering::Acquire)
    }

    /// Highest number of tokens held at the same time so far
    pub fn peak_in_flight(&self) -> usize {
        self.gauge.peak.load(Ordering::Acquire)
    }

    /// Waits for a free token
    pub async fn acquire(&self) -> Result<PoolToken, AcquireError> {
        let permit = Arc::clone(&self.semaphore).acquire_owned().await?;
        let held = self.gauge.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        self.gauge.peak.fetch_max(held, Ordering::AcqRel);
        Ok(PoolToken {
            _permit: permit,
            gauge: Arc::clone(&self.gauge),
        })
    }

    /// Acquires a token, then runs `task` on the runtime while holding it
    ///
    /// Waits while every token is in use.
    pub async fn spawn<F>(&mut self, task: F) -> Result<(), AcquireError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = self.acquire().await?;
        self.reap_finished();
        self.tasks.spawn(async move {
            let _token = token;
            task.await;
        });
        Ok(())
    }

    /// Collects already finished tasks so the join set stays small
    fn reap_finished(&mut self) {
        while let Some(result) = self.tasks.try_join_next() {
            if let Err(e) = result {
                tracing::error!("Worker task failed: {}", e);
            }
        }
    }

    /// Waits until every spawned task has finished
    pub async fn drain(&mut self) {
        while let Some(result) = self.tasks.join_next().await {
            if let Err(e) = result {
                tracing::error!("Worker task failed: {}", e);
            }
        }
    }
}
