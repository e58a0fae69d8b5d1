//! Worker Pool - Explicit Offload Target for Blocking Callbacks
//!
//! Synchronous user callbacks must never run on the scheduler thread
//! that drives every feed. The pool runs them on the tokio blocking
//! pool of a chosen runtime, bounded by a semaphore so the host decides
//! how many may run at once.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::runtime::Handle;
use tokio::sync::Semaphore;

use crate::error::{CallbackError, panic_message};

/// Cloneable handle to a bounded set of blocking workers.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    /// Runtime whose blocking pool executes the jobs.
    handle: Handle,
    /// One permit per concurrently running job.
    permits: Arc<Semaphore>,
    /// Configured maximum concurrency.
    size: usize,
}

impl WorkerPool {
    /// Create a pool bound to `handle` running at most `size` jobs at once.
    pub fn new(handle: Handle, size: usize) -> Self {
        let size = size.max(1);
        Self {
            handle,
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    /// Create a pool bound to the runtime of the calling context.
    pub fn current(size: usize) -> Result<Self> {
        let handle = Handle::try_current()
            .context("WorkerPool::current called outside a tokio runtime")?;
        Ok(Self::new(handle, size))
    }

    /// Configured maximum concurrency.
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Workers not currently running a job.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Refuse new jobs. Jobs already running finish normally.
    pub fn close(&self) {
        self.permits.close();
    }

    /// Run `job` on a blocking worker and wait for its result.
    ///
    /// The permit moves into the worker, so it is released when the job
    /// finishes even if the awaiting future is dropped first.
    pub async fn run<F, R>(&self, job: F) -> Result<R, CallbackError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| CallbackError::PoolClosed)?;

        self.handle
            .spawn_blocking(move || {
                let _permit = permit;
                job()
            })
            .await
            .map_err(|e| {
                if e.is_panic() {
                    CallbackError::Panicked(panic_message(e.into_panic().as_ref()))
                } else {
                    CallbackError::PoolClosed
                }
            })
    }
}
