//! Callback Adapter - One Await Contract for Sync and Async Handlers
//!
//! Wraps a single user function. Async functions are awaited in place on
//! the scheduler; plain functions are shipped to the `WorkerPool` so a
//! slow handler cannot stall the feeds sharing that scheduler. Which path
//! applies is fixed when the adapter is built.

use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use super::worker_pool::WorkerPool;
use crate::error::CallbackError;

type BlockingFn<A> = Arc<dyn Fn(A) -> anyhow::Result<()> + Send + Sync>;
type AsyncFn<A> = Arc<dyn Fn(A) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

enum UserFn<A> {
    Blocking { func: BlockingFn<A>, pool: WorkerPool },
    Async(AsyncFn<A>),
}

/// Delivers event records of type `A` to a user function.
pub struct CallbackAdapter<A> {
    user_fn: Option<UserFn<A>>,
    is_async: bool,
}

impl<A: Send + 'static> CallbackAdapter<A> {
    /// Adapter with no user function; every call completes immediately.
    pub const fn noop() -> Self {
        Self {
            user_fn: None,
            is_async: false,
        }
    }

    /// Wrap a synchronous function. Calls run on `pool`.
    pub fn blocking<F>(func: F, pool: WorkerPool) -> Self
    where
        F: Fn(A) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            user_fn: Some(UserFn::Blocking {
                func: Arc::new(func),
                pool,
            }),
            is_async: false,
        }
    }

    /// Wrap an asynchronous function. Calls are awaited on the caller's task.
    pub fn asynchronous<F, Fut>(func: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let func: AsyncFn<A> =
            Arc::new(move |event| -> BoxFuture<'static, anyhow::Result<()>> { Box::pin(func(event)) });
        Self {
            user_fn: Some(UserFn::Async(func)),
            is_async: true,
        }
    }

    pub const fn is_async(&self) -> bool {
        self.is_async
    }

    pub const fn is_noop(&self) -> bool {
        self.user_fn.is_none()
    }

    /// Deliver `event` and wait until the user function has finished.
    ///
    /// Errors returned by the user function come back as
    /// `CallbackError::Failed`; a panic in a blocking function as
    /// `CallbackError::Panicked`.
    pub async fn call(&self, event: A) -> Result<(), CallbackError> {
        match &self.user_fn {
            None => Ok(()),
            Some(UserFn::Async(func)) => func(event).await.map_err(CallbackError::Failed),
            Some(UserFn::Blocking { func, pool }) => {
                let func = Arc::clone(func);
                pool.run(move || func(event))
                    .await?
                    .map_err(CallbackError::Failed)
            }
        }
    }
}

impl<A> Clone for CallbackAdapter<A> {
    fn clone(&self) -> Self {
        let user_fn = self.user_fn.as_ref().map(|f| match f {
            UserFn::Blocking { func, pool } => UserFn::Blocking {
                func: Arc::clone(func),
                pool: pool.clone(),
            },
            UserFn::Async(func) => UserFn::Async(Arc::clone(func)),
        });
        Self {
            user_fn,
            is_async: self.is_async,
        }
    }
}

impl<A> std::fmt::Debug for CallbackAdapter<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackAdapter")
            .field("is_async", &self.is_async)
            .field("noop", &self.user_fn.is_none())
            .finish()
    }
}
