//! # Function-backed runnable (`RunnableFn`)
//!
//! [`RunnableFn`] wraps a closure `F: Fn(CancellationToken, P) -> Fut`, producing a fresh
//! future per run. This is the in-process adapter: cancellation is delivered through the
//! token alone, so `init`, `abort` and `destroy` are no-ops.
//!
//! ## Concurrency semantics
//! - Each run gets its **own** future and a clone of the shared params.
//! - No hidden mutation between restarts; share state explicitly through `Arc<...>`
//!   captured by the closure.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use runvisor::{RunnableError, RunnableFn, RunnableRef};
//!
//! let r: RunnableRef<u64> = RunnableFn::arc(|ctx: CancellationToken, every_ms: u64| async move {
//!     while !ctx.is_cancelled() {
//!         tokio::time::sleep(std::time::Duration::from_millis(every_ms)).await;
//!     }
//!     Ok::<_, RunnableError>(())
//! });
//! # let _ = r;
//! ```

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::RunnableError;
use crate::runnables::runnable::Runnable;

/// Function-backed runnable implementation.
pub struct RunnableFn<F, P, R = ()> {
    f: F,
    _marker: PhantomData<fn(P) -> R>,
}

impl<F, P, R> RunnableFn<F, P, R> {
    /// Creates a new function-backed runnable.
    ///
    /// Prefer [`RunnableFn::arc`] when you immediately need a [`RunnableRef`](crate::RunnableRef).
    pub fn new(f: F) -> Self {
        Self {
            f,
            _marker: PhantomData,
        }
    }

    /// Creates the runnable and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut, P, R> Runnable<P, R> for RunnableFn<F, P, R>
where
    F: Fn(CancellationToken, P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, RunnableError>> + Send + 'static,
    P: Clone + Send + Sync + 'static,
    R: Send + 'static,
{
    async fn run(&self, ctx: CancellationToken, params: &P) -> Result<R, RunnableError> {
        (self.f)(ctx, params.clone()).await
    }
}
