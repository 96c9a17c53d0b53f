//! # Runnable abstraction.
//!
//! A [`Runnable`] is the pluggable unit of user work. It may execute in-process, in a
//! worker thread or in a subprocess; the [`Runner`](crate::Runner) only sees this trait.
//!
//! `run` receives a fresh [`CancellationToken`] per call. The runner cancels it on
//! `abort` before forwarding to [`Runnable::abort`], so in-process runnables usually
//! only need to watch the token.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::RunnableError;

/// Shared handle to a runnable.
pub type RunnableRef<P, R = ()> = Arc<dyn Runnable<P, R>>;

/// # Asynchronous, cancelable unit of work.
///
/// Methods take `&self`: `abort` is called while `run` is in flight, so implementors
/// keep any mutable state behind their own synchronization.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use runvisor::{Runnable, RunnableError};
///
/// struct Poller;
///
/// #[async_trait]
/// impl Runnable<String> for Poller {
///     async fn run(&self, ctx: CancellationToken, url: &String) -> Result<(), RunnableError> {
///         while !ctx.is_cancelled() {
///             // poll `url`...
///             # let _ = url;
///             # break;
///         }
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Runnable<P, R = ()>: Send + Sync + 'static
where
    P: Send + Sync + 'static,
    R: Send + 'static,
{
    /// Prepares the runnable. Called once before the first run, and again after a crash.
    async fn init(&self) -> Result<(), RunnableError> {
        Ok(())
    }

    /// Executes one run until completion, failure or cancellation.
    async fn run(&self, ctx: CancellationToken, params: &P) -> Result<R, RunnableError>;

    /// Requests cancellation of the current run.
    ///
    /// The run's token is already cancelled when this is called.
    async fn abort(&self) -> Result<(), RunnableError> {
        Ok(())
    }

    /// Releases resources. Safe to call even if the runnable never ran.
    async fn destroy(&self) -> Result<(), RunnableError> {
        Ok(())
    }
}
