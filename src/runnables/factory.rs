//! # Runnable factory.
//!
//! The orchestrator calls its factory once per scale-up step; instances are never
//! reused across runners. Any `Fn() -> Future<Output = Result<RunnableRef, _>>`
//! closure is a factory.

use std::future::Future;

use async_trait::async_trait;

use crate::error::RunnableError;
use crate::runnables::runnable::RunnableRef;

/// Produces fresh [`Runnable`](crate::Runnable) instances.
#[async_trait]
pub trait RunnableFactory<P, R = ()>: Send + Sync + 'static
where
    P: Send + Sync + 'static,
    R: Send + 'static,
{
    /// Creates a new instance.
    async fn create(&self) -> Result<RunnableRef<P, R>, RunnableError>;
}

#[async_trait]
impl<F, Fut, P, R> RunnableFactory<P, R> for F
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<RunnableRef<P, R>, RunnableError>> + Send + 'static,
    P: Send + Sync + 'static,
    R: Send + 'static,
{
    async fn create(&self) -> Result<RunnableRef<P, R>, RunnableError> {
        (self)().await
    }
}
