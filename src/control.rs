//! # Control surface for one pool.
//!
//! [`ControlApi`] is the handle a remote controller talks to: it names the pool
//! (a generated id plus a mutable label), reports state and size, and forwards
//! `scale`/`terminate`. Transport is left to the caller.
//!
//! ```rust
//! # use tokio_util::sync::CancellationToken;
//! # use runvisor::{ControlApi, Orchestrator, OrchestratorState, RunnableError, RunnableFn, RunnableRef};
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), runvisor::OrchestratorError> {
//! let factory = || async {
//!     let r: RunnableRef<()> = RunnableFn::arc(|ctx: CancellationToken, _: ()| async move {
//!         ctx.cancelled().await;
//!         Ok(())
//!     });
//!     Ok::<_, RunnableError>(r)
//! };
//! let api = ControlApi::new(Orchestrator::builder(factory, ()).build(), "ingest");
//!
//! api.scale("1").await?;
//! assert_eq!(api.concurrency(), 1);
//! assert_eq!(api.label(), "ingest");
//!
//! api.terminate().await?;
//! assert_eq!(api.state(), OrchestratorState::Terminated);
//! # Ok(())
//! # }
//! ```

use std::sync::{Arc, PoisonError, RwLock};

use uuid::Uuid;

use crate::concurrency::Concurrency;
use crate::core::{Orchestrator, OrchestratorState};
use crate::error::OrchestratorError;

/// Identified remote-control handle around an [`Orchestrator`].
pub struct ControlApi<P, R = ()>
where
    P: Send + Sync + 'static,
    R: Send + 'static,
{
    id: String,
    label: RwLock<String>,
    orchestrator: Arc<Orchestrator<P, R>>,
}

impl<P, R> ControlApi<P, R>
where
    P: Send + Sync + 'static,
    R: Send + 'static,
{
    /// Wraps `orchestrator` under a fresh random id.
    pub fn new(orchestrator: Arc<Orchestrator<P, R>>, label: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), orchestrator, label)
    }

    /// Wraps `orchestrator` under a caller-chosen id.
    pub fn with_id(
        id: impl Into<String>,
        orchestrator: Arc<Orchestrator<P, R>>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: RwLock::new(label.into()),
            orchestrator,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> String {
        self.label
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_label(&self, label: impl Into<String>) {
        *self.label.write().unwrap_or_else(PoisonError::into_inner) = label.into();
    }

    pub fn state(&self) -> OrchestratorState {
        self.orchestrator.state()
    }

    /// Current number of runners.
    pub fn concurrency(&self) -> usize {
        self.orchestrator.instances()
    }

    pub async fn scale(&self, target: impl Into<Concurrency>) -> Result<(), OrchestratorError> {
        self.orchestrator.scale(target).await
    }

    pub async fn terminate(&self) -> Result<(), OrchestratorError> {
        self.orchestrator.terminate().await
    }

    /// The wrapped orchestrator.
    pub fn orchestrator(&self) -> &Arc<Orchestrator<P, R>> {
        &self.orchestrator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio_util::sync::CancellationToken;

    use crate::error::RunnableError;
    use crate::runnables::{RunnableFn, RunnableRef};

    fn api() -> ControlApi<()> {
        let factory = || async {
            let r: RunnableRef<()> =
                RunnableFn::arc(|ctx: CancellationToken, _: ()| async move {
                    ctx.cancelled().await;
                    Ok(())
                });
            Ok::<_, RunnableError>(r)
        };
        ControlApi::new(Orchestrator::builder(factory, ()).build(), "alpha")
    }

    #[tokio::test]
    async fn test_identity() {
        let a = api();
        let b = api();
        assert_ne!(a.id(), b.id());
        assert_eq!(Uuid::parse_str(a.id()).unwrap().get_version_num(), 4);

        a.set_label("beta");
        assert_eq!(a.label(), "beta");
    }

    #[tokio::test]
    async fn test_forwards_to_orchestrator() {
        let api = api();
        api.scale(2).await.unwrap();
        assert_eq!(api.concurrency(), 2);
        assert_eq!(api.state(), OrchestratorState::Running);

        api.terminate().await.unwrap();
        assert_eq!(api.concurrency(), 0);
        assert!(api.terminate().await.is_err());
    }
}
