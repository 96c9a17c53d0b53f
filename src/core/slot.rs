//! # Slot: one pool member and its teardown.
//!
//! A [`Slot`] bundles a runner with its supervision loop handle and a retire token.
//! Scale-down and terminate both go through [`Slot::retire`], which runs the stop
//! sequence at most once even when both race for the same runner.
//!
//! ## Stop sequence
//! ```text
//! retire token.cancel()            (loop stops restarting at its next safe point)
//! loop on runner state:
//!   Destroyed | Crashed                       → done
//!   Running                                   → abort()
//!   Ready | Stopped | Completed | Error       → destroy()
//!   Created | Initializing | Starting | Stopping → wait for the next transition
//! join supervision loop
//! ```
//! A step rejected because the runner moved on in the meantime is simply retried from
//! the new state. The first adapter error (abort or destroy) is returned once the runner
//! is torn down.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::{sync::OnceCell, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::core::supervise::{supervise, Shared};
use crate::error::RunnerError;
use crate::runner::{Runner, RunnerState};

pub(crate) struct Slot<P, R>
where
    P: Send + Sync + 'static,
    R: Send + 'static,
{
    pub id: u64,
    pub runner: Arc<Runner<P, R>>,
    retire: CancellationToken,
    handle: Mutex<Option<JoinHandle<()>>>,
    teardown: OnceCell<()>,
}

impl<P, R> Slot<P, R>
where
    P: Send + Sync + 'static,
    R: Send + 'static,
{
    pub fn new(id: u64, runner: Arc<Runner<P, R>>, retire: CancellationToken) -> Self {
        Self {
            id,
            runner,
            retire,
            handle: Mutex::new(None),
            teardown: OnceCell::new(),
        }
    }

    /// Spawns the supervision loop. Returns `false` if the slot was already retired.
    pub fn start(&self, shared: Arc<Shared<P>>) -> bool {
        let mut handle = self.handle.lock().unwrap_or_else(PoisonError::into_inner);
        if self.retire.is_cancelled() {
            return false;
        }
        *handle = Some(tokio::spawn(supervise(
            shared,
            self.id,
            Arc::clone(&self.runner),
            self.retire.clone(),
        )));
        true
    }

    /// Stops and destroys the runner, then joins its supervision loop.
    pub async fn retire(&self) -> Result<(), RunnerError> {
        self.teardown
            .get_or_try_init(|| async {
                self.retire.cancel();
                let stopped = stop_runner(&self.runner).await;

                let handle = self
                    .handle
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .take();
                if let Some(handle) = handle {
                    if let Err(e) = handle.await {
                        tracing::warn!(runner = self.id, error = %e, "supervision loop ended abnormally");
                    }
                }
                stopped
            })
            .await
            .map(|_| ())
    }
}

async fn stop_runner<P, R>(runner: &Runner<P, R>) -> Result<(), RunnerError>
where
    P: Send + Sync + 'static,
    R: Send + 'static,
{
    let mut changes = runner.subscribe();
    let mut failure = None;

    loop {
        let state = *changes.borrow_and_update();
        let step = match state {
            // Crashed runners hold nothing to release.
            RunnerState::Destroyed | RunnerState::Crashed => break,
            RunnerState::Running => runner.abort().await,
            s if s.is_idle() => runner.destroy().await,
            _ => {
                if changes.changed().await.is_err() {
                    break;
                }
                continue;
            }
        };
        match step {
            Ok(()) | Err(RunnerError::InvalidTransition(_)) => {}
            Err(e) => {
                failure.get_or_insert(e);
            }
        }
    }
    failure.map_or(Ok(()), Err)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::error::RunnableError;
    use crate::events::Bus;
    use crate::policies::BackoffPolicy;
    use crate::runnables::{Runnable, RunnableRef};

    #[derive(Default)]
    struct Tally {
        aborts: AtomicUsize,
        destroys: AtomicUsize,
        fail_abort: bool,
    }

    #[async_trait]
    impl Runnable<()> for Tally {
        async fn run(&self, ctx: CancellationToken, _: &()) -> Result<(), RunnableError> {
            ctx.cancelled().await;
            Ok(())
        }

        async fn abort(&self) -> Result<(), RunnableError> {
            self.aborts.fetch_add(1, Ordering::SeqCst);
            if self.fail_abort {
                return Err(RunnableError::fail("stuck"));
            }
            Ok(())
        }

        async fn destroy(&self) -> Result<(), RunnableError> {
            self.destroys.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    async fn started(tally: Arc<Tally>) -> Arc<Slot<(), ()>> {
        let runnable: RunnableRef<()> = tally;
        let runner = Runner::arc(runnable);
        runner.init().await.unwrap();

        let shared = Arc::new(Shared::new((), Bus::new(16), BackoffPolicy::default()));
        let slot = Arc::new(Slot::new(1, runner, CancellationToken::new()));
        assert!(slot.start(shared));

        let mut changes = slot.runner.subscribe();
        changes
            .wait_for(|s| *s == RunnerState::Running)
            .await
            .unwrap();
        slot
    }

    #[tokio::test]
    async fn test_retire_aborts_then_destroys() {
        let tally = Arc::new(Tally::default());
        let slot = started(tally.clone()).await;

        slot.retire().await.unwrap();
        assert_eq!(slot.runner.state(), RunnerState::Destroyed);
        assert_eq!(tally.aborts.load(Ordering::SeqCst), 1);
        assert_eq!(tally.destroys.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_retire_tears_down_once() {
        let tally = Arc::new(Tally::default());
        let slot = started(tally.clone()).await;

        let (a, b) = tokio::join!(slot.retire(), slot.retire());
        a.unwrap();
        b.unwrap();
        assert_eq!(tally.aborts.load(Ordering::SeqCst), 1);
        assert_eq!(tally.destroys.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_abort_error_still_destroys() {
        let tally = Arc::new(Tally {
            fail_abort: true,
            ..Tally::default()
        });
        let slot = started(tally.clone()).await;

        let err = slot.retire().await.unwrap_err();
        assert!(matches!(err, RunnerError::Abort(_)), "{err:?}");
        assert_eq!(slot.runner.state(), RunnerState::Destroyed);
        assert_eq!(tally.destroys.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retired_slot_does_not_start() {
        let runnable: RunnableRef<()> = Arc::new(Tally::default());
        let runner = Runner::arc(runnable);
        runner.init().await.unwrap();

        let slot = Slot::new(3, runner, CancellationToken::new());
        slot.retire().await.unwrap();

        let shared = Arc::new(Shared::new((), Bus::new(1), BackoffPolicy::default()));
        assert!(!slot.start(shared));
        assert_eq!(slot.runner.state(), RunnerState::Destroyed);
    }
}
