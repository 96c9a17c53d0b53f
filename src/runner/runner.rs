//! # Runner: lifecycle state machine around one runnable.
//!
//! A [`Runner`] owns exactly one [`Runnable`](crate::Runnable) and drives it through the
//! [`RunnerState`] table. Every operation sends its event **before** touching the
//! runnable, so an out-of-table request fails without side effects.
//!
//! ## Flow
//! ```text
//! init():    send(init) ─► runnable.init() ─┬─ Ok  ─► send(inited)   → Ready
//!                                           └─ Err ─► send(crash)    → Crashed
//!
//! run(p):    send(start) ─► new token + settlement ─► runnable.run(token, p) issued
//!            ─► send(started) → Running ─► await
//!                 ├─ Ok  ─► Stopping? send(stopped) : send(complete) ─► fulfill
//!                 └─ Err ─► Stopping? send(stopped) : send(error)    ─► fail
//!
//! abort():   send(stop) → Stopping ─► cancel token ─► runnable.abort() ─► await settlement
//!
//! destroy(): send(destroy) → Destroyed ─► runnable.destroy() ─► drop settlement
//! ```
//!
//! ## Rules
//! - `abort()` never returns before the in-flight run has unwound.
//! - An error from `Runnable::abort` is returned from `abort()` only after settlement;
//!   the state still lands on `Stopped`.
//! - Concurrent `abort()` calls are allowed; each forwards to the runnable.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::error::RunnerError;
use crate::fsm::StateMachine;
use crate::runnables::RunnableRef;
use crate::runner::settlement::Settlement;
use crate::runner::state::{RunnerEvent, RunnerState, RunnerTransitions};

/// Per-run handles shared with `abort()`.
#[derive(Default)]
struct InFlight {
    ctx: Option<CancellationToken>,
    settlement: Option<Settlement>,
}

/// State-machine wrapper around one [`Runnable`](crate::Runnable) instance.
pub struct Runner<P, R = ()>
where
    P: Send + Sync + 'static,
    R: Send + 'static,
{
    runnable: RunnableRef<P, R>,
    fsm: StateMachine<RunnerTransitions>,
    in_flight: Mutex<InFlight>,
}

impl<P, R> Runner<P, R>
where
    P: Send + Sync + 'static,
    R: Send + 'static,
{
    /// Wraps `runnable` in a runner in the `Created` state.
    pub fn new(runnable: RunnableRef<P, R>) -> Self {
        Self {
            runnable,
            fsm: StateMachine::new(RunnerState::Created),
            in_flight: Mutex::new(InFlight::default()),
        }
    }

    /// Shorthand for `Arc::new(Runner::new(runnable))`.
    pub fn arc(runnable: RunnableRef<P, R>) -> Arc<Self> {
        Arc::new(Self::new(runnable))
    }

    /// Returns the current state.
    #[inline]
    pub fn state(&self) -> RunnerState {
        self.fsm.state()
    }

    /// Returns a receiver notified on every state transition.
    pub fn subscribe(&self) -> watch::Receiver<RunnerState> {
        self.fsm.subscribe()
    }

    /// Initializes the runnable.
    ///
    /// On failure the runner moves to `Crashed` and may be initialized again.
    pub async fn init(&self) -> Result<(), RunnerError> {
        self.fsm.send(RunnerEvent::Init)?;
        match self.runnable.init().await {
            Ok(()) => {
                self.fsm.send(RunnerEvent::Inited)?;
                Ok(())
            }
            Err(e) => {
                self.fsm.send(RunnerEvent::Crash)?;
                Err(RunnerError::Init(e))
            }
        }
    }

    /// Executes one run of the runnable.
    ///
    /// The runner reports `Running` as soon as the call is issued, before it resolves.
    pub async fn run(&self, params: &P) -> Result<R, RunnerError> {
        self.fsm.send(RunnerEvent::Start)?;

        let ctx = CancellationToken::new();
        let settlement = Settlement::new();
        {
            let mut in_flight = self.lock_in_flight();
            in_flight.ctx = Some(ctx.clone());
            in_flight.settlement = Some(settlement.clone());
        }

        let call = self.runnable.run(ctx, params);
        self.fsm.send(RunnerEvent::Started)?;
        let res = call.await;

        match res {
            Ok(out) => {
                self.fsm.send_by(|state| match state {
                    RunnerState::Stopping => RunnerEvent::Stopped,
                    _ => RunnerEvent::Complete,
                })?;
                settlement.fulfill();
                Ok(out)
            }
            Err(e) => {
                self.fsm.send_by(|state| match state {
                    RunnerState::Stopping => RunnerEvent::Stopped,
                    _ => RunnerEvent::Error,
                })?;
                settlement.fail(&e);
                Err(RunnerError::Run(e))
            }
        }
    }

    /// Requests cancellation of the in-flight run and waits until it unwinds.
    pub async fn abort(&self) -> Result<(), RunnerError> {
        self.fsm.send(RunnerEvent::Stop)?;

        let (ctx, settlement) = {
            let in_flight = self.lock_in_flight();
            (in_flight.ctx.clone(), in_flight.settlement.clone())
        };
        if let Some(ctx) = ctx {
            ctx.cancel();
        }

        let aborted = self.runnable.abort().await;
        if let Some(settlement) = settlement {
            settlement.settled().await;
        }
        aborted.map_err(RunnerError::Abort)
    }

    /// Releases the runnable. Terminal.
    pub async fn destroy(&self) -> Result<(), RunnerError> {
        self.fsm.send(RunnerEvent::Destroy)?;
        let res = self.runnable.destroy().await;
        *self.lock_in_flight() = InFlight::default();
        res.map_err(RunnerError::Destroy)
    }

    fn lock_in_flight(&self) -> std::sync::MutexGuard<'_, InFlight> {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<P, R> std::fmt::Debug for Runner<P, R>
where
    P: Send + Sync + 'static,
    R: Send + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use crate::error::RunnableError;
    use crate::runnables::{Runnable, RunnableFn};

    /// Runs until cancelled; counts calls into every hook.
    #[derive(Default)]
    struct Probe {
        inits: AtomicUsize,
        runs: AtomicUsize,
        aborts: AtomicUsize,
        destroys: AtomicUsize,
        fail_init: bool,
        fail_abort: bool,
    }

    #[async_trait]
    impl Runnable<()> for Probe {
        async fn init(&self) -> Result<(), RunnableError> {
            self.inits.fetch_add(1, Ordering::SeqCst);
            if self.fail_init {
                return Err(RunnableError::fatal("no config"));
            }
            Ok(())
        }

        async fn run(&self, ctx: CancellationToken, _: &()) -> Result<(), RunnableError> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            ctx.cancelled().await;
            Ok(())
        }

        async fn abort(&self) -> Result<(), RunnableError> {
            self.aborts.fetch_add(1, Ordering::SeqCst);
            if self.fail_abort {
                return Err(RunnableError::fail("abort refused"));
            }
            Ok(())
        }

        async fn destroy(&self) -> Result<(), RunnableError> {
            self.destroys.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    async fn wait_for_state(runner: &Runner<()>, want: RunnerState) {
        let mut rx = runner.subscribe();
        tokio::time::timeout(Duration::from_secs(1), rx.wait_for(|s| *s == want))
            .await
            .expect("state not reached")
            .expect("runner dropped");
    }

    #[tokio::test]
    async fn test_init_then_destroy() {
        let probe = Arc::new(Probe::default());
        let runner: Runner<()> = Runner::new(probe.clone());
        assert_eq!(runner.state(), RunnerState::Created);

        runner.init().await.unwrap();
        assert_eq!(runner.state(), RunnerState::Ready);

        runner.destroy().await.unwrap();
        assert_eq!(runner.state(), RunnerState::Destroyed);
        assert_eq!(probe.destroys.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_init_failure_crashes_and_allows_reinit() {
        let probe = Arc::new(Probe {
            fail_init: true,
            ..Probe::default()
        });
        let runner: Runner<()> = Runner::new(probe.clone());

        let err = runner.init().await.unwrap_err();
        assert!(matches!(err, RunnerError::Init(RunnableError::Fatal { .. })));
        assert_eq!(runner.state(), RunnerState::Crashed);

        let _ = runner.init().await;
        assert_eq!(probe.inits.load(Ordering::SeqCst), 2);
        assert_eq!(runner.state(), RunnerState::Crashed);
    }

    #[tokio::test]
    async fn test_out_of_table_request_does_not_touch_runnable() {
        let probe = Arc::new(Probe::default());
        let runner: Runner<()> = Runner::new(probe.clone());

        let err = runner.run(&()).await.unwrap_err();
        assert!(matches!(
            err,
            RunnerError::InvalidTransition(crate::fsm::InvalidTransition {
                state: RunnerState::Created,
                event: RunnerEvent::Start,
            })
        ));
        assert!(runner.abort().await.is_err());
        assert!(runner.destroy().await.is_err());

        assert_eq!(probe.runs.load(Ordering::SeqCst), 0);
        assert_eq!(probe.aborts.load(Ordering::SeqCst), 0);
        assert_eq!(probe.destroys.load(Ordering::SeqCst), 0);
        assert_eq!(runner.state(), RunnerState::Created);
    }

    #[tokio::test]
    async fn test_completed_run_returns_result() {
        let r: RunnableFn<_, u32, u32> =
            RunnableFn::new(|_ctx: CancellationToken, n: u32| async move { Ok(n + 1) });
        let runner: Runner<u32, u32> = Runner::new(Arc::new(r));
        runner.init().await.unwrap();

        assert_eq!(runner.run(&1).await.unwrap(), 2);
        assert_eq!(runner.state(), RunnerState::Completed);

        assert_eq!(runner.run(&2).await.unwrap(), 3);
        assert_eq!(runner.state(), RunnerState::Completed);
    }

    #[tokio::test]
    async fn test_failed_run_moves_to_error_and_is_restartable() {
        let r: RunnableFn<_, ()> = RunnableFn::new(|_ctx: CancellationToken, _: ()| async move {
            Err::<(), _>(RunnableError::fail("boom"))
        });
        let runner: Runner<()> = Runner::new(Arc::new(r));
        runner.init().await.unwrap();

        let err = runner.run(&()).await.unwrap_err();
        assert!(matches!(err, RunnerError::Run(RunnableError::Fail { .. })));
        assert_eq!(runner.state(), RunnerState::Error);

        let _ = runner.run(&()).await;
        assert_eq!(runner.state(), RunnerState::Error);
    }

    #[tokio::test]
    async fn test_running_reported_before_run_resolves() {
        let probe = Arc::new(Probe::default());
        let runner = Arc::new(Runner::<()>::new(probe.clone()));
        runner.init().await.unwrap();

        let handle = {
            let runner = runner.clone();
            tokio::spawn(async move { runner.run(&()).await })
        };
        wait_for_state(&runner, RunnerState::Running).await;
        assert!(!handle.is_finished());

        runner.abort().await.unwrap();
        assert_eq!(runner.state(), RunnerState::Stopped);
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_abort_waits_for_settlement() {
        let release = Arc::new(Notify::new());
        let unwound = Arc::new(AtomicUsize::new(0));
        let r: RunnableFn<_, ()> = {
            let release = release.clone();
            let unwound = unwound.clone();
            RunnableFn::new(move |ctx: CancellationToken, _: ()| {
                let release = release.clone();
                let unwound = unwound.clone();
                async move {
                    ctx.cancelled().await;
                    // Linger after cancellation until the test lets go.
                    release.notified().await;
                    unwound.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(RunnableError::Canceled)
                }
            })
        };
        let runner = Arc::new(Runner::<()>::new(Arc::new(r)));
        runner.init().await.unwrap();

        let run = {
            let runner = runner.clone();
            tokio::spawn(async move { runner.run(&()).await })
        };
        wait_for_state(&runner, RunnerState::Running).await;

        let abort = {
            let runner = runner.clone();
            tokio::spawn(async move { runner.abort().await })
        };
        wait_for_state(&runner, RunnerState::Stopping).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!abort.is_finished());
        assert_eq!(unwound.load(Ordering::SeqCst), 0);

        release.notify_one();
        abort.await.unwrap().unwrap();
        assert_eq!(unwound.load(Ordering::SeqCst), 1);
        assert_eq!(runner.state(), RunnerState::Stopped);
        assert!(run.await.unwrap().is_err());
    }

    #[tokio::test]
    async fn test_abort_error_surfaces_after_stop() {
        let probe = Arc::new(Probe {
            fail_abort: true,
            ..Probe::default()
        });
        let runner = Arc::new(Runner::<()>::new(probe.clone()));
        runner.init().await.unwrap();

        let run = {
            let runner = runner.clone();
            tokio::spawn(async move { runner.run(&()).await })
        };
        wait_for_state(&runner, RunnerState::Running).await;

        let err = runner.abort().await.unwrap_err();
        assert!(matches!(err, RunnerError::Abort(_)));
        assert_eq!(runner.state(), RunnerState::Stopped);
        run.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_aborts_each_forward() {
        let probe = Arc::new(Probe::default());
        let runner = Arc::new(Runner::<()>::new(probe.clone()));
        runner.init().await.unwrap();

        let run = {
            let runner = runner.clone();
            tokio::spawn(async move { runner.run(&()).await })
        };
        wait_for_state(&runner, RunnerState::Running).await;

        let (a, b) = tokio::join!(runner.abort(), runner.abort());
        a.unwrap();
        b.unwrap();
        assert_eq!(probe.aborts.load(Ordering::SeqCst), 2);
        assert_eq!(runner.state(), RunnerState::Stopped);
        run.await.unwrap().unwrap();

        runner.destroy().await.unwrap();
        assert_eq!(runner.state(), RunnerState::Destroyed);
    }
}
