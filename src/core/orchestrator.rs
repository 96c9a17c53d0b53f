//! # Orchestrator: keeps a pool of runners at a target size.
//!
//! The [`Orchestrator`] owns a set of [`Runner`]s created from one
//! [`RunnableFactory`], a pool-level state machine and the event bus.
//! Every runner is kept alive by its own supervision loop; `scale()` grows or
//! shrinks the set and `terminate()` drains it.
//!
//! ## Architecture
//! ```text
//! scale(target) ──► resolve target (count or spec string against M)
//!               ──► send(scale) → Scaling, publish ScaleRequested
//!               ──► while Scaling && live ≠ target:
//!                      live < target → scale_up:   factory.create() → Runner::init()
//!                                                  → add slot → spawn supervision loop
//!                      live > target → scale_down: slot.retire() → remove slot
//!               ──► send(scaled) → Running, publish Scaled
//!
//! terminate()   ──► send(terminate) → Terminating, publish TerminateRequested
//!               ──► retire every slot
//!               ──► send(terminated) → Terminated, publish Terminated (once)
//!
//! supervision loop N ── publish(Event) ──► Bus ──► subscriber listener ──► SubscriberSet
//! ```
//!
//! ## Rules
//! - `scale()` is not reentrant: a second call while `Scaling` fails with
//!   [`OrchestratorError::InvalidTransition`].
//! - `terminate()` may interrupt a scale in progress; the pending `scale()` then returns
//!   without completing its target.
//! - Run failures never surface from `scale()`/`terminate()`. Only structural failures
//!   do: invalid targets, factory errors, init errors and teardown errors.
//! - After a structural failure the pool stays `Scaling`; only `terminate()` is accepted.
//! - `Terminated` is published exactly once, after every runner is destroyed.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use runvisor::{Orchestrator, OrchestratorState, RunnableError, RunnableFn, RunnableRef};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let factory = || async {
//!         let worker: RunnableRef<Duration> =
//!             RunnableFn::arc(|ctx: CancellationToken, tick: Duration| async move {
//!                 tokio::select! {
//!                     _ = ctx.cancelled() => {}
//!                     _ = tokio::time::sleep(tick) => {}
//!                 }
//!                 Ok(())
//!             });
//!         Ok::<_, RunnableError>(worker)
//!     };
//!
//!     let pool = Orchestrator::builder(factory, Duration::from_millis(10)).build();
//!     pool.scale(2).await?;
//!     assert_eq!(pool.instances(), 2);
//!
//!     pool.terminate().await?;
//!     assert_eq!(pool.state(), OrchestratorState::Terminated);
//!     Ok(())
//! }
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::{
    sync::{broadcast, watch},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

use crate::concurrency::Concurrency;
use crate::core::{
    builder::OrchestratorBuilder,
    slot::Slot,
    state::{OrchestratorEvent, OrchestratorState, OrchestratorTransitions},
    supervise::Shared,
};
use crate::error::{OrchestratorError, RunnerError};
use crate::events::{Event, EventKind};
use crate::fsm::StateMachine;
use crate::runnables::RunnableFactory;
use crate::runner::{Runner, RunnerState};
use crate::subscribers::SubscriberSet;

/// Self-healing pool of runners built from one factory.
pub struct Orchestrator<P, R = ()>
where
    P: Send + Sync + 'static,
    R: Send + 'static,
{
    fsm: StateMachine<OrchestratorTransitions>,
    factory: Arc<dyn RunnableFactory<P, R>>,
    shared: Arc<Shared<P>>,
    slots: Mutex<Vec<Arc<Slot<P, R>>>>,
    next_id: AtomicU64,
    parallelism: usize,
    /// Parent of every retire token; cancelled on drop.
    runtime_token: CancellationToken,
    subs: Arc<SubscriberSet>,
    listener: Option<JoinHandle<()>>,
}

impl<P, R> Orchestrator<P, R>
where
    P: Send + Sync + 'static,
    R: Send + 'static,
{
    /// Starts building an orchestrator that passes `params` to every run.
    pub fn builder<F>(factory: F, params: P) -> OrchestratorBuilder<P, R>
    where
        F: RunnableFactory<P, R>,
    {
        OrchestratorBuilder::new(factory, params)
    }

    pub(super) fn new_internal(
        factory: Arc<dyn RunnableFactory<P, R>>,
        shared: Arc<Shared<P>>,
        parallelism: usize,
        subs: Arc<SubscriberSet>,
    ) -> Self {
        let listener = (!subs.is_empty()).then(|| subscriber_listener(&shared, &subs));
        Self {
            fsm: StateMachine::new(OrchestratorState::Running),
            factory,
            shared,
            slots: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            parallelism,
            runtime_token: CancellationToken::new(),
            subs,
            listener,
        }
    }

    /// Returns the pool state.
    #[inline]
    pub fn state(&self) -> OrchestratorState {
        self.fsm.state()
    }

    /// Returns a receiver notified on every pool state transition.
    pub fn watch_state(&self) -> watch::Receiver<OrchestratorState> {
        self.fsm.subscribe()
    }

    /// Number of runners currently in the pool.
    pub fn instances(&self) -> usize {
        self.lock_slots().len()
    }

    /// Snapshot of `(runner id, state)` for every runner in the pool.
    pub fn runner_states(&self) -> Vec<(u64, RunnerState)> {
        self.lock_slots()
            .iter()
            .map(|slot| (slot.id, slot.runner.state()))
            .collect()
    }

    /// Pool-wide retry depth used for the next backoff delay.
    pub fn retries(&self) -> u32 {
        self.shared.retries()
    }

    /// `M` used to resolve concurrency specs.
    pub fn parallelism(&self) -> usize {
        self.parallelism
    }

    /// Number of registered subscribers.
    pub fn subscribers(&self) -> usize {
        self.subs.len()
    }

    /// Creates a receiver for pool events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.shared.bus.subscribe()
    }

    /// Waits until the pool reaches `Terminated`.
    pub async fn wait_terminated(&self) {
        let mut rx = self.fsm.subscribe();
        let _ = rx
            .wait_for(|s| *s == OrchestratorState::Terminated)
            .await;
    }

    /// Grows or shrinks the pool to `target` runners.
    ///
    /// `target` is an exact count or a spec string (see [`Concurrency`]).
    /// Returns once the pool holds exactly `target` runners, each initialized and
    /// supervised, or once a concurrent `terminate()` took over.
    pub async fn scale(&self, target: impl Into<Concurrency>) -> Result<(), OrchestratorError> {
        let requested = target.into();
        let target = requested.resolve(self.parallelism).ok_or_else(|| {
            OrchestratorError::InvalidConcurrency {
                spec: requested.to_string(),
            }
        })?;

        self.fsm.send(OrchestratorEvent::Scale)?;
        self.publish(
            Event::new(EventKind::ScaleRequested)
                .with_instances(self.instances())
                .with_target(target),
        );

        while self.fsm.matches(OrchestratorState::Scaling) {
            let live = self.instances();
            if live < target {
                self.scale_up().await?;
            } else if live > target {
                self.scale_down().await?;
            } else {
                break;
            }
            tokio::task::yield_now().await;
        }

        if self.fsm.send(OrchestratorEvent::Scaled).is_ok() {
            self.publish(
                Event::new(EventKind::Scaled)
                    .with_instances(self.instances())
                    .with_target(target),
            );
        }
        Ok(())
    }

    /// Stops and destroys every runner, then moves the pool to `Terminated`.
    ///
    /// Fails with [`OrchestratorError::InvalidTransition`] if already terminating or terminated.
    pub async fn terminate(&self) -> Result<(), OrchestratorError> {
        self.fsm.send(OrchestratorEvent::Terminate)?;
        self.publish(Event::new(EventKind::TerminateRequested).with_instances(self.instances()));

        while let Some(slot) = self.first_slot() {
            self.retire(&slot).await?;
        }

        self.fsm.send(OrchestratorEvent::Terminated)?;
        self.publish(Event::new(EventKind::Terminated));
        Ok(())
    }

    async fn scale_up(&self) -> Result<(), OrchestratorError> {
        let runnable = self
            .factory
            .create()
            .await
            .map_err(OrchestratorError::Factory)?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let slot = Arc::new(Slot::new(
            id,
            Runner::arc(Arc::clone(&runnable)),
            self.runtime_token.child_token(),
        ));

        // Admission is decided under the slot lock: terminate() either drains this slot
        // or the instance is discarded here.
        let admitted = {
            let mut slots = self.lock_slots();
            let scaling = self.fsm.matches(OrchestratorState::Scaling);
            if scaling {
                slots.push(Arc::clone(&slot));
            }
            scaling
        };
        if !admitted {
            runnable
                .destroy()
                .await
                .map_err(|e| OrchestratorError::Runner(RunnerError::Destroy(e)))?;
            return Ok(());
        }

        if let Err(e) = slot.runner.init().await {
            self.lock_slots().retain(|s| s.id != id);
            tracing::debug!(runner = id, error = %e, "runner init failed");
            return Err(e.into());
        }

        if slot.start(Arc::clone(&self.shared)) {
            self.publish(
                Event::new(EventKind::RunnerAdded)
                    .with_runner(id)
                    .with_instances(self.instances()),
            );
        }
        Ok(())
    }

    async fn scale_down(&self) -> Result<(), OrchestratorError> {
        match self.first_slot() {
            Some(slot) => self.retire(&slot).await,
            None => Ok(()),
        }
    }

    /// Runs the stop sequence of `slot` and removes it from the pool.
    async fn retire(&self, slot: &Arc<Slot<P, R>>) -> Result<(), OrchestratorError> {
        let res = slot.retire().await;

        let removed = {
            let mut slots = self.lock_slots();
            let before = slots.len();
            slots.retain(|s| s.id != slot.id);
            (slots.len() != before).then_some(slots.len())
        };
        if let Some(instances) = removed {
            self.publish(
                Event::new(EventKind::RunnerRemoved)
                    .with_runner(slot.id)
                    .with_instances(instances),
            );
        }
        res.map_err(OrchestratorError::from)
    }

    fn first_slot(&self) -> Option<Arc<Slot<P, R>>> {
        self.lock_slots().first().cloned()
    }

    fn publish(&self, ev: Event) {
        self.shared.bus.publish(ev);
    }

    fn lock_slots(&self) -> MutexGuard<'_, Vec<Arc<Slot<P, R>>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<P, R> Drop for Orchestrator<P, R>
where
    P: Send + Sync + 'static,
    R: Send + 'static,
{
    /// Stops restarts of all runners at their next safe point. In-flight runs are
    /// not aborted; call [`Orchestrator::terminate`] for an orderly drain.
    fn drop(&mut self) {
        self.runtime_token.cancel();
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
    }
}

/// Subscribes to the bus and forwards events to the subscriber set (fire-and-forget).
fn subscriber_listener<P>(shared: &Shared<P>, subs: &Arc<SubscriberSet>) -> JoinHandle<()> {
    let mut rx = shared.bus.subscribe();
    let set = Arc::clone(subs);
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(ev) => set.emit(Arc::new(ev)),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "subscriber listener lagged behind the bus");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
