//! # Supervision loop: keeps one runner running until it is retired.
//!
//! Each runner in the pool gets one loop task. The loop restarts the runner after
//! every run and reads the runner's resting state to decide what happens next.
//!
//! ```text
//! loop {
//!   ├─► retire token cancelled? → exit
//!   ├─► runner.run(&params)
//!   │     └─ Err(run failed) → publish RunnerFailed
//!   ├─► match runner.state()
//!   │     ├─ Stopped   → relax retries, publish RunnerStopped, exit
//!   │     ├─ Completed → relax retries, publish RunnerCompleted, yield
//!   │     ├─ Error     → delay = backoff(retries++), publish BackoffScheduled,
//!   │     │              sleep (cancelled by retire → exit)
//!   │     └─ other     → exit
//!   └─► yield
//! }
//! ```
//!
//! ## Rules
//! - The retry counter is shared by the whole pool: failures anywhere deepen the delay
//!   for everyone, stops and completions relax it (saturating at zero).
//! - `RunnerFailed` is published for every failing run, retried or not.
//! - A run rejected at start (runner already torn down) ends the loop silently.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use tokio::{select, time};
use tokio_util::sync::CancellationToken;

use crate::error::RunnerError;
use crate::events::{Bus, Event, EventKind};
use crate::policies::BackoffPolicy;
use crate::runner::{Runner, RunnerState};

/// Pool state shared by the orchestrator and every supervision loop.
pub(crate) struct Shared<P> {
    /// Parameters passed to every run.
    pub params: P,
    /// Event bus.
    pub bus: Bus,
    /// Restart delay policy.
    pub backoff: BackoffPolicy,
    retries: AtomicU32,
}

impl<P> Shared<P> {
    pub fn new(params: P, bus: Bus, backoff: BackoffPolicy) -> Self {
        Self {
            params,
            bus,
            backoff,
            retries: AtomicU32::new(0),
        }
    }

    /// Current pool-wide retry depth.
    pub fn retries(&self) -> u32 {
        self.retries.load(Ordering::SeqCst)
    }

    /// Increments the depth and returns the value before the increment.
    fn deepen(&self) -> u32 {
        self.retries
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| Some(n.saturating_add(1)))
            .unwrap_or_else(|n| n)
    }

    /// Decrements the depth, saturating at zero.
    fn relax(&self) {
        let _ = self
            .retries
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }
}

/// Runs the supervision loop of runner `id` until it is retired or stopped.
pub(crate) async fn supervise<P, R>(
    shared: Arc<Shared<P>>,
    id: u64,
    runner: Arc<Runner<P, R>>,
    retire: CancellationToken,
) where
    P: Send + Sync + 'static,
    R: Send + 'static,
{
    loop {
        if retire.is_cancelled() {
            break;
        }

        match runner.run(&shared.params).await {
            Ok(_) => {}
            Err(RunnerError::InvalidTransition(e)) => {
                tracing::debug!(runner = id, state = ?e.state, "runner torn down before restart");
                break;
            }
            Err(e) => {
                let ev = Event::new(EventKind::RunnerFailed).with_runner(id);
                let ev = match e.runnable_error() {
                    Some(err) => ev.with_error(err.clone()),
                    None => ev.with_reason(e.to_string()),
                };
                shared.bus.publish(ev.with_retries(shared.retries()));
            }
        }

        match runner.state() {
            RunnerState::Stopped => {
                shared.relax();
                shared
                    .bus
                    .publish(Event::new(EventKind::RunnerStopped).with_runner(id));
                break;
            }
            RunnerState::Completed => {
                shared.relax();
                shared
                    .bus
                    .publish(Event::new(EventKind::RunnerCompleted).with_runner(id));
                tokio::task::yield_now().await;
            }
            RunnerState::Error => {
                let depth = shared.deepen();
                let delay = shared.backoff.next(depth);
                shared.bus.publish(
                    Event::new(EventKind::BackoffScheduled)
                        .with_runner(id)
                        .with_delay(delay)
                        .with_retries(depth),
                );

                let sleep = time::sleep(delay);
                tokio::pin!(sleep);
                select! {
                    _ = &mut sleep => {}
                    _ = retire.cancelled() => { break; }
                }
            }
            _ => break,
        }
        tokio::task::yield_now().await;
    }
}
