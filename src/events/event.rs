//! # Pool events emitted by the orchestrator and its supervision loops.
//!
//! The [`EventKind`] enum classifies events into:
//! - **Pool events**: scaling and termination of the whole pool
//! - **Runner events**: per-runner outcomes inside the supervision loop
//! - **Subscriber events**: delivery problems of user subscribers
//!
//! Two kinds carry the pool's public contract:
//! - [`EventKind::RunnerFailed`]: once per failing run, whether or not it is retried;
//! - [`EventKind::Terminated`]: exactly once, after `terminate()` drained the pool.
//!
//! ## Ordering
//! Each event gets a process-wide, monotonically increasing `seq`.
//!
//! ## Example
//! ```rust
//! use runvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::RunnerFailed)
//!     .with_runner(3)
//!     .with_reason("execution failed: boom")
//!     .with_retries(2);
//!
//! assert_eq!(ev.kind, EventKind::RunnerFailed);
//! assert_eq!(ev.runner, Some(3));
//! assert_eq!(ev.reason.as_deref(), Some("execution failed: boom"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::error::RunnableError;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of pool events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // === Pool events ===
    /// `scale()` accepted.
    ///
    /// Sets: `instances` (current), `target`.
    ScaleRequested,

    /// Pool reached its target and returned to `Running`.
    ///
    /// Sets: `instances`, `target`.
    Scaled,

    /// `terminate()` accepted; draining starts.
    ///
    /// Sets: `instances`.
    TerminateRequested,

    /// Pool drained and reached `Terminated`. Published exactly once.
    Terminated,

    // === Runner events ===
    /// A runner was created, initialized and its supervision loop started.
    ///
    /// Sets: `runner`, `instances`.
    RunnerAdded,

    /// A runner was stopped, destroyed and removed from the pool.
    ///
    /// Sets: `runner`, `instances`.
    RunnerRemoved,

    /// A run failed.
    ///
    /// Sets: `runner`, `error`, `reason` (error message), `retries` (depth before this failure).
    RunnerFailed,

    /// A run returned on its own; the runner restarts immediately.
    ///
    /// Sets: `runner`.
    RunnerCompleted,

    /// A run unwound after an abort; the supervision loop exits.
    ///
    /// Sets: `runner`.
    RunnerStopped,

    /// Restart of a failed runner delayed.
    ///
    /// Sets: `runner`, `delay_ms`, `retries` (depth used for the delay), `reason`.
    BackoffScheduled,

    // === Subscriber events ===
    /// Subscriber panicked while processing an event.
    ///
    /// Sets: `reason` (subscriber name and panic message).
    SubscriberPanicked,

    /// Subscriber queue dropped an event.
    ///
    /// Sets: `reason` (subscriber name and "full"/"closed").
    SubscriberOverflow,
}

/// Pool event with optional metadata.
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Pool-local runner id.
    pub runner: Option<u64>,
    /// Human-readable reason (error messages, subscriber details).
    pub reason: Option<Arc<str>>,
    /// Error returned by the runnable.
    pub error: Option<RunnableError>,
    /// Backoff delay in milliseconds.
    pub delay_ms: Option<u32>,
    /// Pool-wide retry depth.
    pub retries: Option<u32>,
    /// Live runner count.
    pub instances: Option<usize>,
    /// Target runner count.
    pub target: Option<usize>,
}

impl Event {
    /// Creates an event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            runner: None,
            reason: None,
            error: None,
            delay_ms: None,
            retries: None,
            instances: None,
            target: None,
        }
    }

    #[inline]
    pub fn with_runner(mut self, id: u64) -> Self {
        self.runner = Some(id);
        self
    }

    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches the runnable's error; `reason` is set to its message.
    #[inline]
    pub fn with_error(mut self, err: RunnableError) -> Self {
        self.reason = Some(err.to_string().into());
        self.error = Some(err);
        self
    }

    /// Attaches a backoff delay (stored as milliseconds, saturating).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(d.as_millis().min(u128::from(u32::MAX)) as u32);
        self
    }

    #[inline]
    pub fn with_retries(mut self, n: u32) -> Self {
        self.retries = Some(n);
        self
    }

    #[inline]
    pub fn with_instances(mut self, n: usize) -> Self {
        self.instances = Some(n);
        self
    }

    #[inline]
    pub fn with_target(mut self, n: usize) -> Self {
        self.target = Some(n);
        self
    }

    /// Returns the backoff delay, if set.
    pub fn delay(&self) -> Option<Duration> {
        self.delay_ms.map(|ms| Duration::from_millis(u64::from(ms)))
    }

    /// Creates a subscriber overflow event.
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_reason(format!("subscriber={subscriber} panic={info}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::new(EventKind::Scaled);
        let b = Event::new(EventKind::Scaled);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_error_sets_reason() {
        let ev = Event::new(EventKind::RunnerFailed).with_error(RunnableError::fatal("disk gone"));
        assert!(matches!(ev.error, Some(RunnableError::Fatal { .. })));
        assert_eq!(ev.reason.as_deref(), Some("fatal error: disk gone"));
    }

    #[test]
    fn test_delay_saturates() {
        let ev = Event::new(EventKind::BackoffScheduled).with_delay(Duration::from_secs(u64::MAX));
        assert_eq!(ev.delay_ms, Some(u32::MAX));
        let ev = Event::new(EventKind::BackoffScheduled).with_delay(Duration::from_secs(2));
        assert_eq!(ev.delay(), Some(Duration::from_secs(2)));
    }
}
