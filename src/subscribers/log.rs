//! # LogWriter: pool events as `tracing` records
//!
//! Renders each [`Event`] as one `tracing` record under the `runvisor` target.
//! Failures are `warn`, the rest `info`/`debug`. Install any `tracing` subscriber
//! (e.g. `tracing_subscriber::fmt`) to see the output.
//!
//! ## Example output
//! ```text
//! INFO runvisor: scale requested instances=0 target=4
//! INFO runvisor: runner added runner=2 instances=3
//! WARN runvisor: runner failed runner=2 retries=0 err="execution failed: boom"
//! INFO runvisor: backoff scheduled runner=2 delay_ms=1000 retries=0
//! INFO runvisor: terminated
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let reason = e.reason.as_deref().unwrap_or("");
        match e.kind {
            EventKind::ScaleRequested => {
                tracing::info!(target: "runvisor", instances = ?e.instances, target_count = ?e.target, "scale requested");
            }
            EventKind::Scaled => {
                tracing::info!(target: "runvisor", instances = ?e.instances, "scaled");
            }
            EventKind::TerminateRequested => {
                tracing::info!(target: "runvisor", instances = ?e.instances, "terminate requested");
            }
            EventKind::Terminated => {
                tracing::info!(target: "runvisor", "terminated");
            }
            EventKind::RunnerAdded => {
                tracing::info!(target: "runvisor", runner = ?e.runner, instances = ?e.instances, "runner added");
            }
            EventKind::RunnerRemoved => {
                tracing::info!(target: "runvisor", runner = ?e.runner, instances = ?e.instances, "runner removed");
            }
            EventKind::RunnerFailed => {
                tracing::warn!(target: "runvisor", runner = ?e.runner, retries = ?e.retries, err = reason, "runner failed");
            }
            EventKind::RunnerCompleted => {
                tracing::debug!(target: "runvisor", runner = ?e.runner, "runner completed");
            }
            EventKind::RunnerStopped => {
                tracing::debug!(target: "runvisor", runner = ?e.runner, "runner stopped");
            }
            EventKind::BackoffScheduled => {
                tracing::info!(target: "runvisor", runner = ?e.runner, delay_ms = ?e.delay_ms, retries = ?e.retries, "backoff scheduled");
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(target: "runvisor", info = reason, "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                tracing::error!(target: "runvisor", info = reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
