//! Error types used by runnables, runners and the orchestrator.
//!
//! This module defines three error enums:
//!
//! - [`RunnableError`]: errors raised by user code inside a [`Runnable`](crate::Runnable).
//! - [`RunnerError`]: errors raised by a [`Runner`](crate::Runner) lifecycle operation.
//! - [`OrchestratorError`]: structural failures of pool management (bad factory,
//!   bad init, bad teardown, invalid concurrent use).
//!
//! Each type provides `as_label` for logs/metrics.

use thiserror::Error;

use crate::core::{OrchestratorEvent, OrchestratorState};
use crate::fsm::InvalidTransition;
use crate::runner::{RunnerEvent, RunnerState};

/// # Errors produced by runnable execution.
///
/// Cloneable: a single failure is surfaced from `run()`, recorded in the run's
/// settlement and reported on the event bus.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RunnableError {
    /// Execution failed; the supervision loop retries it with backoff.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Non-recoverable error reported by user code.
    ///
    /// The supervision loop still applies its retry policy; the variant exists so
    /// adapters can distinguish setup failures (`init`, factory) in their own logs.
    #[error("fatal error: {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },

    /// Runnable observed its cancellation token and unwound.
    #[error("context cancelled")]
    Canceled,
}

impl RunnableError {
    /// Shorthand for [`RunnableError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        RunnableError::Fail {
            error: error.into(),
        }
    }

    /// Shorthand for [`RunnableError::Fatal`].
    pub fn fatal(error: impl Into<String>) -> Self {
        RunnableError::Fatal {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use runvisor::RunnableError;
    ///
    /// assert_eq!(RunnableError::fail("boom").as_label(), "runnable_failed");
    /// assert_eq!(RunnableError::Canceled.as_label(), "runnable_canceled");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RunnableError::Fail { .. } => "runnable_failed",
            RunnableError::Fatal { .. } => "runnable_fatal",
            RunnableError::Canceled => "runnable_canceled",
        }
    }
}

/// # Errors produced by [`Runner`](crate::Runner) operations.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum RunnerError {
    /// Operation requested an event the current state does not accept.
    ///
    /// Raised before the underlying runnable is touched.
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition<RunnerState, RunnerEvent>),

    /// `Runnable::init` failed; the runner is now `Crashed`.
    #[error("init failed: {0}")]
    Init(#[source] RunnableError),

    /// `Runnable::run` failed.
    #[error("run failed: {0}")]
    Run(#[source] RunnableError),

    /// `Runnable::abort` failed; the run still settled.
    #[error("abort failed: {0}")]
    Abort(#[source] RunnableError),

    /// `Runnable::destroy` failed; the runner is `Destroyed` regardless.
    #[error("destroy failed: {0}")]
    Destroy(#[source] RunnableError),
}

impl RunnerError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RunnerError::InvalidTransition(_) => "runner_invalid_transition",
            RunnerError::Init(_) => "runner_init_failed",
            RunnerError::Run(_) => "runner_run_failed",
            RunnerError::Abort(_) => "runner_abort_failed",
            RunnerError::Destroy(_) => "runner_destroy_failed",
        }
    }

    /// Returns the user error behind this failure, if any.
    pub fn runnable_error(&self) -> Option<&RunnableError> {
        match self {
            RunnerError::InvalidTransition(_) => None,
            RunnerError::Init(e)
            | RunnerError::Run(e)
            | RunnerError::Abort(e)
            | RunnerError::Destroy(e) => Some(e),
        }
    }
}

/// # Errors produced by the [`Orchestrator`](crate::Orchestrator).
///
/// Ordinary work failures never show up here; they are reported as
/// [`EventKind::RunnerFailed`](crate::EventKind::RunnerFailed) events.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum OrchestratorError {
    /// Pool-level event rejected (e.g. `scale` while already scaling, `terminate` twice).
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition<OrchestratorState, OrchestratorEvent>),

    /// Concurrency string does not match the grammar.
    #[error("invalid concurrency spec {spec:?}")]
    InvalidConcurrency {
        /// The rejected input.
        spec: String,
    },

    /// Runnable factory failed to produce an instance.
    #[error("runnable factory failed: {0}")]
    Factory(#[source] RunnableError),

    /// Runner setup or teardown failed.
    #[error(transparent)]
    Runner(#[from] RunnerError),
}

impl OrchestratorError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use runvisor::OrchestratorError;
    ///
    /// let err = OrchestratorError::InvalidConcurrency { spec: "-100%".into() };
    /// assert_eq!(err.as_label(), "orchestrator_invalid_concurrency");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            OrchestratorError::InvalidTransition(_) => "orchestrator_invalid_transition",
            OrchestratorError::InvalidConcurrency { .. } => "orchestrator_invalid_concurrency",
            OrchestratorError::Factory(_) => "orchestrator_factory_failed",
            OrchestratorError::Runner(e) => e.as_label(),
        }
    }
}
