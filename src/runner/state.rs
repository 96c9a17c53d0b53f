//! # Runner lifecycle states and transition table.
//!
//! ```text
//! Created      : init → Initializing
//! Initializing : inited → Ready, crash → Crashed
//! Crashed      : init → Initializing
//! Ready        : start → Starting, destroy → Destroyed
//! Starting     : started → Running, error → Error
//! Running      : stop → Stopping, complete → Completed, error → Error
//! Stopping     : stopped → Stopped, stop → Stopping
//! Stopped      : destroy → Destroyed, start → Starting
//! Completed    : destroy → Destroyed, start → Starting
//! Error        : destroy → Destroyed, start → Starting
//! Destroyed    : (terminal)
//! ```
//!
//! `Stopped`, `Completed` and `Error` all accept `start` (restart) and `destroy`.

use std::fmt;

use crate::fsm::Transitions;

/// Lifecycle state of a [`Runner`](crate::Runner).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunnerState {
    /// Freshly constructed, runnable not initialized yet.
    Created,
    /// `init` in progress.
    Initializing,
    /// Initialized and idle.
    Ready,
    /// `run` requested, call not issued yet.
    Starting,
    /// `run` in flight.
    Running,
    /// Abort requested, waiting for the in-flight run to unwind.
    Stopping,
    /// Run unwound after an abort.
    Stopped,
    /// Run returned on its own.
    Completed,
    /// Run failed on its own.
    Error,
    /// `init` failed; may be re-initialized.
    Crashed,
    /// Runnable released. Terminal.
    Destroyed,
}

impl RunnerState {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RunnerState::Created => "created",
            RunnerState::Initializing => "initializing",
            RunnerState::Ready => "ready",
            RunnerState::Starting => "starting",
            RunnerState::Running => "running",
            RunnerState::Stopping => "stopping",
            RunnerState::Stopped => "stopped",
            RunnerState::Completed => "completed",
            RunnerState::Error => "error",
            RunnerState::Crashed => "crashed",
            RunnerState::Destroyed => "destroyed",
        }
    }

    /// Returns `true` for states from which the runner can be destroyed right away.
    #[inline]
    pub fn is_idle(&self) -> bool {
        matches!(
            self,
            RunnerState::Ready | RunnerState::Stopped | RunnerState::Completed | RunnerState::Error
        )
    }
}

impl fmt::Display for RunnerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Events accepted by the runner state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunnerEvent {
    Init,
    Inited,
    Crash,
    Start,
    Started,
    Stop,
    Stopped,
    Complete,
    Error,
    Destroy,
}

/// Runner transition table.
pub struct RunnerTransitions;

impl Transitions for RunnerTransitions {
    type State = RunnerState;
    type Event = RunnerEvent;

    fn next(state: RunnerState, event: RunnerEvent) -> Option<RunnerState> {
        use RunnerEvent as E;
        use RunnerState as S;

        let next = match (state, event) {
            (S::Created, E::Init) => S::Initializing,

            (S::Initializing, E::Inited) => S::Ready,
            (S::Initializing, E::Crash) => S::Crashed,

            (S::Crashed, E::Init) => S::Initializing,

            (S::Ready, E::Start) => S::Starting,
            (S::Ready, E::Destroy) => S::Destroyed,

            (S::Starting, E::Started) => S::Running,
            (S::Starting, E::Error) => S::Error,

            (S::Running, E::Stop) => S::Stopping,
            (S::Running, E::Complete) => S::Completed,
            (S::Running, E::Error) => S::Error,

            (S::Stopping, E::Stopped) => S::Stopped,
            (S::Stopping, E::Stop) => S::Stopping,

            (S::Stopped | S::Completed | S::Error, E::Destroy) => S::Destroyed,
            (S::Stopped | S::Completed | S::Error, E::Start) => S::Starting,

            _ => return None,
        };
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATES: [RunnerState; 11] = [
        RunnerState::Created,
        RunnerState::Initializing,
        RunnerState::Ready,
        RunnerState::Starting,
        RunnerState::Running,
        RunnerState::Stopping,
        RunnerState::Stopped,
        RunnerState::Completed,
        RunnerState::Error,
        RunnerState::Crashed,
        RunnerState::Destroyed,
    ];

    const EVENTS: [RunnerEvent; 10] = [
        RunnerEvent::Init,
        RunnerEvent::Inited,
        RunnerEvent::Crash,
        RunnerEvent::Start,
        RunnerEvent::Started,
        RunnerEvent::Stop,
        RunnerEvent::Stopped,
        RunnerEvent::Complete,
        RunnerEvent::Error,
        RunnerEvent::Destroy,
    ];

    #[test]
    fn test_destroyed_is_terminal() {
        for event in EVENTS {
            assert_eq!(RunnerTransitions::next(RunnerState::Destroyed, event), None);
        }
    }

    #[test]
    fn test_edge_count_matches_table() {
        let edges = STATES
            .iter()
            .flat_map(|s| EVENTS.iter().map(move |e| (*s, *e)))
            .filter(|(s, e)| RunnerTransitions::next(*s, *e).is_some())
            .count();
        assert_eq!(edges, 19);
    }

    #[test]
    fn test_restartable_states() {
        for state in [RunnerState::Stopped, RunnerState::Completed, RunnerState::Error] {
            assert_eq!(
                RunnerTransitions::next(state, RunnerEvent::Start),
                Some(RunnerState::Starting)
            );
            assert_eq!(
                RunnerTransitions::next(state, RunnerEvent::Destroy),
                Some(RunnerState::Destroyed)
            );
            assert!(state.is_idle());
        }
    }

    #[test]
    fn test_stop_is_idempotent_while_stopping() {
        assert_eq!(
            RunnerTransitions::next(RunnerState::Stopping, RunnerEvent::Stop),
            Some(RunnerState::Stopping)
        );
        assert_eq!(RunnerTransitions::next(RunnerState::Starting, RunnerEvent::Stop), None);
    }

    #[test]
    fn test_crashed_can_only_reinit() {
        for event in EVENTS {
            let expected = (event == RunnerEvent::Init).then_some(RunnerState::Initializing);
            assert_eq!(RunnerTransitions::next(RunnerState::Crashed, event), expected);
        }
    }
}
