//! # Pool-level states and transition table.
//!
//! ```text
//! Running     : scale → Scaling, terminate → Terminating
//! Scaling     : scaled → Running, terminate → Terminating
//! Terminating : terminated → Terminated
//! Terminated  : (terminal)
//! ```
//!
//! There is no `scale` edge out of `Scaling`: a second `scale()` while one is in
//! flight is rejected, not queued.

use std::fmt;

use crate::fsm::Transitions;

/// Lifecycle state of an [`Orchestrator`](crate::Orchestrator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrchestratorState {
    /// Idle at its current size; runners are supervised.
    Running,
    /// A `scale()` call is moving the pool toward its target.
    Scaling,
    /// `terminate()` is draining the pool.
    Terminating,
    /// Drained. Terminal.
    Terminated,
}

impl OrchestratorState {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            OrchestratorState::Running => "running",
            OrchestratorState::Scaling => "scaling",
            OrchestratorState::Terminating => "terminating",
            OrchestratorState::Terminated => "terminated",
        }
    }
}

impl fmt::Display for OrchestratorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Events accepted by the pool state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrchestratorEvent {
    Scale,
    Scaled,
    Terminate,
    Terminated,
}

/// Pool transition table.
pub struct OrchestratorTransitions;

impl Transitions for OrchestratorTransitions {
    type State = OrchestratorState;
    type Event = OrchestratorEvent;

    fn next(state: OrchestratorState, event: OrchestratorEvent) -> Option<OrchestratorState> {
        use OrchestratorEvent as E;
        use OrchestratorState as S;

        match (state, event) {
            (S::Running, E::Scale) => Some(S::Scaling),
            (S::Running | S::Scaling, E::Terminate) => Some(S::Terminating),
            (S::Scaling, E::Scaled) => Some(S::Running),
            (S::Terminating, E::Terminated) => Some(S::Terminated),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_is_not_reentrant() {
        assert_eq!(
            OrchestratorTransitions::next(OrchestratorState::Scaling, OrchestratorEvent::Scale),
            None
        );
    }

    #[test]
    fn test_terminate_only_once() {
        use OrchestratorState as S;
        assert_eq!(
            OrchestratorTransitions::next(S::Terminating, OrchestratorEvent::Terminate),
            None
        );
        assert_eq!(
            OrchestratorTransitions::next(S::Terminated, OrchestratorEvent::Terminate),
            None
        );
        assert_eq!(
            OrchestratorTransitions::next(S::Scaling, OrchestratorEvent::Terminate),
            Some(S::Terminating)
        );
    }
}
