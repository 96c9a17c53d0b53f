//! # Table-driven finite state machine.
//!
//! Both the [`Runner`](crate::Runner) and the [`Orchestrator`](crate::Orchestrator)
//! drive their lifecycle through the same mechanism: a pure lookup
//! `(state, event) → next state` supplied by a [`Transitions`] table, wrapped in a
//! [`StateMachine`] that owns the current state.
//!
//! ## Rules
//! - A request outside the table fails with [`InvalidTransition`] and leaves the state untouched.
//! - Every accepted event (self-loops included) notifies watchers of the state feed.
//! - Reads are cheap and never block on pending transitions.
//!
//! ## Change feed
//! ```text
//! send(event) ──► Transitions::next(state, event)
//!                     ├─ Some(next) ──► state = next ──► watch::Sender notifies receivers
//!                     └─ None       ──► Err(InvalidTransition { state, event })
//! ```
//! Receivers obtained from [`StateMachine::subscribe`] observe transitions without polling.

use std::fmt;

use tokio::sync::watch;

/// Transition table of a state machine.
///
/// Implementors are zero-sized markers; the table itself is the [`Transitions::next`] function.
pub trait Transitions: Send + Sync + 'static {
    /// Machine states.
    type State: Copy + Eq + fmt::Debug + Send + Sync + 'static;
    /// Events that request transitions.
    type Event: Copy + Eq + fmt::Debug + Send + Sync + 'static;

    /// Returns the next state for `(state, event)`, or `None` if the edge does not exist.
    fn next(state: Self::State, event: Self::Event) -> Option<Self::State>;
}

/// Requested event is not defined for the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTransition<S, E> {
    /// State the machine was in.
    pub state: S,
    /// Rejected event.
    pub event: E,
}

impl<S: fmt::Debug, E: fmt::Debug> fmt::Display for InvalidTransition<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid transition: event {:?} is not allowed in state {:?}",
            self.event, self.state
        )
    }
}

impl<S: fmt::Debug, E: fmt::Debug> std::error::Error for InvalidTransition<S, E> {}

/// State holder driven by a [`Transitions`] table.
pub struct StateMachine<T: Transitions> {
    tx: watch::Sender<T::State>,
}

impl<T: Transitions> StateMachine<T> {
    /// Creates a machine in the given initial state.
    pub fn new(initial: T::State) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Returns the current state.
    #[inline]
    pub fn state(&self) -> T::State {
        *self.tx.borrow()
    }

    /// Returns `true` if the machine is currently in `state`.
    #[inline]
    pub fn matches(&self, state: T::State) -> bool {
        self.state() == state
    }

    /// Applies `event` and returns the new state.
    pub fn send(&self, event: T::Event) -> Result<T::State, InvalidTransition<T::State, T::Event>> {
        self.send_by(|_| event)
    }

    /// Chooses the event from the current state and applies it atomically.
    ///
    /// No other transition can interleave between reading the state and applying the event.
    pub fn send_by<F>(&self, pick: F) -> Result<T::State, InvalidTransition<T::State, T::Event>>
    where
        F: FnOnce(T::State) -> T::Event,
    {
        let mut outcome = None;
        self.tx.send_if_modified(|state| {
            let event = pick(*state);
            match T::next(*state, event) {
                Some(next) => {
                    *state = next;
                    outcome = Some(Ok(next));
                    true
                }
                None => {
                    outcome = Some(Err(InvalidTransition {
                        state: *state,
                        event,
                    }));
                    false
                }
            }
        });
        match outcome {
            Some(res) => res,
            None => unreachable!("send_if_modified always runs its closure"),
        }
    }

    /// Returns a receiver that is notified on every accepted event.
    pub fn subscribe(&self) -> watch::Receiver<T::State> {
        self.tx.subscribe()
    }
}

impl<T: Transitions> fmt::Debug for StateMachine<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Light {
        Off,
        On,
        Broken,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Switch {
        Flip,
        Smash,
    }

    struct LightTable;

    impl Transitions for LightTable {
        type State = Light;
        type Event = Switch;

        fn next(state: Light, event: Switch) -> Option<Light> {
            match (state, event) {
                (Light::Off, Switch::Flip) => Some(Light::On),
                (Light::On, Switch::Flip) => Some(Light::Off),
                (Light::Off | Light::On, Switch::Smash) => Some(Light::Broken),
                _ => None,
            }
        }
    }

    #[test]
    fn test_send_follows_table() {
        let fsm = StateMachine::<LightTable>::new(Light::Off);
        assert_eq!(fsm.send(Switch::Flip), Ok(Light::On));
        assert!(fsm.matches(Light::On));
        assert_eq!(fsm.send(Switch::Smash), Ok(Light::Broken));
    }

    #[test]
    fn test_rejected_event_keeps_state() {
        let fsm = StateMachine::<LightTable>::new(Light::Broken);
        let err = fsm.send(Switch::Flip).unwrap_err();
        assert_eq!(
            err,
            InvalidTransition {
                state: Light::Broken,
                event: Switch::Flip
            }
        );
        assert_eq!(fsm.state(), Light::Broken);
        assert!(err.to_string().contains("Flip"));
        assert!(err.to_string().contains("Broken"));
    }

    #[test]
    fn test_send_by_sees_current_state() {
        let fsm = StateMachine::<LightTable>::new(Light::On);
        let next = fsm.send_by(|s| {
            assert_eq!(s, Light::On);
            Switch::Flip
        });
        assert_eq!(next, Ok(Light::Off));
    }

    #[tokio::test]
    async fn test_subscribers_observe_transitions() {
        let fsm = StateMachine::<LightTable>::new(Light::Off);
        let mut rx = fsm.subscribe();
        fsm.send(Switch::Flip).unwrap();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), Light::On);

        let _ = fsm.send(Switch::Flip);
        let _ = fsm.send(Switch::Smash);
        let seen = *rx.wait_for(|s| *s == Light::Broken).await.unwrap();
        assert_eq!(seen, Light::Broken);
    }
}
