//! # One-shot settlement of an in-flight run.
//!
//! A [`Settlement`] is created fresh for every `Runner::run` call and resolved exactly
//! once by the run's completion path. Any number of waiters (concurrent `abort()` calls)
//! can await it; late waiters see the stored outcome immediately.

use tokio::sync::watch;

use crate::error::RunnableError;

/// Final outcome recorded by a settlement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Run returned a value.
    Fulfilled,
    /// Run failed with this error.
    Failed(RunnableError),
}

/// Cloneable one-shot completion signal.
#[derive(Clone, Debug)]
pub struct Settlement {
    tx: watch::Sender<Option<Outcome>>,
}

impl Settlement {
    /// Creates an unresolved settlement.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Marks the run as fulfilled. No-op if already settled.
    pub fn fulfill(&self) {
        self.settle(Outcome::Fulfilled);
    }

    /// Marks the run as failed. No-op if already settled.
    pub fn fail(&self, err: &RunnableError) {
        self.settle(Outcome::Failed(err.clone()));
    }

    fn settle(&self, outcome: Outcome) {
        self.tx.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = Some(outcome);
            true
        });
    }

    /// Returns the outcome if the run already settled.
    pub fn outcome(&self) -> Option<Outcome> {
        self.tx.borrow().clone()
    }

    /// Waits until the run settles and returns its outcome.
    pub async fn settled(&self) -> Outcome {
        let mut rx = self.tx.subscribe();
        let outcome = match rx.wait_for(Option::is_some).await {
            Ok(outcome) => outcome.clone().unwrap_or(Outcome::Fulfilled),
            // Sender is owned by `self`, so the channel cannot close while we wait.
            Err(_) => Outcome::Fulfilled,
        };
        outcome
    }
}

impl Default for Settlement {
    fn default() -> Self {
        Self::new()
    }
}
