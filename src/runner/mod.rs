//! # Runner: one runnable, one lifecycle.
//!
//! - [`RunnerState`], [`RunnerEvent`] and [`RunnerTransitions`]: the fixed transition table
//! - [`Settlement`]: one-shot signal joined by `abort()`
//! - [`Runner`]: the state-machine wrapper itself

#[allow(clippy::module_inception)]
mod runner;
mod settlement;
mod state;

pub use runner::Runner;
pub use settlement::{Outcome, Settlement};
pub use state::{RunnerEvent, RunnerState, RunnerTransitions};
