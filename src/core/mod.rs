//! Pool core: orchestration and runner supervision.
//!
//! The only entry points from this module are [`Orchestrator`] and its builder and
//! configuration; everything else is wiring.
//!
//! Internal modules:
//! - [`state`]: pool-level states and transition table;
//! - [`orchestrator`]: scaling, termination and the runner set;
//! - [`slot`]: one pool member and its stop sequence;
//! - [`supervise`]: per-runner restart loop with shared retry backoff;
//! - [`builder`]: wires bus, subscribers and shared state.

mod builder;
mod config;
mod orchestrator;
mod slot;
mod state;
mod supervise;

pub use builder::OrchestratorBuilder;
pub use config::OrchestratorConfig;
pub use orchestrator::Orchestrator;
pub use state::{OrchestratorEvent, OrchestratorState, OrchestratorTransitions};
