//! # runvisor
//!
//! **Runvisor** is a self-healing worker pool for Rust.
//!
//! It keeps a target number of identical units of work running, restarts them when
//! they finish or fail (with a pool-wide exponential backoff), and lets the target
//! change while the pool is live. Every unit of work is wrapped in a [`Runner`], a
//! small state machine that makes lifecycle misuse a typed error instead of a bug.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!                 ┌────────────────────────┐
//!                 │    RunnableFactory     │  (user: creates one Runnable per slot)
//!                 └───────────┬────────────┘
//!                             ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Orchestrator (pool state machine: Running/Scaling/Terminating)   │
//! │  - runner set (one slot per Runner)                               │
//! │  - shared retry counter + BackoffPolicy                           │
//! │  - Bus (broadcast events) + SubscriberSet                         │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │ supervision  │   │ supervision  │   │ supervision  │
//!     │    loop 1    │   │    loop 2    │   │    loop N    │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//!        Runner 1           Runner 2           Runner N
//!     (lifecycle FSM)    (lifecycle FSM)    (lifecycle FSM)
//!            │                  │                  │
//!            └── publish(RunnerFailed / BackoffScheduled / ...) ──► Bus
//!                                                                    │
//!                                                      subscriber listener
//!                                                                    ▼
//!                                                             SubscriberSet
//! ```
//!
//! ### Runner lifecycle
//! ```text
//! Created ─init─► Initializing ─inited─► Ready ─start─► Starting ─started─► Running
//!                      └─crash─► Crashed ─init─► …                             │
//!           Running ─complete─► Completed ─start─► …                           │
//!           Running ─error─►    Error     ─start─► …                           │
//!           Running ─stop─►     Stopping  ─stopped─► Stopped ─start─► …        │
//!           Ready | Completed | Error | Stopped ─destroy─► Destroyed (terminal)
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                             |
//! |-------------------|---------------------------------------------------------------|------------------------------------------------|
//! | **Work units**    | Define units of work as trait impls or closures.              | [`Runnable`], [`RunnableFn`], [`RunnableFactory`] |
//! | **Lifecycle**     | Table-driven state machine around one unit of work.           | [`Runner`], [`RunnerState`], [`StateMachine`]  |
//! | **Pool**          | Scale, supervise and terminate a pool of runners.             | [`Orchestrator`], [`Concurrency`]              |
//! | **Policies**      | Restart delay growth and jitter.                              | [`BackoffPolicy`], [`JitterPolicy`]            |
//! | **Subscriber API**| Hook into pool events (logging, metrics, custom subscribers). | [`Subscribe`], [`Event`]                       |
//! | **Errors**        | Typed errors for runnables, runners and the pool.             | [`RunnableError`], [`RunnerError`], [`OrchestratorError`] |
//! | **Control**       | Identified handle for remote controllers.                     | [`ControlApi`]                                 |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use runvisor::{Orchestrator, OrchestratorConfig, RunnableError, RunnableFn, RunnableRef};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Build subscribers (optional)
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn runvisor::Subscribe>> = vec![Arc::new(runvisor::LogWriter::new())];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn runvisor::Subscribe>> = Vec::new();
//!
//!     // One fresh runnable per pool slot
//!     let factory = || async {
//!         let worker: RunnableRef<String> =
//!             RunnableFn::arc(|ctx: CancellationToken, queue: String| async move {
//!                 if ctx.is_cancelled() {
//!                     return Err(RunnableError::Canceled);
//!                 }
//!                 println!("polling {queue}");
//!                 ctx.cancelled().await;
//!                 Ok(())
//!             });
//!         Ok::<_, RunnableError>(worker)
//!     };
//!
//!     let pool = Orchestrator::builder(factory, "jobs".to_string())
//!         .with_config(OrchestratorConfig { max_parallelism: Some(4), ..Default::default() })
//!         .with_subscribers(subs)
//!         .build();
//!
//!     pool.scale("half").await?;
//!     assert_eq!(pool.instances(), 2);
//!
//!     pool.terminate().await?;
//!     Ok(())
//! }
//! ```
mod concurrency;
mod control;
mod core;
mod error;
mod events;
mod fsm;
mod policies;
mod runnables;
mod runner;
mod subscribers;

// ---- Public re-exports ----

pub use concurrency::{available_parallelism, parse_concurrency, Concurrency};
pub use control::ControlApi;
pub use core::{
    Orchestrator, OrchestratorBuilder, OrchestratorConfig, OrchestratorEvent, OrchestratorState,
    OrchestratorTransitions,
};
pub use error::{OrchestratorError, RunnableError, RunnerError};
pub use events::{Bus, Event, EventKind};
pub use fsm::{InvalidTransition, StateMachine, Transitions};
pub use policies::{BackoffPolicy, JitterPolicy};
pub use runnables::{Runnable, RunnableFactory, RunnableFn, RunnableRef};
pub use runner::{Outcome, Runner, RunnerEvent, RunnerState, RunnerTransitions, Settlement};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
