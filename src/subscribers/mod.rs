//! # Event subscribers.
//!
//! ```text
//! supervision loops ── publish(Event) ──► Bus ──► subscriber listener ──► SubscriberSet
//!                                                                    ┌──────┼──────┐
//!                                                                    ▼      ▼      ▼
//!                                                               LogWriter Metrics Custom
//! ```
//!
//! - [`Subscribe`]: trait implemented by user subscribers
//! - [`SubscriberSet`]: per-subscriber queues and workers
//! - `LogWriter` (feature `logging`): renders events through `tracing`

#[cfg(feature = "logging")]
mod log;
mod subscriber;
mod subscriber_set;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use subscriber::Subscribe;
pub use subscriber_set::SubscriberSet;
