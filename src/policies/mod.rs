//! Retry timing policies.
//!
//! ## Contents
//! - [`BackoffPolicy`] how the delay before restarting a failed runner grows
//! - [`JitterPolicy`]  randomization spreading restarts of runners that failed together
//!
//! ## Quick wiring
//! ```text
//! OrchestratorConfig { backoff: BackoffPolicy, .. }
//!      └─► supervision loop on Error:
//!           delay = backoff.next(retries++)   (retries is pool-wide)
//! ```

mod backoff;
mod jitter;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
