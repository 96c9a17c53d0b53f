//! # Orchestrator configuration.
//!
//! ## Sentinel values
//! - `max_parallelism = None` → detected logical cores
//! - `bus_capacity = 0` → clamped to 1

use crate::concurrency::available_parallelism;
use crate::policies::BackoffPolicy;

/// Settings of one orchestrator.
///
/// ## Field semantics
/// - `backoff`: restart delay after a failed run, indexed by the pool-wide retry depth
/// - `bus_capacity`: event ring buffer size shared by all receivers
/// - `max_parallelism`: `M` in concurrency specs (`"max"`, `"half"`, `"-n"`, `"n/m"`, `"n%"`)
#[derive(Clone, Debug)]
pub struct OrchestratorConfig {
    /// Restart delay policy for failed runs.
    pub backoff: BackoffPolicy,

    /// Capacity of the event bus broadcast channel.
    pub bus_capacity: usize,

    /// Parallelism used to resolve concurrency specs.
    pub max_parallelism: Option<usize>,
}

impl OrchestratorConfig {
    /// Returns `M` for concurrency specs, at least 1.
    #[inline]
    pub fn parallelism(&self) -> usize {
        self.max_parallelism
            .unwrap_or_else(available_parallelism)
            .max(1)
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for OrchestratorConfig {
    /// - `backoff = BackoffPolicy::default()` (1s doubling, capped at 30s)
    /// - `bus_capacity = 1024`
    /// - `max_parallelism = None` (detect)
    fn default() -> Self {
        Self {
            backoff: BackoffPolicy::default(),
            bus_capacity: 1024,
            max_parallelism: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_and_clamps() {
        let cfg = OrchestratorConfig {
            max_parallelism: Some(0),
            bus_capacity: 0,
            ..OrchestratorConfig::default()
        };
        assert_eq!(cfg.parallelism(), 1);
        assert_eq!(cfg.bus_capacity_clamped(), 1);

        let cfg = OrchestratorConfig::default();
        assert_eq!(cfg.parallelism(), available_parallelism());
    }
}
