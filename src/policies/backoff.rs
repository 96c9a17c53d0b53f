//! # Exponential backoff for failed runs.
//!
//! The supervision loop feeds [`BackoffPolicy::next`] with the **pool-wide** retry
//! counter, not a per-runner attempt number. Failures anywhere in the pool deepen the
//! delay for everyone; stops and completions relax it.
//!
//! The delay for depth `n` is `first × factor^n`, clamped to `max`, then jittered.
//! The base is derived from the depth alone, so jitter never feeds back into later delays.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use runvisor::BackoffPolicy;
//!
//! let backoff = BackoffPolicy::default();
//!
//! assert_eq!(backoff.next(0), Duration::from_secs(1));
//! assert_eq!(backoff.next(3), Duration::from_secs(8));
//! assert_eq!(backoff.next(10), Duration::from_secs(30));
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Retry backoff policy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackoffPolicy {
    /// Delay at depth 0.
    pub first: Duration,
    /// Upper bound for any delay.
    pub max: Duration,
    /// Multiplicative growth per depth level (`>= 1.0` recommended).
    pub factor: f64,
    /// Randomization applied to the clamped delay.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// `first = 1s`, `factor = 2.0`, `max = 30s`, no jitter.
    fn default() -> Self {
        Self {
            first: Duration::from_secs(1),
            max: Duration::from_secs(30),
            factor: 2.0,
            jitter: JitterPolicy::None,
        }
    }
}

impl BackoffPolicy {
    /// Computes the delay for the given retry depth.
    ///
    /// Non-finite or out-of-range intermediate values clamp to [`BackoffPolicy::max`].
    pub fn next(&self, depth: u32) -> Duration {
        let exp = depth.min(i32::MAX as u32) as i32;
        let secs = self.first.as_secs_f64() * self.factor.powi(exp);

        let base = if !secs.is_finite() || secs < 0.0 || secs > self.max.as_secs_f64() {
            self.max
        } else {
            Duration::from_secs_f64(secs)
        };
        self.jitter.apply(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(first_ms: u64, max_ms: u64, factor: f64) -> BackoffPolicy {
        BackoffPolicy {
            first: Duration::from_millis(first_ms),
            max: Duration::from_millis(max_ms),
            factor,
            jitter: JitterPolicy::None,
        }
    }

    #[test]
    fn test_default_doubles_from_one_second() {
        let policy = BackoffPolicy::default();
        let delays: Vec<_> = (0..6).map(|d| policy.next(d).as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 4, 8, 16, 30]);
    }

    #[test]
    fn test_non_decreasing_and_capped() {
        let policy = BackoffPolicy::default();
        let mut prev = Duration::ZERO;
        for depth in 0..64 {
            let d = policy.next(depth);
            assert!(d >= prev, "depth {depth}: {d:?} < {prev:?}");
            assert!(d <= Duration::from_secs(30));
            prev = d;
        }
    }

    #[test]
    fn test_constant_factor() {
        let policy = plain(500, 30_000, 1.0);
        for depth in 0..10 {
            assert_eq!(policy.next(depth), Duration::from_millis(500));
        }
    }

    #[test]
    fn test_first_exceeds_max() {
        let policy = plain(10_000, 5_000, 2.0);
        assert_eq!(policy.next(0), Duration::from_secs(5));
    }

    #[test]
    fn test_overflow_clamps_to_max() {
        let policy = plain(100, 10_000, 2.0);
        assert_eq!(policy.next(u32::MAX), Duration::from_secs(10));
    }

    #[test]
    fn test_equal_jitter_stays_within_half_and_base() {
        let policy = BackoffPolicy {
            jitter: JitterPolicy::Equal,
            ..BackoffPolicy::default()
        };
        for depth in 0..8 {
            let base = BackoffPolicy::default().next(depth);
            let d = policy.next(depth);
            assert!(d >= base / 2, "depth {depth}: {d:?}");
            assert!(d <= base, "depth {depth}: {d:?}");
        }
    }
}
