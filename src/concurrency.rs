//! # Concurrency targets.
//!
//! [`Orchestrator::scale`](crate::Orchestrator::scale) accepts either an exact count or a
//! spec string resolved against `M`, the available parallelism (`H = ceil(M/2)`):
//!
//! | form    | value                                   |
//! |---------|-----------------------------------------|
//! | `n`     | `n`                                     |
//! | `max`   | `M`                                     |
//! | `half`  | `H`                                     |
//! | `-n`    | `M − n`; `-0` → `M`, `n ≥ M` → `1`      |
//! | `n/m`   | `ceil(M·n/m)`; `0/m` → `0` (also `0/0`); `n/0` invalid |
//! | `n%`    | `ceil(M·n/100)`; `0%` → `0`             |
//!
//! Anything else (signs on fractions or percentages, whitespace, empty input) is invalid.
//!
//! ```rust
//! use runvisor::parse_concurrency;
//!
//! assert_eq!(parse_concurrency("max", 8), Some(8));
//! assert_eq!(parse_concurrency("-2", 8), Some(6));
//! assert_eq!(parse_concurrency("1/3", 8), Some(3));
//! assert_eq!(parse_concurrency("-100%", 8), None);
//! ```

use std::fmt;

/// Requested pool size: an exact count or a spec string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Concurrency {
    /// Exact number of runners.
    Count(usize),
    /// Spec string, see the module docs.
    Spec(String),
}

impl Concurrency {
    /// Resolves the target against `max_parallelism`. `None` means invalid spec.
    pub fn resolve(&self, max_parallelism: usize) -> Option<usize> {
        match self {
            Concurrency::Count(n) => Some(*n),
            Concurrency::Spec(text) => parse_concurrency(text, max_parallelism),
        }
    }
}

impl From<usize> for Concurrency {
    fn from(n: usize) -> Self {
        Concurrency::Count(n)
    }
}

impl From<&str> for Concurrency {
    fn from(s: &str) -> Self {
        Concurrency::Spec(s.to_owned())
    }
}

impl From<String> for Concurrency {
    fn from(s: String) -> Self {
        Concurrency::Spec(s)
    }
}

impl fmt::Display for Concurrency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Concurrency::Count(n) => write!(f, "{n}"),
            Concurrency::Spec(s) => f.write_str(s),
        }
    }
}

/// Logical cores of this machine, at least 1.
pub fn available_parallelism() -> usize {
    num_cpus::get().max(1)
}

/// Parses a concurrency spec against `max_parallelism` (`M`, clamped to at least 1).
pub fn parse_concurrency(text: &str, max_parallelism: usize) -> Option<usize> {
    let max = max_parallelism.max(1);

    match text {
        "max" => return Some(max),
        "half" => return Some(max.div_ceil(2)),
        _ => {}
    }

    if let Some(n) = digits(text) {
        return Some(n);
    }
    if let Some(n) = text.strip_suffix('%').and_then(digits) {
        return scaled(max, n, 100);
    }
    if let Some(rest) = text.strip_prefix('-') {
        if !is_digits(rest) {
            return None;
        }
        // Too large for usize is still `n >= M`.
        return Some(rest.parse().map_or(1, |n: usize| max.saturating_sub(n).max(1)));
    }
    if let Some((num, den)) = text.split_once('/') {
        let (num, den) = (digits(num)?, digits(den)?);
        if num == 0 {
            return Some(0);
        }
        if den == 0 {
            return None;
        }
        return scaled(max, num, den);
    }
    None
}

/// Parses a non-empty run of ASCII digits.
fn digits(s: &str) -> Option<usize> {
    if !is_digits(s) {
        return None;
    }
    s.parse().ok()
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// `ceil(max · num / den)`, with `num = 0` yielding 0.
fn scaled(max: usize, num: usize, den: usize) -> Option<usize> {
    let product = (max as u128).checked_mul(num as u128)?;
    usize::try_from(product.div_ceil(den as u128)).ok()
}
