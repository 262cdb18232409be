mod closed_form;
mod float;
mod iterative;
mod recursive;
#[cfg(test)]
mod tests;

pub use closed_form::*;
pub use iterative::*;
pub use recursive::*;

use crate::{Error, Result};
use core::{fmt, str::FromStr};
use num_bigint::BigUint;

/// The strategy used to evaluate a sequence term.
///
/// Every variant computes the same 1-indexed term (`n = 1` is `0`, `n = 2` is
/// `1`), so the choice only affects cost. [`Algorithm::ClosedForm`] is exact
/// only inside its precision envelope; see [`closed_form`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Algorithm {
    /// Bottom-up accumulation of the two previous terms.
    #[cfg_attr(feature = "serde", serde(rename = "iterate"))]
    Iterative,
    /// Top-down recursion over a per-call memo table.
    #[cfg_attr(feature = "serde", serde(rename = "recursive"))]
    MemoizedRecursive,
    /// Binet's formula over arbitrary-precision binary floats.
    #[cfg_attr(feature = "serde", serde(rename = "math"))]
    ClosedForm,
}

impl Algorithm {
    /// All supported algorithms, in wire-name order.
    pub const ALL: [Self; 3] = [Self::Iterative, Self::MemoizedRecursive, Self::ClosedForm];

    /// The short name used on the wire.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Iterative => "iterate",
            Self::MemoizedRecursive => "recursive",
            Self::ClosedForm => "math",
        }
    }

    /// Computes the `n`-th term with this algorithm.
    ///
    /// `precision` is only consulted by [`Algorithm::ClosedForm`].
    pub fn compute(self, n: u64, precision: Precision) -> BigUint {
        match self {
            Self::Iterative => iterative(n),
            Self::MemoizedRecursive => memoized_recursive(n),
            Self::ClosedForm => closed_form(n, precision),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    /// Accepts the wire names (`iterate`, `recursive`, `math`) and the long
    /// names (`iterative`, `memoized-recursive`, `closed-form`).
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "iterate" | "iterative" => Ok(Self::Iterative),
            "recursive" | "memoized-recursive" => Ok(Self::MemoizedRecursive),
            "math" | "closed-form" => Ok(Self::ClosedForm),
            other => Err(Error::UnknownAlgorithm {
                name: other.to_string(),
            }),
        }
    }
}

/// Working precision for [`closed_form`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Precision {
    /// A fixed significand width in bits. Results are exact only inside the
    /// envelope for that width.
    Fixed(u64),
    /// Sizes the significand from the requested index so the result is exact
    /// for every input.
    Adaptive,
}

impl Precision {
    /// The narrowest significand the closed form will work with.
    pub const MIN_BITS: u64 = 64;

    /// Returns the significand width used to evaluate the zero-indexed term
    /// `k`.
    ///
    /// For [`Precision::Adaptive`] the width grows with `k * log2(phi)`
    /// (`log2(phi) ~ 0.6943 < 0.7`) plus headroom for the rounding error
    /// accumulated by exponentiation.
    pub fn bits_for(self, k: u64) -> u64 {
        match self {
            Self::Fixed(bits) => bits.max(Self::MIN_BITS),
            Self::Adaptive => {
                let headroom = 2 * u64::from(u64::BITS - k.leading_zeros()) + 64;
                (k.saturating_mul(7) / 10)
                    .saturating_add(headroom)
                    .max(DEFAULT_PRECISION_BITS)
            }
        }
    }
}

impl Default for Precision {
    fn default() -> Self {
        Self::Fixed(DEFAULT_PRECISION_BITS)
    }
}
