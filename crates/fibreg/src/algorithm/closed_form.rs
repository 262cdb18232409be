use super::{Precision, float::BinaryFloat};
use num_bigint::BigUint;

/// Default significand width for [`closed_form`].
pub const DEFAULT_PRECISION_BITS: u64 = 256;

/// Largest 1-indexed input for which [`closed_form`] at
/// [`DEFAULT_PRECISION_BITS`] agrees exactly with the integer algorithms.
///
/// Measured, not derived: every term through 357 is exact and term 358 is the
/// first to round the wrong way. Both ends are pinned by tests.
pub const DEFAULT_PRECISION_ENVELOPE: u64 = 357;

/// Computes the `n`-th term with Binet's formula, `round(phi^(n-1) / sqrt(5))`.
///
/// This is an approximation: at a [`Precision::Fixed`] width it is exact only
/// up to a bounded input (see [`DEFAULT_PRECISION_ENVELOPE`]) and diverges
/// beyond it. [`Precision::Adaptive`] widens the significand with `n` and
/// keeps the result exact.
///
/// `n` is 1-indexed; `n <= 1` yields `0` and `n = 2` yields `1`.
pub fn closed_form(n: u64, precision: Precision) -> BigUint {
    let k = n.saturating_sub(1);
    let bits = precision.bits_for(k);

    let sqrt5 = BinaryFloat::from_u64(5, bits).sqrt(bits);
    let phi = BinaryFloat::from_u64(1, bits).add(&sqrt5, bits).halve();

    phi.powi(k, bits).div(&sqrt5, bits).round_half_up()
}
