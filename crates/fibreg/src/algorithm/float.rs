//! A minimal non-negative binary floating-point value backed by [`BigUint`].
//!
//! A [`BinaryFloat`] is `significand * 2^exponent`. Every operation takes the
//! working precision in bits and truncates the significand to that width
//! (rounding toward zero), so a chain of `m` operations is off by at most
//! about `m` units in the last place.

use num_bigint::BigUint;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct BinaryFloat {
    significand: BigUint,
    exponent: i64,
}

impl BinaryFloat {
    pub(crate) fn from_u64(value: u64, precision: u64) -> Self {
        Self {
            significand: BigUint::from(value),
            exponent: 0,
        }
        .truncate(precision)
    }

    fn truncate(mut self, precision: u64) -> Self {
        let bits = self.significand.bits();
        if bits > precision {
            let excess = bits - precision;
            self.significand >>= excess;
            self.exponent += excess as i64;
        }
        self
    }

    pub(crate) fn add(&self, rhs: &Self, precision: u64) -> Self {
        let (low, high) = if self.exponent <= rhs.exponent {
            (self, rhs)
        } else {
            (rhs, self)
        };
        let shift = (high.exponent - low.exponent) as u64;
        Self {
            significand: &low.significand + (&high.significand << shift),
            exponent: low.exponent,
        }
        .truncate(precision)
    }

    pub(crate) fn mul(&self, rhs: &Self, precision: u64) -> Self {
        Self {
            significand: &self.significand * &rhs.significand,
            exponent: self.exponent + rhs.exponent,
        }
        .truncate(precision)
    }

    /// Divides by `rhs`, which must be non-zero.
    pub(crate) fn div(&self, rhs: &Self, precision: u64) -> Self {
        // Widen the dividend so the quotient carries at least `precision`
        // significant bits.
        let shift = precision + rhs.significand.bits();
        Self {
            significand: (&self.significand << shift) / &rhs.significand,
            exponent: self.exponent - shift as i64 - rhs.exponent,
        }
        .truncate(precision)
    }

    pub(crate) fn sqrt(&self, precision: u64) -> Self {
        // The integer square root of a 2p-bit significand has p bits; the
        // exponent must stay even so it can be halved exactly.
        let mut shift = (2 * precision).saturating_sub(self.significand.bits());
        if (self.exponent - shift as i64) % 2 != 0 {
            shift += 1;
        }
        let widened = &self.significand << shift;
        Self {
            significand: widened.sqrt(),
            exponent: (self.exponent - shift as i64) / 2,
        }
        .truncate(precision)
    }

    /// Multiplies by `2^-1` exactly.
    pub(crate) fn halve(mut self) -> Self {
        self.exponent -= 1;
        self
    }

    /// Raises to a non-negative integer power by repeated squaring.
    pub(crate) fn powi(&self, mut exp: u64, precision: u64) -> Self {
        let mut result = Self::from_u64(1, precision);
        let mut base = self.clone();
        while exp > 0 {
            if exp & 1 == 1 {
                result = result.mul(&base, precision);
            }
            exp >>= 1;
            if exp > 0 {
                base = base.mul(&base, precision);
            }
        }
        result
    }

    /// Rounds to the nearest integer, with halves rounded up.
    pub(crate) fn round_half_up(&self) -> BigUint {
        if self.exponent >= 0 {
            return &self.significand << self.exponent as u64;
        }
        let shift = self.exponent.unsigned_abs();
        let half = BigUint::from(1_u8) << (shift - 1);
        (&self.significand + half) >> shift
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const P: u64 = 128;

    #[test]
    fn sqrt_of_perfect_square_is_exact() {
        let sixteen = BinaryFloat::from_u64(16, P);
        assert_eq!(sixteen.sqrt(P).round_half_up(), BigUint::from(4_u8));
        let big = BinaryFloat::from_u64(1 << 40, P);
        assert_eq!(big.sqrt(P).round_half_up(), BigUint::from(1_u64 << 20));
    }

    #[test]
    fn sqrt_five_squares_back() {
        let five = BinaryFloat::from_u64(5, P);
        let root = five.sqrt(P);
        assert_eq!(root.mul(&root, P).round_half_up(), BigUint::from(5_u8));
    }

    #[test]
    fn division_and_rounding() {
        let seven = BinaryFloat::from_u64(7, P);
        let two = BinaryFloat::from_u64(2, P);
        // 3.5 rounds half up to 4.
        assert_eq!(seven.div(&two, P).round_half_up(), BigUint::from(4_u8));
        let three = BinaryFloat::from_u64(3, P);
        // 2.333.. rounds to 2.
        assert_eq!(seven.div(&three, P).round_half_up(), BigUint::from(2_u8));
    }

    #[test]
    fn add_aligns_exponents() {
        let one = BinaryFloat::from_u64(1, P);
        let half = one.clone().halve();
        let sum = one.add(&half, P).add(&half, P);
        assert_eq!(sum.round_half_up(), BigUint::from(2_u8));
    }

    #[test]
    fn powi_matches_integer_power() {
        let three = BinaryFloat::from_u64(3, P);
        assert_eq!(three.powi(0, P).round_half_up(), BigUint::from(1_u8));
        assert_eq!(three.powi(1, P).round_half_up(), BigUint::from(3_u8));
        assert_eq!(
            three.powi(40, P).round_half_up(),
            BigUint::from(3_u8).pow(40)
        );
    }

    #[test]
    fn truncation_limits_significand_width() {
        let value = BinaryFloat::from_u64(u64::MAX, 8);
        assert!(value.significand.bits() <= 8);
        assert_eq!(value.exponent, 56);
    }
}
