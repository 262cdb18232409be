use core::mem;
use num_bigint::BigUint;

/// Computes the `n`-th term bottom-up, keeping only the last two terms.
///
/// `n` is 1-indexed; `n <= 1` yields `0` and `n = 2` yields `1`.
pub fn iterative(n: u64) -> BigUint {
    let mut previous = BigUint::from(0_u8);
    if n <= 1 {
        return previous;
    }
    let mut current = BigUint::from(1_u8);
    for _ in 2..n {
        let next = &previous + &current;
        previous = mem::replace(&mut current, next);
    }
    current
}
