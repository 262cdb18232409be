use num_bigint::BigUint;

/// Computes the `n`-th term top-down with a memo table local to this call.
///
/// Each sub-term is computed at most once. The recursion is `n` frames deep,
/// so large inputs need a thread with a matching stack; the dispatcher sizes
/// its compute threads with
/// [`DispatcherConfig::compute_stack_size`](crate::DispatcherConfig).
///
/// `n` is 1-indexed; `n <= 1` yields `0` and `n = 2` yields `1`.
pub fn memoized_recursive(n: u64) -> BigUint {
    let k = usize::try_from(n.saturating_sub(1)).unwrap_or(usize::MAX);
    if k < 2 {
        return BigUint::from(k);
    }
    let mut memo: Vec<Option<BigUint>> = vec![None; k + 1];
    memo[0] = Some(BigUint::from(0_u8));
    memo[1] = Some(BigUint::from(1_u8));
    term(k, &mut memo)
}

fn term(k: usize, memo: &mut [Option<BigUint>]) -> BigUint {
    if let Some(value) = &memo[k] {
        return value.clone();
    }
    let value = term(k - 1, memo) + term(k - 2, memo);
    memo[k] = Some(value.clone());
    value
}
