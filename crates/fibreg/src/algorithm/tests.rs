use crate::{
    Algorithm, DEFAULT_PRECISION_ENVELOPE, Error, Precision, closed_form, iterative,
    memoized_recursive,
};
use num_bigint::BigUint;
use std::thread;

fn big(value: u64) -> BigUint {
    BigUint::from(value)
}

/// Runs `f` on a thread with a stack deep enough for `memoized_recursive`.
fn with_deep_stack<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> T {
    thread::Builder::new()
        .stack_size(256 * 1024 * 1024)
        .spawn(f)
        .unwrap()
        .join()
        .unwrap()
}

#[test]
fn base_cases() {
    for algorithm in Algorithm::ALL {
        let precision = Precision::default();
        assert_eq!(algorithm.compute(0, precision), big(0), "{algorithm}");
        assert_eq!(algorithm.compute(1, precision), big(0), "{algorithm}");
        assert_eq!(algorithm.compute(2, precision), big(1), "{algorithm}");
        assert_eq!(algorithm.compute(3, precision), big(1), "{algorithm}");
    }
}

#[test]
fn thirteenth_term_is_144() {
    for algorithm in Algorithm::ALL {
        assert_eq!(algorithm.compute(13, Precision::default()), big(144), "{algorithm}");
    }
}

#[test]
fn known_terms() {
    let known = [
        (10, 34),
        (20, 4181),
        (50, 7_778_742_049),
        (94, 12_200_160_415_121_876_738),
    ];
    for (n, expected) in known {
        assert_eq!(iterative(n), big(expected), "n = {n}");
        assert_eq!(memoized_recursive(n), big(expected), "n = {n}");
        assert_eq!(closed_form(n, Precision::default()), big(expected), "n = {n}");
    }
}

#[test]
fn past_u64_range() {
    // F(100) in zero-indexed terms.
    let expected: BigUint = "354224848179261915075".parse().unwrap();
    assert_eq!(iterative(101), expected);
    assert_eq!(memoized_recursive(101), expected);
    assert_eq!(closed_form(101, Precision::default()), expected);
}

#[test]
fn all_algorithms_agree_inside_default_envelope() {
    for n in 1..=DEFAULT_PRECISION_ENVELOPE {
        let expected = iterative(n);
        assert_eq!(memoized_recursive(n), expected, "recursive diverged at n = {n}");
        assert_eq!(
            closed_form(n, Precision::default()),
            expected,
            "closed form diverged at n = {n}"
        );
    }
}

#[test]
fn fixed_precision_diverges_outside_envelope() {
    let first = DEFAULT_PRECISION_ENVELOPE + 1;
    assert_eq!(first, 358);
    assert_ne!(closed_form(first, Precision::Fixed(256)), iterative(first));
    assert_ne!(closed_form(1_000, Precision::Fixed(256)), iterative(1_000));
}

#[test]
fn adaptive_precision_stays_exact() {
    for n in [301, 512, 1_000, 2_500, 5_000] {
        assert_eq!(
            closed_form(n, Precision::Adaptive),
            iterative(n),
            "adaptive closed form diverged at n = {n}"
        );
    }
}

#[test]
fn deep_recursion_matches_iterative() {
    let n = 20_000;
    let recursive = with_deep_stack(move || memoized_recursive(n));
    assert_eq!(recursive, iterative(n));
}

#[test]
fn precision_bits() {
    assert_eq!(Precision::default(), Precision::Fixed(256));
    assert_eq!(Precision::Fixed(8).bits_for(10), Precision::MIN_BITS);
    assert_eq!(Precision::Fixed(512).bits_for(10), 512);
    assert_eq!(Precision::Adaptive.bits_for(0), 256);
    assert!(Precision::Adaptive.bits_for(100_000) > 70_000);
}

#[test]
fn parse_algorithm_names() {
    assert_eq!("iterate".parse::<Algorithm>(), Ok(Algorithm::Iterative));
    assert_eq!("iterative".parse::<Algorithm>(), Ok(Algorithm::Iterative));
    assert_eq!("recursive".parse::<Algorithm>(), Ok(Algorithm::MemoizedRecursive));
    assert_eq!("math".parse::<Algorithm>(), Ok(Algorithm::ClosedForm));
    assert_eq!("closed-form".parse::<Algorithm>(), Ok(Algorithm::ClosedForm));
    assert_eq!(
        "bogus".parse::<Algorithm>(),
        Err(Error::UnknownAlgorithm {
            name: "bogus".to_string()
        })
    );
    for algorithm in Algorithm::ALL {
        assert_eq!(algorithm.name().parse::<Algorithm>(), Ok(algorithm));
        assert_eq!(algorithm.to_string(), algorithm.name());
    }
}

#[cfg(feature = "serde")]
#[test]
fn algorithm_serializes_as_wire_name() {
    let json = serde_json::to_string(&Algorithm::ClosedForm).unwrap();
    assert_eq!(json, "\"math\"");
    let parsed: Algorithm = serde_json::from_str("\"recursive\"").unwrap();
    assert_eq!(parsed, Algorithm::MemoizedRecursive);
}
