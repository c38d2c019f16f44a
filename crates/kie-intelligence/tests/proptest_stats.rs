// crates/kie-intelligence/tests/proptest_stats.rs
// ============================================================================
// Module: Statistics Property Tests
// Description: Property-based checks over the deterministic statistics.
// ============================================================================
//! ## Overview
//! Ensures rank assignment is a permutation-with-ties invariant, Spearman
//! stays within `[-1, 1]`, and the robust statistics never produce NaN on
//! finite input.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use kie_intelligence::table::mad;
use kie_intelligence::table::mean;
use kie_intelligence::table::median;
use kie_intelligence::table::ranks;
use kie_intelligence::table::spearman;
use kie_intelligence::table::std_dev;
use proptest::prelude::proptest;

proptest! {
    #[test]
    fn ranks_sum_to_the_triangular_number(values in proptest::collection::vec(-1e6_f64..1e6, 1..64)) {
        let assigned = ranks(&values);
        let total: f64 = assigned.iter().sum();
        let n = values.len() as f64;
        let expected = n * (n + 1.0) / 2.0;
        assert!((total - expected).abs() < 1e-6);
    }

    #[test]
    fn spearman_is_bounded(
        left in proptest::collection::vec(-1e6_f64..1e6, 3..64),
        right in proptest::collection::vec(-1e6_f64..1e6, 3..64),
    ) {
        let len = left.len().min(right.len());
        if let Some(rho) = spearman(&left[..len], &right[..len]) {
            assert!((-1.0 - 1e-9..=1.0 + 1e-9).contains(&rho));
        }
    }

    #[test]
    fn central_statistics_are_finite(values in proptest::collection::vec(-1e6_f64..1e6, 1..64)) {
        assert!(mean(&values).is_some_and(f64::is_finite));
        assert!(median(&values).is_some_and(f64::is_finite));
        assert!(mad(&values).is_some_and(f64::is_finite));
        if values.len() >= 2 {
            assert!(std_dev(&values).is_some_and(f64::is_finite));
        }
    }

    #[test]
    fn spearman_of_a_monotone_map_is_one(values in proptest::collection::vec(-1e3_f64..1e3, 3..32)) {
        let mut distinct = values;
        distinct.sort_by(f64::total_cmp);
        distinct.dedup();
        if distinct.len() >= 3 {
            let doubled: Vec<f64> = distinct.iter().map(|value| value * 2.0 + 1.0).collect();
            let rho = spearman(&distinct, &doubled).expect("defined");
            assert!((rho - 1.0).abs() < 1e-9);
        }
    }
}
