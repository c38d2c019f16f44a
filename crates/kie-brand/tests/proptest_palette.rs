// crates/kie-brand/tests/proptest_palette.rs
// ============================================================================
// Module: Palette Property Tests
// Description: Property-based checks over hex parsing and contrast math.
// ============================================================================
//! ## Overview
//! Ensures hex normalization is idempotent, contrast ratios are symmetric
//! and bounded within the WCAG range, and every palette entry parses.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use kie_brand::KDS_PALETTE;
use kie_brand::contrast_ratio;
use kie_brand::palette::normalize_hex;
use kie_brand::palette::parse_hex;
use proptest::prelude::proptest;

#[test]
fn every_palette_entry_parses() {
    for entry in KDS_PALETTE {
        assert!(parse_hex(entry).is_some(), "unparsable palette entry {entry}");
    }
}

proptest! {
    #[test]
    fn normalization_is_idempotent(red in 0_u8.., green in 0_u8.., blue in 0_u8..) {
        let hex = format!("#{red:02x}{green:02x}{blue:02x}");
        let once = normalize_hex(&hex);
        assert_eq!(normalize_hex(&once), once);
        assert_eq!(parse_hex(&hex), Some((red, green, blue)));
    }

    #[test]
    fn contrast_is_symmetric_and_bounded(
        a_red in 0_u8.., a_green in 0_u8.., a_blue in 0_u8..,
        b_red in 0_u8.., b_green in 0_u8.., b_blue in 0_u8..,
    ) {
        let fore = format!("#{a_red:02x}{a_green:02x}{a_blue:02x}");
        let back = format!("#{b_red:02x}{b_green:02x}{b_blue:02x}");
        let forward = contrast_ratio(&fore, &back).expect("defined");
        let backward = contrast_ratio(&back, &fore).expect("defined");
        assert!((forward - backward).abs() < 1e-9);
        assert!((1.0..=21.0 + 1e-9).contains(&forward));
    }
}
