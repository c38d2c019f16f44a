// crates/kie-config/tests/boundary_validation.rs
// ============================================================================
// Module: Config Boundary Tests
// Description: Validate field-domain enforcement with field-path messages.
// ============================================================================
//! ## Overview
//! Ensures every documented domain constraint rejects out-of-range values
//! and that error messages carry the dotted field path.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use kie_config::ConfigError;
use kie_config::EngineConfig;

/// Asserts validation fails naming the given field.
fn assert_invalid(config: &EngineConfig, field: &str) {
    match config.validate().expect_err("validation must fail") {
        ConfigError::Invalid {
            field: reported,
            ..
        } => assert_eq!(reported, field),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn negative_weights_are_rejected() {
    let mut config = EngineConfig::default();
    config.triage.alpha = -0.1;
    assert_invalid(&config, "triage.alpha");
}

#[test]
fn non_finite_weights_are_rejected() {
    let mut config = EngineConfig::default();
    config.triage.beta = f64::NAN;
    assert_invalid(&config, "triage.beta");
}

#[test]
fn zero_weight_sum_is_rejected() {
    let mut config = EngineConfig::default();
    config.triage.alpha = 0.0;
    config.triage.beta = 0.0;
    config.triage.gamma = 0.0;
    assert_invalid(&config, "triage");
}

#[test]
fn floors_must_lie_in_unit_interval() {
    let mut config = EngineConfig::default();
    config.triage.magnitude_floor = 1.5;
    assert_invalid(&config, "triage.magnitude_floor");

    let mut config = EngineConfig::default();
    config.triage.confidence_floor = -0.2;
    assert_invalid(&config, "triage.confidence_floor");
}

#[test]
fn loader_ratios_must_lie_in_unit_interval() {
    let mut config = EngineConfig::default();
    config.loader.null_ratio_warn = 2.0;
    assert_invalid(&config, "loader.null_ratio_warn");

    let mut config = EngineConfig::default();
    config.loader.high_cardinality_ratio = -1.0;
    assert_invalid(&config, "loader.high_cardinality_ratio");
}

#[test]
fn zero_caps_are_rejected() {
    let mut config = EngineConfig::default();
    config.loader.max_rows = 0;
    assert_invalid(&config, "loader.max_rows");

    let mut config = EngineConfig::default();
    config.toolchain.node_floor_major = 0;
    assert_invalid(&config, "toolchain.node_floor_major");
}

#[test]
fn defaults_validate() {
    EngineConfig::default().validate().expect("defaults are valid");
}
