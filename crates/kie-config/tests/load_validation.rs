// crates/kie-config/tests/load_validation.rs
// ============================================================================
// Module: Config Load Tests
// Description: Validate defaults, file loading, and parse failures.
// ============================================================================
//! ## Overview
//! Ensures a missing file yields conservative defaults, a valid file
//! overrides them section by section, and malformed TOML names its path.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::fs;

use kie_config::ConfigError;
use kie_config::EngineConfig;

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = EngineConfig::load(&dir.path().join("kie.toml")).expect("defaults");
    assert!((config.triage.alpha - 0.5).abs() < f64::EPSILON);
    assert!((config.triage.beta - 0.3).abs() < f64::EPSILON);
    assert!((config.triage.gamma - 0.2).abs() < f64::EPSILON);
    assert!((config.triage.magnitude_floor - 0.10).abs() < f64::EPSILON);
    assert!((config.triage.confidence_floor - 0.30).abs() < f64::EPSILON);
    assert!(config.validator.strict_for_build);
    assert!(!config.validator.strict_for_preview);
    assert_eq!(config.toolchain.node_floor_major, 18);
}

#[test]
fn partial_files_override_only_their_sections() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("kie.toml");
    fs::write(&path, "[triage]\nalpha = 0.7\nbeta = 0.2\ngamma = 0.1\n").expect("write");
    let config = EngineConfig::load(&path).expect("load");
    assert!((config.triage.alpha - 0.7).abs() < f64::EPSILON);
    assert!(config.validator.strict_for_build);
    assert_eq!(config.loader.max_rows, 1_000_000);
}

#[test]
fn lexicon_extensions_parse() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("kie.toml");
    fs::write(
        &path,
        "[lexicon.extra_keywords]\nrevenue = [\"bookings\", \"gmv\"]\n",
    )
    .expect("write");
    let config = EngineConfig::load(&path).expect("load");
    let extras = config
        .lexicon
        .extra_keywords
        .get(&kie_core::SemanticRole::Revenue)
        .expect("revenue extras");
    assert_eq!(extras, &vec!["bookings".to_string(), "gmv".to_string()]);
}

#[test]
fn malformed_toml_names_the_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("kie.toml");
    fs::write(&path, "[triage\nalpha = ").expect("write");
    let err = EngineConfig::load(&path).expect_err("parse failure");
    match err {
        ConfigError::Parse {
            path: reported,
            ..
        } => assert!(reported.ends_with("kie.toml")),
        other => panic!("unexpected error: {other}"),
    }
}
