// crates/kie-engine/tests/gate_scenarios.rs
// ============================================================================
// Module: Gate Scenario Tests
// Description: Policy blocks, recovery plans, and refusal semantics.
// ============================================================================
//! ## Overview
//! Walks the documented refusal scenarios: missing intent, missing theme,
//! tampered chart configurations, synthetic data, toolchain floors, corrupt
//! rails state with repair, and the empty-dataset boundary. Every block must
//! leave the rails untouched and emit a CLI-only recovery plan.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use std::fs;

use common::StubEnvironment;
use common::capture_intent;
use common::engine_in;
use common::engine_with_env;
use common::write_sales_data;
use kie_core::BuildTarget;
use kie_core::Stage;
use kie_core::Theme;
use kie_core::WorkspaceLayout;
use kie_core::runtime::RailsStore;
use kie_engine::CommandKind;

/// Reads the recovery plan text.
fn recovery_text(layout: &WorkspaceLayout) -> String {
    fs::read_to_string(layout.recovery_plan_path()).expect("recovery plan exists")
}

#[test]
fn missing_intent_blocks_build_with_recovery() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = engine_in(&dir);
    engine.execute(&CommandKind::Bootstrap);

    let outcome = engine.execute(&CommandKind::Build(BuildTarget::Presentation));
    assert_eq!(outcome.exit_code, 2);

    let plan = recovery_text(engine.layout());
    assert!(plan.contains("kie spec --init"), "plan: {plan}");

    let rails = RailsStore::new(engine.layout().clone())
        .load()
        .expect("load")
        .expect("rails");
    assert_eq!(rails.current_stage, Stage::Startkie, "a block must not advance the rails");
}

#[test]
fn missing_theme_blocks_build_with_theme_remediation() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = engine_in(&dir);
    engine.execute(&CommandKind::Bootstrap);
    capture_intent(&engine);

    let outcome = engine.execute(&CommandKind::Build(BuildTarget::Dashboard));
    assert_eq!(outcome.exit_code, 2);
    let plan = recovery_text(engine.layout());
    assert!(plan.contains("kie theme"), "plan: {plan}");
}

#[test]
fn eda_without_data_blocks() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = engine_in(&dir);
    engine.execute(&CommandKind::Bootstrap);
    capture_intent(&engine);

    let outcome = engine.execute(&CommandKind::Eda {
        file: None,
    });
    assert_eq!(outcome.exit_code, 2);
    assert!(outcome.blocks.iter().any(|block| block.contains("no data file")));
}

#[test]
fn analyze_without_profile_blocks() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = engine_in(&dir);
    engine.execute(&CommandKind::Bootstrap);
    capture_intent(&engine);
    write_sales_data(&dir);

    let outcome = engine.execute(&CommandKind::Analyze);
    assert_eq!(outcome.exit_code, 2);
    let plan = recovery_text(engine.layout());
    assert!(plan.contains("kie eda"), "plan: {plan}");
}

#[test]
fn dashboard_builds_enforce_the_node_floor() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = engine_with_env(
        &dir,
        StubEnvironment {
            node: Some("v16.4.0".to_string()),
            python: Some("Python 3.11.4".to_string()),
        },
    );
    engine.execute(&CommandKind::Bootstrap);
    capture_intent(&engine);
    write_sales_data(&dir);
    engine.execute(&CommandKind::Eda {
        file: None,
    });
    engine.execute(&CommandKind::Analyze);
    engine.execute(&CommandKind::Theme(Theme::Dark));

    let outcome = engine.execute(&CommandKind::Build(BuildTarget::Dashboard));
    assert_eq!(outcome.exit_code, 2);
    assert!(outcome.blocks.iter().any(|block| block.contains("below the required floor")));
}

#[test]
fn tampered_chart_configs_fail_standalone_validation() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = engine_in(&dir);
    engine.execute(&CommandKind::Bootstrap);
    capture_intent(&engine);
    write_sales_data(&dir);
    engine.execute(&CommandKind::Eda {
        file: None,
    });
    engine.execute(&CommandKind::Analyze);
    engine.execute(&CommandKind::Theme(Theme::Dark));
    let build = engine.execute(&CommandKind::Build(BuildTarget::Report));
    assert_eq!(build.exit_code, 0, "build: {}", build.summary);

    // Tamper: re-enable gridlines in the first chart config.
    let chart_path = fs::read_dir(engine.layout().charts_dir())
        .expect("charts")
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .find(|path| path.extension().is_some_and(|ext| ext == "json"))
        .expect("a chart file");
    let tampered = fs::read_to_string(&chart_path)
        .expect("read chart")
        .replace("\"gridLines\": false", "\"gridLines\": true");
    fs::write(&chart_path, tampered).expect("write tampered chart");

    let outcome = engine.execute(&CommandKind::Validate {
        mode: None,
    });
    assert_eq!(outcome.exit_code, 2);
    assert!(outcome.blocks.iter().any(|block| block.contains("gridLines")));
    let plan = recovery_text(engine.layout());
    assert!(plan.contains("kie build"), "plan: {plan}");
}

#[test]
fn synthetic_data_blocks_the_build() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = engine_in(&dir);
    engine.execute(&CommandKind::Bootstrap);
    capture_intent(&engine);
    let data_dir = dir.path().join("data");
    fs::create_dir_all(&data_dir).expect("data dir");
    fs::write(
        data_dir.join("clients.csv"),
        "Client,Revenue\nTest Corp,1000000\nTest Corp,2000000\nTest Corp,3000000\n",
    )
    .expect("write synthetic data");
    engine.execute(&CommandKind::Eda {
        file: None,
    });
    engine.execute(&CommandKind::Analyze);
    engine.execute(&CommandKind::Theme(Theme::Light));

    let outcome = engine.execute(&CommandKind::Build(BuildTarget::Presentation));
    assert_eq!(outcome.exit_code, 2);
    assert!(
        outcome.blocks.iter().any(|block| block.contains("synthetic data suspected")),
        "blocks: {:?}",
        outcome.blocks
    );
}

#[test]
fn corrupt_rails_state_blocks_and_repair_recovers() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = engine_in(&dir);
    engine.execute(&CommandKind::Bootstrap);
    capture_intent(&engine);
    write_sales_data(&dir);
    engine.execute(&CommandKind::Eda {
        file: None,
    });

    fs::write(engine.layout().rails_state_path(), "{ not json").expect("corrupt rails");

    let blocked = engine.execute(&CommandKind::Analyze);
    assert_eq!(blocked.exit_code, 2);
    let plan = recovery_text(engine.layout());
    assert!(plan.contains("kie spec --repair"), "plan: {plan}");

    let repaired = engine.execute(&CommandKind::Spec(kie_engine::SpecAction::Repair));
    assert_eq!(repaired.exit_code, 0, "repair: {}", repaired.summary);
    let rails = RailsStore::new(engine.layout().clone())
        .load()
        .expect("load")
        .expect("rails");
    assert_eq!(rails.current_stage, Stage::Eda);

    let analyze = engine.execute(&CommandKind::Analyze);
    assert!(analyze.exit_code == 0 || analyze.exit_code == 4, "analyze: {}", analyze.summary);
}

#[test]
fn empty_dataset_warns_on_eda_and_blocks_analyze() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = engine_in(&dir);
    engine.execute(&CommandKind::Bootstrap);
    capture_intent(&engine);
    let data_dir = dir.path().join("data");
    fs::create_dir_all(&data_dir).expect("data dir");
    fs::write(data_dir.join("empty.csv"), "region,revenue\n").expect("write empty data");

    let eda = engine.execute(&CommandKind::Eda {
        file: None,
    });
    assert_eq!(eda.exit_code, 4, "eda: {}", eda.summary);
    assert!(eda.warnings.iter().any(|warning| warning.contains("no rows")));

    let analyze = engine.execute(&CommandKind::Analyze);
    assert_eq!(analyze.exit_code, 2, "analyze: {}", analyze.summary);
    assert!(analyze.blocks.iter().any(|block| block.contains("no rows")));
}
