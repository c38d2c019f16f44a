// crates/kie-engine/tests/engine_flow.rs
// ============================================================================
// Module: Engine Flow Tests
// Description: Walk the rails end to end through the dispatcher.
// ============================================================================
//! ## Overview
//! Ensures the full chain (bootstrap → interview → eda → analyze → build →
//! preview) succeeds over realistic data, that evidence and trust bundles
//! land after every command, that `go` executes exactly one step at a time,
//! and that repeated analysis is byte-identical.

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

use common::capture_intent;
use common::engine_in;
use common::write_sales_data;
use kie_core::Stage;
use kie_core::Theme;
use kie_core::WorkspaceLayout;
use kie_core::runtime::RailsStore;
use kie_engine::CommandKind;

/// Loads the rails state for assertions.
fn rails_state(layout: &WorkspaceLayout) -> kie_core::RailsState {
    RailsStore::new(layout.clone())
        .load()
        .expect("load rails")
        .expect("rails present")
}

#[test]
fn the_full_chain_walks_every_stage() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = engine_in(&dir);

    assert_eq!(engine.execute(&CommandKind::Bootstrap).exit_code, 0);
    capture_intent(&engine);
    write_sales_data(&dir);

    let eda = engine.execute(&CommandKind::Eda {
        file: None,
    });
    assert_eq!(eda.exit_code, 0, "eda: {}", eda.summary);
    assert!(engine.layout().eda_profile_json_path().is_file());
    assert!(engine.layout().eda_profile_yaml_path().is_file());

    let analyze = engine.execute(&CommandKind::Analyze);
    assert!(
        analyze.exit_code == 0 || analyze.exit_code == 4,
        "analyze: {}",
        analyze.summary
    );
    assert!(engine.layout().column_mapping_path().is_file());
    assert!(engine.layout().raw_insights_path().is_file());
    assert!(engine.layout().visualization_plan_path().is_file());

    assert_eq!(engine.execute(&CommandKind::Theme(Theme::Dark)).exit_code, 0);

    let build = engine.execute(&CommandKind::Build(kie_core::BuildTarget::Report));
    assert_eq!(build.exit_code, 0, "build: {} / {:?}", build.summary, build.blocks);
    let charts: Vec<_> = fs::read_dir(engine.layout().charts_dir())
        .expect("charts dir")
        .collect();
    assert!(!charts.is_empty(), "no charts were built");
    assert!(dir.path().join("exports/report/manifest.json").is_file());

    let preview = engine.execute(&CommandKind::Preview);
    assert_eq!(preview.exit_code, 0, "preview: {}", preview.summary);

    let rails = rails_state(engine.layout());
    assert_eq!(rails.current_stage, Stage::Preview);
    assert_eq!(rails.completed_stages.len(), 6);
}

#[test]
fn every_command_leaves_evidence_and_a_trust_bundle() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = engine_in(&dir);
    engine.execute(&CommandKind::Bootstrap);
    capture_intent(&engine);

    let ledger_dir = engine.layout().ledger_dir();
    let records: Vec<_> = fs::read_dir(&ledger_dir).expect("ledger dir").collect();
    assert!(records.len() >= 2, "expected records for bootstrap and interview");

    let bundle: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(engine.layout().trust_bundle_json_path()).expect("bundle json"),
    )
    .expect("bundle parses");
    let next_actions = bundle["next_actions"].as_array().expect("next actions");
    assert!(!next_actions.is_empty(), "next actions must never be empty");
    assert!(engine.layout().trust_bundle_md_path().is_file());
}

#[test]
fn successful_runs_record_matching_output_hashes() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = engine_in(&dir);
    engine.execute(&CommandKind::Bootstrap);
    capture_intent(&engine);
    write_sales_data(&dir);
    let outcome = engine.execute(&CommandKind::Eda {
        file: None,
    });
    let run_id = outcome.run_id.expect("run id");

    let record_path = engine
        .layout()
        .ledger_dir()
        .join(format!("{}.yaml", run_id.as_str()));
    let record: kie_core::EvidenceRecord =
        serde_yaml::from_str(&fs::read_to_string(record_path).expect("record"))
            .expect("record parses");
    assert!(record.success);
    assert!(record.proves_output("outputs/eda_profile.json"));
    for artifact in &record.outputs {
        assert!(artifact.matches_disk(dir.path()), "hash mismatch for {}", artifact.path);
    }
}

#[test]
fn analyzing_twice_is_byte_identical() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = engine_in(&dir);
    engine.execute(&CommandKind::Bootstrap);
    capture_intent(&engine);
    write_sales_data(&dir);
    engine.execute(&CommandKind::Eda {
        file: None,
    });

    let first = engine.execute(&CommandKind::Analyze);
    assert!(first.exit_code == 0 || first.exit_code == 4);
    let first_bytes = fs::read(engine.layout().visualization_plan_path()).expect("first plan");

    let second = engine.execute(&CommandKind::Analyze);
    assert!(second.exit_code == 0 || second.exit_code == 4);
    let second_bytes = fs::read(engine.layout().visualization_plan_path()).expect("second plan");

    assert_eq!(first_bytes, second_bytes, "repeated analysis must be byte-identical");
}

#[test]
fn go_executes_exactly_one_step() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = engine_in(&dir);
    engine.execute(&CommandKind::Bootstrap);
    capture_intent(&engine);
    write_sales_data(&dir);
    engine.execute(&CommandKind::Eda {
        file: None,
    });
    engine.execute(&CommandKind::Theme(Theme::Dark));

    // Stage is eda-complete: one `go` runs analyze only.
    let first = engine.execute(&CommandKind::Go {
        full: false,
        showcase: false,
    });
    assert!(first.summary.contains("analyze"), "summary: {}", first.summary);
    assert_eq!(rails_state(engine.layout()).current_stage, Stage::Analyze);

    // The next `go` runs build only.
    let second = engine.execute(&CommandKind::Go {
        full: false,
        showcase: false,
    });
    assert!(second.summary.contains("build"), "summary: {}", second.summary);
    assert_eq!(rails_state(engine.layout()).current_stage, Stage::Build);
}

#[test]
fn go_full_chains_to_the_end() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = engine_in(&dir);
    engine.execute(&CommandKind::Bootstrap);
    capture_intent(&engine);
    write_sales_data(&dir);
    engine.execute(&CommandKind::Theme(Theme::Dark));

    let outcome = engine.execute(&CommandKind::Go {
        full: true,
        showcase: false,
    });
    assert!(
        outcome.exit_code == 0 || outcome.exit_code == 4,
        "go --full: {} / {:?}",
        outcome.summary,
        outcome.blocks
    );
    assert_eq!(rails_state(engine.layout()).current_stage, Stage::Preview);
}

#[test]
fn showcase_never_mutates_rails_state() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = engine_in(&dir);
    engine.execute(&CommandKind::Bootstrap);
    let before = rails_state(engine.layout());

    let outcome = engine.execute(&CommandKind::Go {
        full: false,
        showcase: true,
    });
    assert_eq!(outcome.exit_code, 0);
    assert!(!outcome.info_lines.is_empty());
    assert_eq!(rails_state(engine.layout()), before);
}
