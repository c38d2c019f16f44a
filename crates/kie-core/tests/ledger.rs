// crates/kie-core/tests/ledger.rs
// ============================================================================
// Module: Evidence Ledger Tests
// Description: Validate append-only semantics and record round-trips.
// ============================================================================
//! ## Overview
//! Ensures the file ledger refuses to overwrite records, round-trips records
//! through YAML, scans the directory for listings, and selects the latest
//! record by timestamp.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use kie_core::EnvSnapshot;
use kie_core::EvidenceRecord;
use kie_core::GateDecision;
use kie_core::LedgerError;
use kie_core::LedgerStore;
use kie_core::RunId;
use kie_core::Stage;
use kie_core::Timestamp;
use kie_core::WorkspaceLayout;
use kie_core::runtime::FileLedger;

/// Builds a minimal record for a run.
fn record(run_id: &str, tick: u64, success: bool) -> EvidenceRecord {
    EvidenceRecord {
        run_id: RunId::new(run_id),
        timestamp: Timestamp::Logical(tick),
        command: "eda".to_string(),
        args: Vec::new(),
        stage_before: Stage::Spec,
        stage_after: if success { Stage::Eda } else { Stage::Spec },
        env: EnvSnapshot {
            python: None,
            node: None,
            os: "linux".to_string(),
        },
        inputs: Vec::new(),
        outputs: Vec::new(),
        invalid_outputs: Vec::new(),
        policies_applied: vec!["gate.workspace".to_string()],
        skills_executed: vec!["intelligence.load".to_string()],
        success,
        warnings: Vec::new(),
        blocks: Vec::new(),
    }
}

/// Creates a workspace layout over a temp directory.
fn workspace() -> (tempfile::TempDir, WorkspaceLayout) {
    let dir = tempfile::tempdir().expect("tempdir");
    let layout = WorkspaceLayout::new(dir.path());
    layout.ensure_skeleton().expect("skeleton");
    (dir, layout)
}

#[test]
fn records_round_trip_through_yaml() {
    let (_dir, layout) = workspace();
    let ledger = FileLedger::new(layout);
    let original = record("run-1", 1, true);
    ledger.append(&original).expect("append");
    let loaded = ledger.load(&RunId::new("run-1")).expect("load");
    assert_eq!(loaded, original);
}

#[test]
fn appending_twice_is_refused() {
    let (_dir, layout) = workspace();
    let ledger = FileLedger::new(layout);
    ledger.append(&record("run-1", 1, true)).expect("first append");
    let err = ledger.append(&record("run-1", 2, true)).expect_err("second append");
    assert!(matches!(err, LedgerError::AlreadyRecorded(_)));
}

#[test]
fn missing_records_mean_the_command_did_not_happen() {
    let (_dir, layout) = workspace();
    let ledger = FileLedger::new(layout);
    assert!(matches!(
        ledger.load(&RunId::new("ghost")),
        Err(LedgerError::NotFound(_))
    ));
}

#[test]
fn listing_scans_the_directory_sorted() {
    let (_dir, layout) = workspace();
    let ledger = FileLedger::new(layout);
    ledger.append(&record("run-b", 2, true)).expect("append b");
    ledger.append(&record("run-a", 1, true)).expect("append a");
    let runs = ledger.list().expect("list");
    assert_eq!(runs, vec![RunId::new("run-a"), RunId::new("run-b")]);
}

#[test]
fn latest_selects_by_timestamp() {
    let (_dir, layout) = workspace();
    let ledger = FileLedger::new(layout);
    ledger.append(&record("run-a", 1, true)).expect("append a");
    ledger.append(&record("run-b", 9, false)).expect("append b");
    ledger.append(&record("run-c", 5, true)).expect("append c");
    let latest = ledger.latest().expect("latest").expect("some record");
    assert_eq!(latest.run_id, RunId::new("run-b"));
    assert_eq!(latest.decision(), GateDecision::Allow);
}
