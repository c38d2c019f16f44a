// crates/kie-core/tests/rails.rs
// ============================================================================
// Module: Rails State Tests
// Description: Validate conditional stage transitions and reset semantics.
// ============================================================================
//! ## Overview
//! Ensures the rails advance only on successful commands for the immediate
//! next stage, never regress without an explicit reset, and keep artifact
//! pointers consistent across resets.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use kie_core::ArtifactRef;
use kie_core::BuildTarget;
use kie_core::HashAlgorithm;
use kie_core::HashDigest;
use kie_core::RailsError;
use kie_core::RailsState;
use kie_core::STAGE_ORDER;
use kie_core::Stage;
use kie_core::Timestamp;

/// Logical timestamp helper.
const fn at(tick: u64) -> Timestamp {
    Timestamp::Logical(tick)
}

/// Synthetic artifact reference.
fn artifact(path: &str) -> ArtifactRef {
    ArtifactRef::new(path, HashDigest::new(HashAlgorithm::Sha256, "00".repeat(32)))
}

#[test]
fn fresh_state_sits_at_startkie() {
    let state = RailsState::new(at(0));
    assert_eq!(state.current_stage, Stage::Startkie);
    assert_eq!(state.completed_stages, vec![Stage::Startkie]);
    assert_eq!(state.next_stage(), Some(Stage::Spec));
}

#[test]
fn stages_advance_in_order_only() {
    let mut state = RailsState::new(at(0));
    let err = state
        .attempt_transition(Stage::Eda, Vec::new(), true, at(1))
        .expect_err("eda must not follow startkie directly");
    assert!(matches!(
        err,
        RailsError::NotNextStage {
            target: Stage::Eda,
            expected: Stage::Spec,
        }
    ));
    assert_eq!(state.current_stage, Stage::Startkie);

    state.attempt_transition(Stage::Spec, Vec::new(), true, at(2)).expect("spec follows");
    assert_eq!(state.current_stage, Stage::Spec);
}

#[test]
fn failed_commands_never_advance() {
    let mut state = RailsState::new(at(0));
    let err = state
        .attempt_transition(Stage::Spec, Vec::new(), false, at(1))
        .expect_err("failure must not advance");
    assert!(matches!(err, RailsError::CommandFailed(Stage::Spec)));
    assert_eq!(state.current_stage, Stage::Startkie);
    assert_eq!(state.updated_at, at(0));
}

#[test]
fn rerunning_a_completed_stage_recomputes_artifacts() {
    let mut state = RailsState::new(at(0));
    state.attempt_transition(Stage::Spec, Vec::new(), true, at(1)).expect("spec");
    state
        .attempt_transition(Stage::Eda, vec![artifact("outputs/eda_profile.json")], true, at(2))
        .expect("eda");

    state
        .attempt_transition(Stage::Eda, vec![artifact("outputs/eda_profile.yaml")], true, at(3))
        .expect("eda rerun");
    assert_eq!(state.current_stage, Stage::Eda);
    assert_eq!(state.stage_artifacts(Stage::Eda).len(), 1);
    assert_eq!(state.stage_artifacts(Stage::Eda)[0].path, "outputs/eda_profile.yaml");
}

#[test]
fn reset_discards_later_stages_and_sub_goals() {
    let mut state = RailsState::new(at(0));
    for (tick, stage) in STAGE_ORDER.iter().skip(1).enumerate() {
        state
            .attempt_transition(*stage, Vec::new(), true, at(tick as u64 + 1))
            .expect("walk the rails");
    }
    state.record_sub_goal(BuildTarget::Dashboard, at(10));
    assert_eq!(state.current_stage, Stage::Preview);

    state.reset_to(Stage::Eda, at(11));
    assert_eq!(state.current_stage, Stage::Eda);
    assert_eq!(
        state.completed_stages,
        vec![Stage::Startkie, Stage::Spec, Stage::Eda]
    );
    assert!(state.sub_goals.is_empty());
    assert!(state.stage_artifacts(Stage::Build).is_empty());
}

#[test]
fn full_walk_completes_every_stage() {
    let mut state = RailsState::new(at(0));
    for (tick, stage) in STAGE_ORDER.iter().skip(1).enumerate() {
        state
            .attempt_transition(*stage, Vec::new(), true, at(tick as u64 + 1))
            .expect("walk the rails");
    }
    assert_eq!(state.next_stage(), None);
    assert_eq!(state.completed_stages.len(), STAGE_ORDER.len());
}
