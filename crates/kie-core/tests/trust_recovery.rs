// crates/kie-core/tests/trust_recovery.rs
// ============================================================================
// Module: Trust Bundle and Recovery Plan Tests
// Description: Validate the non-empty next-actions and CLI-only-fix invariants.
// ============================================================================
//! ## Overview
//! Ensures the trust bundle never renders without next actions and that
//! recovery plans refuse manual-edit remediations in their fix tier.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use kie_core::RecoveryError;
use kie_core::RecoveryPlan;
use kie_core::Stage;
use kie_core::Timestamp;
use kie_core::TrustBundle;
use kie_core::TrustExecuted;
use kie_core::TrustIdentity;
use kie_core::TrustStage;

/// Builds a bundle with the given next actions.
fn bundle(next_actions: Vec<String>) -> TrustBundle {
    TrustBundle::new(
        TrustIdentity {
            project_name: "margin-study".to_string(),
            client: None,
            objective: "grow revenue".to_string(),
            project_type: "analytics".to_string(),
        },
        TrustStage {
            current: Stage::Eda,
            completed: vec![Stage::Startkie, Stage::Spec, Stage::Eda],
        },
        TrustExecuted {
            command: "eda".to_string(),
            args: Vec::new(),
            success: true,
            timestamp: Timestamp::Logical(3),
        },
        Vec::new(),
        vec!["intelligence.load".to_string()],
        Vec::new(),
        Vec::new(),
        Vec::new(),
        next_actions,
    )
}

#[test]
fn next_actions_are_never_empty() {
    let empty = bundle(Vec::new());
    assert_eq!(empty.next_actions, vec!["kie status".to_string()]);

    let explicit = bundle(vec!["kie analyze".to_string()]);
    assert_eq!(explicit.next_actions, vec!["kie analyze".to_string()]);
}

#[test]
fn markdown_render_carries_all_nine_sections() {
    let rendered = bundle(vec!["kie analyze".to_string()]).render_markdown();
    for heading in [
        "## Identity",
        "## Stage",
        "## Executed",
        "## Artifacts",
        "## Skills",
        "## Warnings",
        "## Blocks",
        "## Missing",
        "## Next Actions",
    ] {
        assert!(rendered.contains(heading), "missing {heading}");
    }
}

#[test]
fn recovery_requires_a_fix_tier() {
    let err = RecoveryPlan::new("blocked", "cause", Vec::new(), Vec::new(), Vec::new())
        .expect_err("empty fix tier");
    assert!(matches!(err, RecoveryError::EmptyFixTier));
}

#[test]
fn recovery_rejects_manual_edits() {
    for bad in ["rm project_state/rails_state.json", "edit spec.yaml", "vi spec.yaml"] {
        let err = RecoveryPlan::new(
            "blocked",
            "cause",
            vec![bad.to_string()],
            Vec::new(),
            Vec::new(),
        )
        .expect_err("manual remediation");
        assert!(matches!(err, RecoveryError::NotACliCommand(_)));
    }
}

#[test]
fn recovery_accepts_cli_fixes_and_renders_tiers() {
    let plan = RecoveryPlan::new(
        "theme is not set",
        "evidence record run-1 lists the blocking policy",
        vec!["kie theme dark".to_string()],
        vec!["kie status".to_string()],
        vec!["kie doctor".to_string()],
    )
    .expect("valid plan");
    let rendered = plan.render_markdown();
    assert!(rendered.contains("## Tier 1 — Fix"));
    assert!(rendered.contains("kie theme dark"));
    assert!(rendered.contains("## Tier 4 — Escalate"));
    assert!(rendered.contains("Never share"));
}
