// crates/kie-core/src/core/recovery.rs
// ============================================================================
// Module: Recovery Plans
// Description: Four-tier remediation documents emitted on WARN/BLOCK/FAIL.
// Purpose: Guarantee every failure comes with a concrete CLI path back.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! A recovery plan has four fixed tiers: (1) exact CLI commands that fix the
//! problem, (2) validation commands, (3) diagnostic commands, and (4) safe
//! escalation guidance. Tier-1 remediations must be CLI commands; the plan
//! never recommends manual state-file edits or deletion of project state.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Recovery plan construction errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum RecoveryError {
    /// Tier 1 was empty; a plan without a fix path is not a plan.
    #[error("recovery plan requires at least one tier-1 fix command")]
    EmptyFixTier,
    /// A tier-1 entry was not a CLI invocation.
    #[error("tier-1 remediation must be a CLI command, got: {0}")]
    NotACliCommand(String),
}

// ============================================================================
// SECTION: Escalation Guidance
// ============================================================================

/// Tier-4 escalation guidance.
///
/// # Invariants
/// - `never_share` always lists the engine-owned state files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationGuidance {
    /// Artifacts that are safe to share when escalating.
    pub share: Vec<String>,
    /// Artifacts that must never leave the workspace.
    pub never_share: Vec<String>,
}

impl Default for EscalationGuidance {
    fn default() -> Self {
        Self {
            share: vec![
                "project_state/trust_bundle.md".to_string(),
                "project_state/recovery_plan.md".to_string(),
            ],
            never_share: vec![
                "data/".to_string(),
                "project_state/evidence_ledger/".to_string(),
                "project_state/spec.yaml".to_string(),
            ],
        }
    }
}

// ============================================================================
// SECTION: Recovery Plan
// ============================================================================

/// Four-tier remediation document.
///
/// # Invariants
/// - `fix` is non-empty and contains only CLI invocations.
/// - The plan never recommends manual state-file edits or deletions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryPlan {
    /// One-line summary of what went wrong.
    pub summary: String,
    /// Proof-backed cause, citing the evidence record.
    pub cause: String,
    /// Tier 1: exact CLI commands that fix the problem.
    pub fix: Vec<String>,
    /// Tier 2: commands that validate the fix.
    pub validate: Vec<String>,
    /// Tier 3: diagnostic commands.
    pub diagnose: Vec<String>,
    /// Tier 4: safe escalation guidance.
    pub escalate: EscalationGuidance,
}

/// Substrings that mark a remediation as a manual edit rather than a command.
const FORBIDDEN_REMEDIATIONS: [&str; 4] = ["rm ", "edit ", "delete ", "vi "];

impl RecoveryPlan {
    /// Creates a plan, enforcing the tier-1 CLI-command invariant.
    ///
    /// # Errors
    ///
    /// Returns [`RecoveryError`] when tier 1 is empty or contains an entry
    /// that is not a `kie` CLI invocation.
    pub fn new(
        summary: impl Into<String>,
        cause: impl Into<String>,
        fix: Vec<String>,
        validate: Vec<String>,
        diagnose: Vec<String>,
    ) -> Result<Self, RecoveryError> {
        if fix.is_empty() {
            return Err(RecoveryError::EmptyFixTier);
        }
        for entry in &fix {
            let lowered = entry.to_ascii_lowercase();
            let manual = FORBIDDEN_REMEDIATIONS
                .iter()
                .any(|forbidden| lowered.starts_with(forbidden));
            if manual || !lowered.starts_with("kie") {
                return Err(RecoveryError::NotACliCommand(entry.clone()));
            }
        }
        Ok(Self {
            summary: summary.into(),
            cause: cause.into(),
            fix,
            validate,
            diagnose,
            escalate: EscalationGuidance::default(),
        })
    }

    /// Renders the plan as markdown.
    #[must_use]
    pub fn render_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str("# Recovery Plan\n\n");
        out.push_str(&format!("**Summary:** {}\n\n", self.summary));
        out.push_str(&format!("**Cause:** {}\n\n", self.cause));
        out.push_str("## Tier 1 — Fix\n\n");
        for entry in &self.fix {
            out.push_str(&format!("- `{entry}`\n"));
        }
        out.push_str("\n## Tier 2 — Validate\n\n");
        if self.validate.is_empty() {
            out.push_str("- `kie status`\n");
        } else {
            for entry in &self.validate {
                out.push_str(&format!("- `{entry}`\n"));
            }
        }
        out.push_str("\n## Tier 3 — Diagnose\n\n");
        if self.diagnose.is_empty() {
            out.push_str("- `kie doctor`\n");
        } else {
            for entry in &self.diagnose {
                out.push_str(&format!("- `{entry}`\n"));
            }
        }
        out.push_str("\n## Tier 4 — Escalate\n\n");
        out.push_str("Safe to share:\n");
        for entry in &self.escalate.share {
            out.push_str(&format!("- `{entry}`\n"));
        }
        out.push_str("\nNever share:\n");
        for entry in &self.escalate.never_share {
            out.push_str(&format!("- `{entry}`\n"));
        }
        out
    }
}
