// crates/kie-core/src/core/trust.rs
// ============================================================================
// Module: Trust Bundle
// Description: Consultant-facing summary derived from the latest evidence record.
// Purpose: Communicate status with proof, never with bare claims.
// Dependencies: crate::core::{artifact, evidence, stage}, serde
// ============================================================================

//! ## Overview
//! The trust bundle is regenerated after every command from the evidence
//! record. It carries nine sections: identity, stage, executed, artifacts,
//! skills, warnings, blocks, missing, and next actions. The next-actions list
//! is non-empty by construction, and every artifact hash matches the file on
//! disk at render time.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::artifact::ArtifactRef;
use crate::core::stage::Stage;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Sections
// ============================================================================

/// Project identity presented at the top of the bundle.
///
/// # Invariants
/// - Mirrors the user-owned spec; the bundle never invents identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustIdentity {
    /// Project name from the spec.
    pub project_name: String,
    /// Client name, when the spec declares one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
    /// Objective from the spec.
    pub objective: String,
    /// Project type wire form.
    pub project_type: String,
}

/// Rails position section.
///
/// # Invariants
/// - `completed` is in rails order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustStage {
    /// Current rails position.
    pub current: Stage,
    /// Completed stages in rails order.
    pub completed: Vec<Stage>,
}

/// Executed-command section.
///
/// # Invariants
/// - Mirrors the evidence record; never edited independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustExecuted {
    /// Command verb.
    pub command: String,
    /// Arguments as given.
    pub args: Vec<String>,
    /// Success flag from the evidence record.
    pub success: bool,
    /// Completion time.
    pub timestamp: Timestamp,
}

// ============================================================================
// SECTION: Trust Bundle
// ============================================================================

/// Latest-run consultant-facing summary.
///
/// # Invariants
/// - `next_actions` is never empty.
/// - `artifacts` digests match the evidence record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustBundle {
    /// Project identity.
    pub identity: TrustIdentity,
    /// Rails position.
    pub stage: TrustStage,
    /// Last executed command.
    pub executed: TrustExecuted,
    /// Artifacts produced by the last run, with hashes.
    pub artifacts: Vec<ArtifactRef>,
    /// Skills executed by the last run, in order.
    pub skills: Vec<String>,
    /// Warnings surfaced by the last run.
    pub warnings: Vec<String>,
    /// Blocks surfaced by the last run.
    pub blocks: Vec<String>,
    /// What is still missing for the next stage.
    pub missing: Vec<String>,
    /// Concrete next CLI actions; never empty.
    pub next_actions: Vec<String>,
}

impl TrustBundle {
    /// Creates a bundle, guaranteeing a non-empty next-actions list.
    #[must_use]
    #[allow(clippy::too_many_arguments, reason = "The nine sections are fixed by contract.")]
    pub fn new(
        identity: TrustIdentity,
        stage: TrustStage,
        executed: TrustExecuted,
        artifacts: Vec<ArtifactRef>,
        skills: Vec<String>,
        warnings: Vec<String>,
        blocks: Vec<String>,
        missing: Vec<String>,
        mut next_actions: Vec<String>,
    ) -> Self {
        if next_actions.is_empty() {
            next_actions.push("kie status".to_string());
        }
        Self {
            identity,
            stage,
            executed,
            artifacts,
            skills,
            warnings,
            blocks,
            missing,
            next_actions,
        }
    }

    /// Renders the bundle as consultant-facing markdown.
    #[must_use]
    pub fn render_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str("# Trust Bundle\n\n");
        out.push_str("## Identity\n\n");
        out.push_str(&format!("- Project: {}\n", self.identity.project_name));
        if let Some(client) = &self.identity.client {
            out.push_str(&format!("- Client: {client}\n"));
        }
        out.push_str(&format!("- Objective: {}\n", self.identity.objective));
        out.push_str(&format!("- Type: {}\n\n", self.identity.project_type));

        out.push_str("## Stage\n\n");
        out.push_str(&format!("- Current: {}\n", self.stage.current));
        let completed: Vec<&str> =
            self.stage.completed.iter().map(|stage| stage.as_str()).collect();
        out.push_str(&format!("- Completed: {}\n\n", completed.join(" → ")));

        out.push_str("## Executed\n\n");
        let status = if self.executed.success { "ok" } else { "failed" };
        out.push_str(&format!(
            "- `{} {}` ({status})\n\n",
            self.executed.command,
            self.executed.args.join(" ")
        ));

        out.push_str("## Artifacts\n\n");
        if self.artifacts.is_empty() {
            out.push_str("- none\n\n");
        } else {
            for artifact in &self.artifacts {
                out.push_str(&format!("- `{}` {}\n", artifact.path, artifact.sha256));
            }
            out.push('\n');
        }

        out.push_str("## Skills\n\n");
        if self.skills.is_empty() {
            out.push_str("- none\n\n");
        } else {
            for skill in &self.skills {
                out.push_str(&format!("- {skill}\n"));
            }
            out.push('\n');
        }

        out.push_str("## Warnings\n\n");
        if self.warnings.is_empty() {
            out.push_str("- none\n\n");
        } else {
            for warning in &self.warnings {
                out.push_str(&format!("- {warning}\n"));
            }
            out.push('\n');
        }

        out.push_str("## Blocks\n\n");
        if self.blocks.is_empty() {
            out.push_str("- none\n\n");
        } else {
            for block in &self.blocks {
                out.push_str(&format!("- {block}\n"));
            }
            out.push('\n');
        }

        out.push_str("## Missing\n\n");
        if self.missing.is_empty() {
            out.push_str("- nothing; the next stage is unblocked\n\n");
        } else {
            for item in &self.missing {
                out.push_str(&format!("- {item}\n"));
            }
            out.push('\n');
        }

        out.push_str("## Next Actions\n\n");
        for action in &self.next_actions {
            out.push_str(&format!("- `{action}`\n"));
        }
        out
    }
}
