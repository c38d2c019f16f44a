// crates/kie-core/src/core/evidence.rs
// ============================================================================
// Module: Evidence Records
// Description: Append-only audit entries for every command execution.
// Purpose: Be the sole record of truth for what actually happened.
// Dependencies: crate::core::{artifact, gate, identifiers, stage, time}, serde
// ============================================================================

//! ## Overview
//! Every command execution writes exactly one evidence record keyed by a
//! fresh run identifier: inputs and outputs with SHA-256, stage before and
//! after, an environment snapshot, the policies applied, warnings, blocks,
//! and the success flag. Records are append-only and never mutated; a missing
//! record means the command did not happen. A claim of completion is valid
//! only if the record lists the relevant output artifact with a matching
//! hash.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::artifact::ArtifactRef;
use crate::core::gate::GateDecision;
use crate::core::identifiers::RunId;
use crate::core::stage::Stage;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Environment Snapshot
// ============================================================================

/// Toolchain and platform facts captured at command start.
///
/// # Invariants
/// - Values are observations, not requirements; gates interpret them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvSnapshot {
    /// Python version string, when a Python toolchain is present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub python: Option<String>,
    /// Node version string, when a Node toolchain is present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
    /// Operating system identifier.
    #[serde(default)]
    pub os: String,
}

// ============================================================================
// SECTION: Evidence Record
// ============================================================================

/// Single-command audit entry.
///
/// # Invariants
/// - Append-only; never mutated after the run completes.
/// - `outputs` digests match the files on disk at record time.
/// - `invalid_outputs` lists artifacts kept on disk but rejected by the
///   post-gate; they never satisfy preconditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceRecord {
    /// Run identifier minted for this command.
    pub run_id: RunId,
    /// Time the record was finalized.
    pub timestamp: Timestamp,
    /// Command verb executed.
    pub command: String,
    /// Command arguments as given.
    pub args: Vec<String>,
    /// Rails stage before execution.
    pub stage_before: Stage,
    /// Rails stage after execution.
    pub stage_after: Stage,
    /// Environment snapshot at command start.
    pub env: EnvSnapshot,
    /// Input artifacts hashed before execution.
    pub inputs: Vec<ArtifactRef>,
    /// Output artifacts hashed after execution.
    pub outputs: Vec<ArtifactRef>,
    /// Outputs kept on disk but marked invalid by the post-gate.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub invalid_outputs: Vec<ArtifactRef>,
    /// Identifiers of every gate policy evaluated for this run.
    pub policies_applied: Vec<String>,
    /// Skills executed during the run, in order.
    pub skills_executed: Vec<String>,
    /// True only when the command and post-gate both succeeded.
    pub success: bool,
    /// Warning messages surfaced during the run.
    pub warnings: Vec<String>,
    /// Block messages surfaced during the run.
    pub blocks: Vec<String>,
}

impl EvidenceRecord {
    /// Returns the gate decision implied by the recorded outcome.
    #[must_use]
    pub fn decision(&self) -> GateDecision {
        if !self.blocks.is_empty() {
            GateDecision::Block
        } else if self.warnings.is_empty() {
            GateDecision::Allow
        } else {
            GateDecision::Warn
        }
    }

    /// Returns true when the record lists `path` among its valid outputs.
    #[must_use]
    pub fn proves_output(&self, path: &str) -> bool {
        self.outputs.iter().any(|artifact| artifact.path == path)
    }
}
