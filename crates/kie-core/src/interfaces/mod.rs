// crates/kie-core/src/interfaces/mod.rs
// ============================================================================
// Module: KIE Interfaces
// Description: Backend-agnostic interfaces for skills, storage, time, and probes.
// Purpose: Define the contract surfaces used by the engine dispatcher.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Interfaces define how the engine composes with skills and host facilities
//! without embedding backend-specific details. Implementations must be
//! deterministic and fail closed on missing or invalid data. Skills are
//! bounded, stage-scoped capabilities: they produce artifacts and evidence
//! but never mutate workflow state.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::artifact::ArtifactRef;
use crate::core::evidence::EnvSnapshot;
use crate::core::evidence::EvidenceRecord;
use crate::core::identifiers::RunId;
use crate::core::spec::ProjectSpec;
use crate::core::stage::Stage;
use crate::core::time::Timestamp;
use crate::core::workspace::WorkspaceLayout;

// ============================================================================
// SECTION: Skill
// ============================================================================

/// Context handed to a skill for one execution.
///
/// # Invariants
/// - Values are snapshots; skills must not mutate them.
/// - The spec is user-owned; skills only read it.
#[derive(Debug, Clone, Copy)]
pub struct SkillContext<'a> {
    /// Workspace the skill operates within.
    pub workspace: &'a WorkspaceLayout,
    /// User-owned project spec.
    pub spec: &'a ProjectSpec,
}

/// Result of a successful skill execution.
///
/// # Invariants
/// - Every artifact listed exists on disk with a matching digest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkillOutcome {
    /// Artifacts produced, with digests declared by the skill.
    pub artifacts: Vec<ArtifactRef>,
    /// Advisory warnings surfaced during execution.
    pub warnings: Vec<String>,
}

/// Skill execution errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum SkillError {
    /// A required input artifact or file is missing.
    #[error("missing input: {0}")]
    MissingInput(String),
    /// Input data was present but unusable.
    #[error("invalid data: {0}")]
    InvalidData(String),
    /// A filesystem operation failed.
    #[error("io error at {path}: {source}")]
    Io {
        /// Path involved in the failed operation.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// The skill refused to produce an artifact (policy outcome).
    #[error("blocked: {0}")]
    Blocked(String),
    /// Serialization of a produced artifact failed.
    #[error("serialization failed: {0}")]
    Serialize(String),
}

/// Bounded, stage-scoped capability.
///
/// Skills produce artifacts with declared hashes and evidence; they never
/// mutate rails state. Implementations must be deterministic for identical
/// inputs so repeated runs yield identical artifact digests.
pub trait Skill {
    /// Stable skill name recorded in evidence.
    fn name(&self) -> &'static str;

    /// Stage the skill is scoped to.
    fn stage(&self) -> Stage;

    /// Returns descriptions of unmet preconditions (empty when runnable).
    fn preconditions(&self, ctx: &SkillContext<'_>) -> Vec<String>;

    /// Workspace-relative paths the skill intends to produce.
    fn declared_outputs(&self, ctx: &SkillContext<'_>) -> Vec<String>;

    /// Executes the skill.
    ///
    /// # Errors
    ///
    /// Returns [`SkillError`] when inputs are missing or unusable; the
    /// dispatcher converts errors into gate outcomes.
    fn run(&self, ctx: &SkillContext<'_>) -> Result<SkillOutcome, SkillError>;
}

// ============================================================================
// SECTION: Ledger Store
// ============================================================================

/// Evidence ledger storage errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A record for the run already exists; the ledger is append-only.
    #[error("evidence record for run {0} already exists")]
    AlreadyRecorded(RunId),
    /// The requested record does not exist.
    #[error("no evidence record for run {0}")]
    NotFound(RunId),
    /// A stored record could not be parsed.
    #[error("corrupt evidence record at {path}: {detail}")]
    Corrupt {
        /// Path of the corrupt record.
        path: String,
        /// Parse failure detail.
        detail: String,
    },
    /// A filesystem operation failed.
    #[error("ledger io error at {path}: {source}")]
    Io {
        /// Path involved in the failed operation.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Append-only evidence record store.
pub trait LedgerStore {
    /// Appends a finalized record; refuses to overwrite.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] when the record exists or cannot be written.
    fn append(&self, record: &EvidenceRecord) -> Result<(), LedgerError>;

    /// Loads the record for a run.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] when no record exists.
    fn load(&self, run_id: &RunId) -> Result<EvidenceRecord, LedgerError>;

    /// Lists all recorded run identifiers, sorted lexicographically.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] when the ledger directory cannot be scanned.
    fn list(&self) -> Result<Vec<RunId>, LedgerError>;

    /// Returns the most recent record by timestamp, when any exist.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] when records cannot be read.
    fn latest(&self) -> Result<Option<EvidenceRecord>, LedgerError>;
}

// ============================================================================
// SECTION: Host Facilities
// ============================================================================

/// Time source supplied by the host; core code never reads wall-clock time.
pub trait Clock {
    /// Returns the current timestamp.
    fn now(&self) -> Timestamp;
}

/// Environment prober supplying toolchain and platform facts.
pub trait EnvironmentInspector {
    /// Captures an environment snapshot.
    fn probe(&self) -> EnvSnapshot;
}
