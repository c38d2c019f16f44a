// crates/kie-core/src/lib.rs
// ============================================================================
// Module: KIE Core Library
// Description: Canonical types and invariants for the Kearney Insight Engine.
// Purpose: Provide the data model, interfaces, and runtime stores shared by
// every other crate in the workspace.
// Dependencies: serde, serde_jcs, serde_json, serde_yaml, sha2, thiserror, uuid
// ============================================================================

//! ## Overview
//! `kie-core` defines the engine's contract: no claim without proof, no
//! progression without evidence, no output without compliance. It contains
//! the rails stage machine, gate decision model, evidence records, trust
//! bundle, recovery plans, the user-owned spec, content-addressed artifact
//! references, and the interfaces every skill implements. All state changes
//! are deterministic and fail closed.

/// Canonical data model.
pub mod core;
/// Contract surfaces for skills, storage, time, and environment probes.
pub mod interfaces;
/// File-backed storage implementations.
pub mod runtime;

pub use crate::core::artifact::ArtifactRef;
pub use crate::core::evidence::EnvSnapshot;
pub use crate::core::evidence::EvidenceRecord;
pub use crate::core::gate::GateDecision;
pub use crate::core::gate::GateFinding;
pub use crate::core::gate::GateReport;
pub use crate::core::hashing;
pub use crate::core::hashing::DEFAULT_HASH_ALGORITHM;
pub use crate::core::hashing::HashAlgorithm;
pub use crate::core::hashing::HashDigest;
pub use crate::core::hashing::HashError;
pub use crate::core::identifiers::InsightId;
pub use crate::core::identifiers::PlanItemId;
pub use crate::core::identifiers::RunId;
pub use crate::core::rails::RailsError;
pub use crate::core::rails::RailsState;
pub use crate::core::recovery::EscalationGuidance;
pub use crate::core::recovery::RecoveryError;
pub use crate::core::recovery::RecoveryPlan;
pub use crate::core::roles::ALL_ROLES;
pub use crate::core::roles::SemanticRole;
pub use crate::core::spec::ProjectSpec;
pub use crate::core::spec::ProjectType;
pub use crate::core::spec::SpecError;
pub use crate::core::spec::Theme;
pub use crate::core::stage::BuildTarget;
pub use crate::core::stage::STAGE_ORDER;
pub use crate::core::stage::Stage;
pub use crate::core::time::Timestamp;
pub use crate::core::trust::TrustBundle;
pub use crate::core::trust::TrustExecuted;
pub use crate::core::trust::TrustIdentity;
pub use crate::core::trust::TrustStage;
pub use crate::core::workspace::WORKSPACE_MARKER;
pub use crate::core::workspace::WorkspaceError;
pub use crate::core::workspace::WorkspaceLayout;
pub use crate::core::workspace::atomic_write;
pub use crate::interfaces::Clock;
pub use crate::interfaces::EnvironmentInspector;
pub use crate::interfaces::LedgerError;
pub use crate::interfaces::LedgerStore;
pub use crate::interfaces::Skill;
pub use crate::interfaces::SkillContext;
pub use crate::interfaces::SkillError;
pub use crate::interfaces::SkillOutcome;
