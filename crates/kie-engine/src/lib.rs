// crates/kie-engine/src/lib.rs
// ============================================================================
// Module: KIE Engine Library
// Description: Command model, gates, handlers, builder, and the dispatcher.
// Purpose: Orchestrate every command through the gated, evidence-backed flow.
// Dependencies: kie-brand, kie-config, kie-core, kie-intelligence, serde,
// serde_json, thiserror, tracing
// ============================================================================

//! ## Overview
//! `kie-engine` wires the subsystems together: the pre-gate evaluates the
//! invariant table, stage handlers do the work (invoking intelligence skills
//! and the brand validator), the post-gate verifies artifacts and
//! compliance, and the dispatcher owns the single mutation surface for rails
//! state, the spec file, evidence records, trust bundles, and recovery
//! plans.

/// Plan-driven chart building and export manifests.
pub mod builder;
/// The closed command vocabulary.
pub mod commands;
/// Pre- and post-command policy checks.
pub mod gates;
/// Per-command handler logic.
pub mod handlers;
/// Host clock and environment probing.
pub mod probe;

/// The command dispatcher.
mod engine;

pub use builder::BuildError;
pub use builder::ExportManifest;
pub use builder::build_charts;
pub use builder::execute_slice;
pub use commands::CommandKind;
pub use commands::InterviewInput;
pub use commands::SpecAction;
pub use engine::Engine;
pub use engine::EngineOutcome;
pub use engine::NextStep;
pub use engine::OutcomeStatus;
pub use gates::PreGateInput;
pub use gates::post_gate;
pub use gates::pre_gate;
pub use probe::EnvironmentProbe;
pub use probe::SystemClock;
pub use probe::major_version;
