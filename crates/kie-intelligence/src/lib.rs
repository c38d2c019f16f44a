// crates/kie-intelligence/src/lib.rs
// ============================================================================
// Module: KIE Intelligence Library
// Description: The data-understanding pipeline: load, map, analyze, triage, plan.
// Purpose: Turn tabular data and a natural-language objective into a ranked,
// de-duplicated visualization plan.
// Dependencies: calamine, csv, kie-config, kie-core, parquet, serde, serde_json,
// serde_yaml, thiserror, time, tracing
// ============================================================================

//! ## Overview
//! `kie-intelligence` hosts the five stage-scoped skills of the pipeline.
//! Each skill is deterministic, cites its sources, and produces artifacts
//! with declared hashes; none of them mutates workflow state. The semantic
//! column mapper is the central judgment algorithm: four tiers, explainable
//! output, absolute override precedence.

/// Raw-insight generation across the fixed kind set.
pub mod analyzer;
/// Dataset schema and quality summary.
pub mod eda;
/// Curated keyword and synonym sets per role.
pub mod lexicon;
/// CSV/Excel/Parquet/JSON readers with type inference.
pub mod loader;
/// Four-tier semantic role assignment.
pub mod mapper;
/// Chart-intent planning rubric.
pub mod planner;
/// Stage-scoped skill implementations and registry.
pub mod skills;
/// In-memory typed table and statistics.
pub mod table;
/// Dedup, suppression, entailment merging, and priority.
pub mod triage;

pub use analyzer::AnalyzeError;
pub use analyzer::InsightKind;
pub use analyzer::RawInsight;
pub use eda::EdaProfile;
pub use lexicon::RoleLexicon;
pub use loader::DataFormat;
pub use loader::LoadError;
pub use loader::detect_format;
pub use loader::load_table;
pub use mapper::ColumnMapping;
pub use mapper::MappingTier;
pub use mapper::RoleAssignment;
pub use mapper::map_columns;
pub use planner::ChartKind;
pub use planner::DataSliceSpec;
pub use planner::PlanItem;
pub use planner::VisualizationPlan;
pub use planner::plan;
pub use skills::SkillRegistry;
pub use table::CellValue;
pub use table::Column;
pub use table::ColumnType;
pub use table::DataTable;
pub use triage::InsightCatalog;
pub use triage::TriageEntry;
pub use triage::TriageStatus;
pub use triage::triage;
