// crates/kie-intelligence/src/skills.rs
// ============================================================================
// Module: Intelligence Skills
// Description: Stage-scoped skills: load, map, analyze, triage, plan.
// Purpose: Register the pipeline as bounded capabilities the dispatcher runs.
// Dependencies: crate::{analyzer, eda, lexicon, loader, mapper, planner, triage},
// kie-config, kie-core, serde_json, serde_yaml
// ============================================================================

//! ## Overview
//! The five pipeline stages are values implementing the core
//! [`Skill`](kie_core::Skill) interface, composed through a registry keyed by
//! stage. Skills read their inputs from workspace artifacts, write their
//! outputs atomically with declared hashes, and never mutate rails state.
//! Deterministic skills (all five) produce byte-identical artifacts for
//! unchanged inputs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use kie_config::EngineConfig;
use kie_core::ArtifactRef;
use kie_core::Skill;
use kie_core::SkillContext;
use kie_core::SkillError;
use kie_core::SkillOutcome;
use kie_core::Stage;
use kie_core::atomic_write;
use tracing::info;

use crate::analyzer::analyze;
use crate::eda::ProfileThresholds;
use crate::eda::build_profile;
use crate::lexicon::RoleLexicon;
use crate::loader::detect_format;
use crate::loader::load_table;
use crate::mapper::map_columns;
use crate::planner::plan;
use crate::table::DataTable;
use crate::triage::InsightCatalog;
use crate::triage::triage;

// ============================================================================
// SECTION: Shared Helpers
// ============================================================================

/// Resolves the data file a skill should read.
///
/// Spec-declared sources win; otherwise the first supported file under
/// `data/` is used.
fn resolve_data_file(ctx: &SkillContext<'_>) -> Result<PathBuf, SkillError> {
    for source in &ctx.spec.data_sources {
        let direct = ctx.workspace.root().join(source);
        if direct.is_file() {
            return Ok(direct);
        }
        let under_data = ctx.workspace.data_dir().join(source);
        if under_data.is_file() {
            return Ok(under_data);
        }
    }
    let files = ctx
        .workspace
        .list_data_files()
        .map_err(|err| SkillError::InvalidData(err.to_string()))?;
    files
        .into_iter()
        .find(|file| detect_format(file).is_some())
        .ok_or_else(|| SkillError::MissingInput("no data file present under data/".to_string()))
}

/// Loads the resolved data file as a typed table.
fn load_workspace_table(
    ctx: &SkillContext<'_>,
    config: &EngineConfig,
) -> Result<(PathBuf, DataTable), SkillError> {
    let path = resolve_data_file(ctx)?;
    let table = load_table(&path, config.loader.max_rows)
        .map_err(|err| SkillError::InvalidData(err.to_string()))?;
    Ok((path, table))
}

/// Writes a JSON artifact atomically and returns its reference.
fn write_json_artifact<T: serde::Serialize>(
    root: &Path,
    relative: &str,
    value: &T,
) -> Result<ArtifactRef, SkillError> {
    let json = serde_json::to_vec_pretty(value)
        .map_err(|err| SkillError::Serialize(err.to_string()))?;
    let path = root.join(relative);
    atomic_write(&path, &json).map_err(|err| SkillError::Io {
        path: path.display().to_string(),
        source: std::io::Error::other(err.to_string()),
    })?;
    ArtifactRef::from_file(root, relative)
        .map_err(|err| SkillError::Serialize(err.to_string()))
}

/// Writes a YAML artifact atomically and returns its reference.
fn write_yaml_artifact<T: serde::Serialize>(
    root: &Path,
    relative: &str,
    value: &T,
) -> Result<ArtifactRef, SkillError> {
    let yaml =
        serde_yaml::to_string(value).map_err(|err| SkillError::Serialize(err.to_string()))?;
    let path = root.join(relative);
    atomic_write(&path, yaml.as_bytes()).map_err(|err| SkillError::Io {
        path: path.display().to_string(),
        source: std::io::Error::other(err.to_string()),
    })?;
    ArtifactRef::from_file(root, relative)
        .map_err(|err| SkillError::Serialize(err.to_string()))
}

/// Reads a JSON artifact produced by an earlier skill.
fn read_json_artifact<T: serde::de::DeserializeOwned>(
    path: &Path,
    what: &str,
) -> Result<T, SkillError> {
    if !path.is_file() {
        return Err(SkillError::MissingInput(format!("{what} not found; run the earlier stage")));
    }
    let contents = fs::read_to_string(path).map_err(|err| SkillError::Io {
        path: path.display().to_string(),
        source: err,
    })?;
    serde_json::from_str(&contents).map_err(|err| SkillError::InvalidData(err.to_string()))
}

/// Builds the role lexicon from configuration extensions.
fn lexicon_from(config: &EngineConfig) -> RoleLexicon {
    RoleLexicon::new(config.lexicon.extra_keywords.clone())
}

// ============================================================================
// SECTION: Load Skill
// ============================================================================

/// Data loader with schema inference; produces the EDA profile.
#[derive(Debug, Clone)]
pub struct LoadSkill {
    /// Engine configuration snapshot.
    config: EngineConfig,
}

impl LoadSkill {
    /// Creates the skill with its configuration.
    #[must_use]
    pub const fn new(config: EngineConfig) -> Self {
        Self {
            config,
        }
    }
}

impl Skill for LoadSkill {
    fn name(&self) -> &'static str {
        "intelligence.load"
    }

    fn stage(&self) -> Stage {
        Stage::Eda
    }

    fn preconditions(&self, ctx: &SkillContext<'_>) -> Vec<String> {
        match resolve_data_file(ctx) {
            Ok(_) => Vec::new(),
            Err(err) => vec![err.to_string()],
        }
    }

    fn declared_outputs(&self, _ctx: &SkillContext<'_>) -> Vec<String> {
        vec!["outputs/eda_profile.json".to_string(), "outputs/eda_profile.yaml".to_string()]
    }

    fn run(&self, ctx: &SkillContext<'_>) -> Result<SkillOutcome, SkillError> {
        let (path, table) = load_workspace_table(ctx, &self.config)?;
        let source = ctx
            .workspace
            .relative(&path)
            .unwrap_or_else(|| path.display().to_string());
        let profile = build_profile(
            &source,
            &table,
            ProfileThresholds {
                null_ratio_warn: self.config.loader.null_ratio_warn,
                constant_warn: self.config.loader.constant_warn,
                high_cardinality_ratio: self.config.loader.high_cardinality_ratio,
            },
        );
        info!(source = %source, rows = profile.shape[0], "eda profile built");
        let root = ctx.workspace.root();
        let artifacts = vec![
            write_json_artifact(root, "outputs/eda_profile.json", &profile)?,
            write_yaml_artifact(root, "outputs/eda_profile.yaml", &profile)?,
        ];
        Ok(SkillOutcome {
            artifacts,
            warnings: profile.warnings,
        })
    }
}

// ============================================================================
// SECTION: Map Skill
// ============================================================================

/// Semantic column mapper; produces the cached column mapping.
#[derive(Debug, Clone)]
pub struct MapSkill {
    /// Engine configuration snapshot.
    config: EngineConfig,
}

impl MapSkill {
    /// Creates the skill with its configuration.
    #[must_use]
    pub const fn new(config: EngineConfig) -> Self {
        Self {
            config,
        }
    }
}

impl Skill for MapSkill {
    fn name(&self) -> &'static str {
        "intelligence.map"
    }

    fn stage(&self) -> Stage {
        Stage::Analyze
    }

    fn preconditions(&self, ctx: &SkillContext<'_>) -> Vec<String> {
        let mut missing = Vec::new();
        if !ctx.workspace.eda_profile_json_path().is_file() {
            missing.push("EDA profile not found; run `kie eda`".to_string());
        }
        missing
    }

    fn declared_outputs(&self, _ctx: &SkillContext<'_>) -> Vec<String> {
        vec!["outputs/column_mapping.json".to_string()]
    }

    fn run(&self, ctx: &SkillContext<'_>) -> Result<SkillOutcome, SkillError> {
        let (_, table) = load_workspace_table(ctx, &self.config)?;
        let lexicon = lexicon_from(&self.config);
        let mapping = map_columns(&table, ctx.spec.column_mapping.as_ref(), &lexicon);
        let mut warnings: Vec<String> = mapping
            .overrides_ignored
            .iter()
            .map(|ignored| {
                format!(
                    "column_mapping override for {} ignored: column {} does not exist",
                    ignored.role, ignored.column
                )
            })
            .collect();
        if mapping.assignments.is_empty() {
            warnings.push("no semantic roles could be assigned".to_string());
        }
        let artifacts = vec![write_json_artifact(
            ctx.workspace.root(),
            "outputs/column_mapping.json",
            &mapping,
        )?];
        Ok(SkillOutcome {
            artifacts,
            warnings,
        })
    }
}

// ============================================================================
// SECTION: Analyze Skill
// ============================================================================

/// Statistical analyzer; produces raw insights (triage still empty).
#[derive(Debug, Clone)]
pub struct AnalyzeSkill {
    /// Engine configuration snapshot.
    config: EngineConfig,
}

impl AnalyzeSkill {
    /// Creates the skill with its configuration.
    #[must_use]
    pub const fn new(config: EngineConfig) -> Self {
        Self {
            config,
        }
    }
}

impl Skill for AnalyzeSkill {
    fn name(&self) -> &'static str {
        "intelligence.analyze"
    }

    fn stage(&self) -> Stage {
        Stage::Analyze
    }

    fn preconditions(&self, ctx: &SkillContext<'_>) -> Vec<String> {
        let mut missing = Vec::new();
        if !ctx.workspace.column_mapping_path().is_file() {
            missing.push("column mapping not found; the map skill runs first".to_string());
        }
        missing
    }

    fn declared_outputs(&self, _ctx: &SkillContext<'_>) -> Vec<String> {
        vec!["outputs/raw_insights.json".to_string()]
    }

    fn run(&self, ctx: &SkillContext<'_>) -> Result<SkillOutcome, SkillError> {
        let (_, table) = load_workspace_table(ctx, &self.config)?;
        let mapping =
            read_json_artifact(&ctx.workspace.column_mapping_path(), "column mapping")?;
        let insights = analyze(&table, &mapping)
            .map_err(|err| SkillError::Blocked(err.to_string()))?;
        let catalog = InsightCatalog {
            insights,
            triage: Vec::new(),
        };
        let warnings = if catalog.insights.is_empty() {
            vec!["analysis produced no insights".to_string()]
        } else {
            Vec::new()
        };
        let artifacts = vec![write_json_artifact(
            ctx.workspace.root(),
            "outputs/raw_insights.json",
            &catalog,
        )?];
        Ok(SkillOutcome {
            artifacts,
            warnings,
        })
    }
}

// ============================================================================
// SECTION: Triage Skill
// ============================================================================

/// Insight triage; rewrites the catalog with dispositions and priorities.
#[derive(Debug, Clone)]
pub struct TriageSkill {
    /// Engine configuration snapshot.
    config: EngineConfig,
}

impl TriageSkill {
    /// Creates the skill with its configuration.
    #[must_use]
    pub const fn new(config: EngineConfig) -> Self {
        Self {
            config,
        }
    }
}

impl Skill for TriageSkill {
    fn name(&self) -> &'static str {
        "intelligence.triage"
    }

    fn stage(&self) -> Stage {
        Stage::Analyze
    }

    fn preconditions(&self, ctx: &SkillContext<'_>) -> Vec<String> {
        let mut missing = Vec::new();
        if !ctx.workspace.raw_insights_path().is_file() {
            missing.push("raw insights not found; the analyze skill runs first".to_string());
        }
        missing
    }

    fn declared_outputs(&self, _ctx: &SkillContext<'_>) -> Vec<String> {
        vec!["outputs/raw_insights.json".to_string()]
    }

    fn run(&self, ctx: &SkillContext<'_>) -> Result<SkillOutcome, SkillError> {
        let mut catalog: InsightCatalog =
            read_json_artifact(&ctx.workspace.raw_insights_path(), "raw insights")?;
        let mapping =
            read_json_artifact(&ctx.workspace.column_mapping_path(), "column mapping")?;
        let lexicon = lexicon_from(&self.config);
        catalog.triage = triage(
            &catalog.insights,
            &ctx.spec.objective,
            &mapping,
            &lexicon,
            &self.config.triage,
        );
        let suppressed = catalog
            .triage
            .iter()
            .filter(|entry| !matches!(entry.status, crate::triage::TriageStatus::Keep))
            .count();
        let warnings = if suppressed == catalog.triage.len() && !catalog.triage.is_empty() {
            vec!["every insight was suppressed or merged".to_string()]
        } else {
            Vec::new()
        };
        let artifacts = vec![write_json_artifact(
            ctx.workspace.root(),
            "outputs/raw_insights.json",
            &catalog,
        )?];
        Ok(SkillOutcome {
            artifacts,
            warnings,
        })
    }
}

// ============================================================================
// SECTION: Plan Skill
// ============================================================================

/// Visualization planner; produces the plan consumed by chart generation.
#[derive(Debug, Clone)]
pub struct PlanSkill {
    /// Engine configuration snapshot.
    config: EngineConfig,
}

impl PlanSkill {
    /// Creates the skill with its configuration.
    #[must_use]
    pub const fn new(config: EngineConfig) -> Self {
        Self {
            config,
        }
    }
}

impl Skill for PlanSkill {
    fn name(&self) -> &'static str {
        "intelligence.plan"
    }

    fn stage(&self) -> Stage {
        Stage::Analyze
    }

    fn preconditions(&self, ctx: &SkillContext<'_>) -> Vec<String> {
        let mut missing = Vec::new();
        if !ctx.workspace.raw_insights_path().is_file() {
            missing.push("triaged insights not found; the triage skill runs first".to_string());
        }
        missing
    }

    fn declared_outputs(&self, _ctx: &SkillContext<'_>) -> Vec<String> {
        vec!["outputs/visualization_plan.json".to_string()]
    }

    fn run(&self, ctx: &SkillContext<'_>) -> Result<SkillOutcome, SkillError> {
        let (_, table) = load_workspace_table(ctx, &self.config)?;
        let catalog: InsightCatalog =
            read_json_artifact(&ctx.workspace.raw_insights_path(), "triaged insights")?;
        if catalog.triage.is_empty() && !catalog.insights.is_empty() {
            return Err(SkillError::MissingInput(
                "insights are not yet triaged; the triage skill runs first".to_string(),
            ));
        }
        let mapping =
            read_json_artifact(&ctx.workspace.column_mapping_path(), "column mapping")?;
        let visualization_plan = plan(
            &table,
            &catalog.insights,
            &catalog.triage,
            &mapping,
            &ctx.spec.objective,
        );
        let warnings = if visualization_plan.items.is_empty() {
            vec!["the visualization plan is empty".to_string()]
        } else {
            Vec::new()
        };
        let artifacts = vec![write_json_artifact(
            ctx.workspace.root(),
            "outputs/visualization_plan.json",
            &visualization_plan,
        )?];
        Ok(SkillOutcome {
            artifacts,
            warnings,
        })
    }
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Registry of intelligence skills keyed by stage.
///
/// # Invariants
/// - Skills for one stage are stored in execution order.
pub struct SkillRegistry {
    /// Skills per stage, in execution order.
    skills: BTreeMap<Stage, Vec<Box<dyn Skill>>>,
}

impl SkillRegistry {
    /// Builds the standard registry for the given configuration.
    #[must_use]
    pub fn standard(config: &EngineConfig) -> Self {
        let mut skills: BTreeMap<Stage, Vec<Box<dyn Skill>>> = BTreeMap::new();
        skills.insert(Stage::Eda, vec![Box::new(LoadSkill::new(config.clone()))]);
        skills.insert(
            Stage::Analyze,
            vec![
                Box::new(MapSkill::new(config.clone())),
                Box::new(AnalyzeSkill::new(config.clone())),
                Box::new(TriageSkill::new(config.clone())),
                Box::new(PlanSkill::new(config.clone())),
            ],
        );
        Self {
            skills,
        }
    }

    /// Returns the skills registered for a stage, in execution order.
    #[must_use]
    pub fn for_stage(&self, stage: Stage) -> &[Box<dyn Skill>] {
        self.skills.get(&stage).map_or(&[], Vec::as_slice)
    }
}
