// crates/kie-engine/src/handlers.rs
// ============================================================================
// Module: Stage Handlers
// Description: Per-command handler logic between the pre- and post-gates.
// Purpose: Do the work; report artifacts, skills, and warnings truthfully.
// Dependencies: crate::{builder, commands}, kie-brand, kie-config, kie-core,
// kie-intelligence, serde_json
// ============================================================================

//! ## Overview
//! Handlers run between the gates. They produce artifacts and report them
//! with hashes, but never write rails state or the evidence ledger; the
//! dispatcher owns that single mutation surface. Spec mutations are returned
//! to the dispatcher as values and persisted atomically there.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;

use kie_brand::ChartConfig;
use kie_brand::Finding;
use kie_brand::Severity;
use kie_brand::ValidationMode;
use kie_brand::ValidationReport;
use kie_brand::validate_chart;
use kie_brand::validate_rows;
use kie_config::EngineConfig;
use kie_core::ArtifactRef;
use kie_core::BuildTarget;
use kie_core::EnvSnapshot;
use kie_core::ProjectSpec;
use kie_core::ProjectType;
use kie_core::RailsState;
use kie_core::SkillContext;
use kie_core::SkillError;
use kie_core::Stage;
use kie_core::Theme;
use kie_core::WorkspaceLayout;
use kie_core::atomic_write;
use kie_intelligence::ColumnMapping;
use kie_intelligence::SkillRegistry;
use kie_intelligence::VisualizationPlan;
use kie_intelligence::load_table;
use thiserror::Error;
use tracing::info;

use crate::builder::build_charts;
use crate::builder::dataset_rows;
use crate::builder::write_export_manifest;
use crate::commands::InterviewInput;
use crate::commands::SpecAction;

// ============================================================================
// SECTION: Handler Contract
// ============================================================================

/// Read-only context handed to a handler.
///
/// # Invariants
/// - Handlers never mutate the referenced state in place.
#[derive(Debug, Clone, Copy)]
pub struct HandlerContext<'a> {
    /// Workspace layout.
    pub workspace: &'a WorkspaceLayout,
    /// Engine configuration.
    pub config: &'a EngineConfig,
    /// Project spec, when one exists.
    pub spec: Option<&'a ProjectSpec>,
    /// Rails state, when one exists.
    pub rails: Option<&'a RailsState>,
    /// Environment snapshot.
    pub env: &'a EnvSnapshot,
}

/// Result of a handler run, consumed by the dispatcher.
///
/// # Invariants
/// - `artifacts` digests match disk at the time the handler returns.
#[derive(Debug, Default)]
pub struct HandlerOutput {
    /// One-line outcome summary.
    pub summary: String,
    /// Artifacts produced, with digests.
    pub artifacts: Vec<ArtifactRef>,
    /// Skills executed, in order.
    pub skills_executed: Vec<String>,
    /// Advisory warnings.
    pub warnings: Vec<String>,
    /// Build sub-goal completed, when the command was a build.
    pub sub_goal: Option<BuildTarget>,
    /// Validation report, when the command validated outputs.
    pub validation: Option<ValidationReport>,
    /// Updated spec to persist, when the command mutated it.
    pub spec_after: Option<ProjectSpec>,
    /// Stage to reset the rails to, for the repair path.
    pub rails_reset: Option<Stage>,
    /// Lines for the CLI to print (doctor, status).
    pub info_lines: Vec<String>,
}

/// Handler failures, mapped to exit codes by the dispatcher.
///
/// # Invariants
/// - `Blocked` is a policy outcome; `Failed` is unexpected.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The command refused to proceed; a recovery plan explains the path back.
    #[error("{message}")]
    Blocked {
        /// Why the command refused.
        message: String,
        /// Exact CLI remediation, when one exists.
        remediation: Option<String>,
    },
    /// The command failed unexpectedly.
    #[error("{0}")]
    Failed(String),
}

impl From<SkillError> for HandlerError {
    fn from(err: SkillError) -> Self {
        match err {
            SkillError::Blocked(message) => Self::Blocked {
                message,
                remediation: None,
            },
            SkillError::MissingInput(message) => Self::Blocked {
                message,
                remediation: None,
            },
            other => Self::Failed(other.to_string()),
        }
    }
}

// ============================================================================
// SECTION: Bootstrap and Diagnostics
// ============================================================================

/// Ensures the workspace skeleton and marker.
///
/// # Errors
///
/// Returns [`HandlerError::Failed`] when the skeleton cannot be created.
pub fn handle_bootstrap(ctx: &HandlerContext<'_>) -> Result<HandlerOutput, HandlerError> {
    ctx.workspace
        .ensure_skeleton()
        .map_err(|err| HandlerError::Failed(err.to_string()))?;
    info!(root = %ctx.workspace.root().display(), "workspace skeleton ensured");
    Ok(HandlerOutput {
        summary: "workspace skeleton and marker are in place".to_string(),
        ..HandlerOutput::default()
    })
}

/// Reports environment facts; never changes state.
///
/// # Errors
///
/// This handler is infallible in practice; the signature matches the rest.
pub fn handle_doctor(ctx: &HandlerContext<'_>) -> Result<HandlerOutput, HandlerError> {
    let mut lines = Vec::new();
    lines.push(format!("os: {}", ctx.env.os));
    lines.push(format!(
        "python: {}",
        ctx.env.python.as_deref().unwrap_or("not found")
    ));
    lines.push(format!("node: {}", ctx.env.node.as_deref().unwrap_or("not found")));
    lines.push(format!(
        "workspace marker: {}",
        if ctx.workspace.is_workspace() { "present" } else { "absent" }
    ));
    lines.push(format!(
        "spec: {}",
        match ctx.spec {
            Some(spec) if spec.is_complete() => "complete",
            Some(_) => "incomplete",
            None => "absent",
        }
    ));
    Ok(HandlerOutput {
        summary: "environment facts reported".to_string(),
        info_lines: lines,
        ..HandlerOutput::default()
    })
}

/// Prints current stage, completed stages, and the next suggested command.
///
/// # Errors
///
/// This handler is infallible in practice; the signature matches the rest.
pub fn handle_status(
    ctx: &HandlerContext<'_>,
    next_action: &str,
) -> Result<HandlerOutput, HandlerError> {
    let mut lines = Vec::new();
    match ctx.rails {
        Some(rails) => {
            lines.push(format!("current stage: {}", rails.current_stage));
            let completed: Vec<&str> =
                rails.completed_stages.iter().map(|stage| stage.as_str()).collect();
            lines.push(format!("completed: {}", completed.join(" → ")));
        }
        None => lines.push("current stage: (no rails state; run `kie bootstrap`)".to_string()),
    }
    lines.push(format!("next: {next_action}"));
    Ok(HandlerOutput {
        summary: "rails status reported".to_string(),
        info_lines: lines,
        ..HandlerOutput::default()
    })
}

// ============================================================================
// SECTION: Spec Handlers
// ============================================================================

/// Flag-driven requirements capture; merges provided fields over the spec.
///
/// # Errors
///
/// Returns [`HandlerError::Blocked`] when a provided field value is invalid.
pub fn handle_interview(
    ctx: &HandlerContext<'_>,
    input: &InterviewInput,
) -> Result<HandlerOutput, HandlerError> {
    let mut spec = ctx.spec.cloned().unwrap_or_default();
    let assignments: [(&str, Option<&String>); 6] = [
        ("project_name", input.project_name.as_ref()),
        ("objective", input.objective.as_ref()),
        ("client", input.client.as_ref()),
        ("project_type", input.project_type.as_ref()),
        ("theme", input.theme.as_ref()),
        ("data_sources", input.data.as_ref()),
    ];
    for (key, value) in assignments {
        let Some(value) = value else {
            continue;
        };
        spec.set_value(key, value).map_err(|err| HandlerError::Blocked {
            message: err.to_string(),
            remediation: None,
        })?;
    }
    let mut warnings = Vec::new();
    if !spec.is_complete() {
        warnings.push(format!(
            "spec still incomplete: missing {}",
            spec.missing_fields().join(", ")
        ));
    }
    Ok(HandlerOutput {
        summary: "requirements captured into the spec".to_string(),
        warnings,
        spec_after: Some(spec),
        ..HandlerOutput::default()
    })
}

/// Initializes, sets, or repairs the spec and engine state.
///
/// # Errors
///
/// Returns [`HandlerError::Blocked`] on misuse (init over an existing spec,
/// set without a spec, unknown keys).
pub fn handle_spec(
    ctx: &HandlerContext<'_>,
    action: &SpecAction,
) -> Result<HandlerOutput, HandlerError> {
    match action {
        SpecAction::Init {
            project_name,
        } => {
            if ctx.spec.is_some() {
                return Err(HandlerError::Blocked {
                    message: "a spec already exists; mutate it with `spec --set`".to_string(),
                    remediation: Some("kie spec --set objective=\"<objective>\"".to_string()),
                });
            }
            Ok(HandlerOutput {
                summary: format!("spec initialized for {project_name}"),
                spec_after: Some(ProjectSpec::init(project_name.clone())),
                ..HandlerOutput::default()
            })
        }
        SpecAction::Set {
            key,
            value,
        } => {
            let Some(existing) = ctx.spec else {
                return Err(HandlerError::Blocked {
                    message: "no spec to mutate".to_string(),
                    remediation: Some("kie spec --init <project-name>".to_string()),
                });
            };
            let mut spec = existing.clone();
            let changed = spec.set_value(key, value).map_err(|err| HandlerError::Blocked {
                message: err.to_string(),
                remediation: None,
            })?;
            let warnings = if changed {
                Vec::new()
            } else {
                vec![format!("{key} already held this value; recorded as a no-op")]
            };
            Ok(HandlerOutput {
                summary: format!("spec field {key} set"),
                warnings,
                spec_after: Some(spec),
                ..HandlerOutput::default()
            })
        }
        SpecAction::Repair => handle_repair(ctx),
    }
}

/// Re-derives the rails position from the artifacts that verify on disk.
fn handle_repair(ctx: &HandlerContext<'_>) -> Result<HandlerOutput, HandlerError> {
    let root = ctx.workspace.root();
    let mut verified_stage = Stage::Startkie;
    if ctx.spec.is_some_and(ProjectSpec::is_complete) {
        verified_stage = Stage::Spec;
        if artifact_verifies(root, "outputs/eda_profile.json") {
            verified_stage = Stage::Eda;
            if artifact_verifies(root, "outputs/visualization_plan.json") {
                verified_stage = Stage::Analyze;
            }
        }
    }
    info!(stage = verified_stage.as_str(), "rails repaired to verified stage");
    Ok(HandlerOutput {
        summary: format!("rails reset to the last verifiable stage: {verified_stage}"),
        rails_reset: Some(verified_stage),
        ..HandlerOutput::default()
    })
}

/// Returns true when a workspace-relative artifact parses as JSON.
fn artifact_verifies(root: &std::path::Path, relative: &str) -> bool {
    let path = root.join(relative);
    fs::read_to_string(&path)
        .ok()
        .and_then(|contents| serde_json::from_str::<serde_json::Value>(&contents).ok())
        .is_some()
}

/// Sets the theme explicitly.
///
/// # Errors
///
/// Returns [`HandlerError::Blocked`] when no spec exists yet.
pub fn handle_theme(
    ctx: &HandlerContext<'_>,
    theme: Theme,
) -> Result<HandlerOutput, HandlerError> {
    let Some(existing) = ctx.spec else {
        return Err(HandlerError::Blocked {
            message: "no spec to set a theme on".to_string(),
            remediation: Some("kie spec --init <project-name>".to_string()),
        });
    };
    let mut spec = existing.clone();
    spec.theme = Some(theme);
    Ok(HandlerOutput {
        summary: format!("theme set to {theme}"),
        spec_after: Some(spec),
        ..HandlerOutput::default()
    })
}

// ============================================================================
// SECTION: Pipeline Handlers
// ============================================================================

/// Runs the load skill to produce the EDA profile.
///
/// # Errors
///
/// Returns [`HandlerError`] when the skill refuses or fails.
pub fn handle_eda(
    ctx: &HandlerContext<'_>,
    file: Option<&str>,
) -> Result<HandlerOutput, HandlerError> {
    let mut spec = ctx.spec.cloned().unwrap_or_default();
    if let Some(file) = file {
        spec.data_sources = vec![file.to_string()];
    }
    run_skills(ctx, &spec, Stage::Eda, "EDA profile produced")
}

/// Runs map → analyze → triage → plan to produce the visualization plan.
///
/// # Errors
///
/// Returns [`HandlerError`] when any skill refuses or fails.
pub fn handle_analyze(ctx: &HandlerContext<'_>) -> Result<HandlerOutput, HandlerError> {
    let spec = ctx
        .spec
        .cloned()
        .ok_or_else(|| HandlerError::Failed("spec vanished between gate and handler".to_string()))?;
    run_skills(ctx, &spec, Stage::Analyze, "insights, mapping, and plan produced")
}

/// Runs every registered skill for a stage, in order.
fn run_skills(
    ctx: &HandlerContext<'_>,
    spec: &ProjectSpec,
    stage: Stage,
    summary: &str,
) -> Result<HandlerOutput, HandlerError> {
    let registry = SkillRegistry::standard(ctx.config);
    let skill_ctx = SkillContext {
        workspace: ctx.workspace,
        spec,
    };
    let mut output = HandlerOutput {
        summary: summary.to_string(),
        ..HandlerOutput::default()
    };
    for skill in registry.for_stage(stage) {
        let unmet = skill.preconditions(&skill_ctx);
        if let Some(first) = unmet.first() {
            return Err(HandlerError::Blocked {
                message: format!("{}: {first}", skill.name()),
                remediation: None,
            });
        }
        let declared = skill.declared_outputs(&skill_ctx);
        let outcome = skill.run(&skill_ctx)?;
        for relative in declared {
            if !ctx.workspace.root().join(&relative).is_file() {
                return Err(HandlerError::Failed(format!(
                    "skill {} did not produce its declared output {relative}",
                    skill.name()
                )));
            }
        }
        output.skills_executed.push(skill.name().to_string());
        // Later skills may rewrite an earlier artifact (triage refines the
        // insight catalog in place); only the final digest is declared.
        for artifact in outcome.artifacts {
            output.artifacts.retain(|existing| existing.path != artifact.path);
            output.artifacts.push(artifact);
        }
        output.warnings.extend(outcome.warnings);
    }
    Ok(output)
}

/// Builds charts and the export manifest for a delivery target.
///
/// # Errors
///
/// Returns [`HandlerError`] when the plan cannot be consumed or charts
/// cannot be written.
pub fn handle_build(
    ctx: &HandlerContext<'_>,
    target: BuildTarget,
) -> Result<HandlerOutput, HandlerError> {
    let spec = ctx
        .spec
        .ok_or_else(|| HandlerError::Failed("spec vanished between gate and handler".to_string()))?;
    let theme = spec.theme.ok_or_else(|| HandlerError::Blocked {
        message: "theme is not set".to_string(),
        remediation: Some("kie theme dark".to_string()),
    })?;
    let plan: VisualizationPlan =
        read_json(ctx.workspace, "outputs/visualization_plan.json", "visualization plan")?;
    let mapping: ColumnMapping =
        read_json(ctx.workspace, "outputs/column_mapping.json", "column mapping")?;
    let skill_ctx = SkillContext {
        workspace: ctx.workspace,
        spec,
    };
    let data_path = resolve_data(&skill_ctx)?;
    let table = load_table(&data_path, ctx.config.loader.max_rows)
        .map_err(|err| HandlerError::Failed(err.to_string()))?;

    let built = build_charts(ctx.workspace, theme, &table, &plan, &mapping)
        .map_err(|err| HandlerError::Failed(err.to_string()))?;
    let manifest = write_export_manifest(ctx.workspace, target, spec, theme, &built.charts)
        .map_err(|err| HandlerError::Failed(err.to_string()))?;

    let mode = if ctx.config.validator.strict_for_build {
        ValidationMode::Strict
    } else {
        ValidationMode::Lenient
    };
    let mut report = ValidationReport::new(mode);
    for (location, chart) in &built.charts {
        validate_chart(&mut report, chart, location);
    }
    let rows = dataset_rows(&table, 200);
    let data_location = ctx
        .workspace
        .relative(&data_path)
        .unwrap_or_else(|| data_path.display().to_string());
    validate_rows(&mut report, &rows, &data_location);

    let mut artifacts = built.artifacts;
    artifacts.push(manifest);
    Ok(HandlerOutput {
        summary: format!("{target} build produced {} chart(s)", built.charts.len()),
        artifacts,
        skills_executed: vec!["builder.charts".to_string(), "builder.exports".to_string()],
        warnings: built.warnings,
        sub_goal: Some(target),
        validation: Some(report),
        ..HandlerOutput::default()
    })
}

/// Renders a preview index over the latest outputs, validating leniently.
///
/// # Errors
///
/// Returns [`HandlerError`] when no charts exist or the index cannot be
/// written.
pub fn handle_preview(ctx: &HandlerContext<'_>) -> Result<HandlerOutput, HandlerError> {
    let charts = load_chart_files(ctx.workspace)?;
    if charts.is_empty() {
        return Err(HandlerError::Blocked {
            message: "no chart configurations to preview".to_string(),
            remediation: Some("kie build presentation".to_string()),
        });
    }
    let mode = if ctx.config.validator.strict_for_preview {
        ValidationMode::Strict
    } else {
        ValidationMode::Lenient
    };
    let mut report = ValidationReport::new(mode);
    for (location, chart) in &charts {
        validate_chart(&mut report, chart, location);
    }

    let mut index = String::from("# Preview\n\n");
    for (location, chart) in &charts {
        let title = chart.title.as_deref().unwrap_or("(untitled)");
        index.push_str(&format!("- `{location}` — {} ({})\n", title, chart.chart_type));
    }
    let relative = "outputs/preview.md";
    let path = ctx.workspace.root().join(relative);
    atomic_write(&path, index.as_bytes())
        .map_err(|err| HandlerError::Failed(err.to_string()))?;
    let artifact = ArtifactRef::from_file(ctx.workspace.root(), relative)
        .map_err(|err| HandlerError::Failed(err.to_string()))?;

    Ok(HandlerOutput {
        summary: format!("preview rendered over {} chart(s)", charts.len()),
        artifacts: vec![artifact],
        skills_executed: vec!["preview.render".to_string()],
        validation: Some(report),
        ..HandlerOutput::default()
    })
}

/// Runs the validator standalone over charts and data.
///
/// # Errors
///
/// Returns [`HandlerError`] when the mode override is unknown or the report
/// cannot be written.
pub fn handle_validate(
    ctx: &HandlerContext<'_>,
    mode_override: Option<&str>,
) -> Result<HandlerOutput, HandlerError> {
    let mode = match mode_override {
        Some("strict") => ValidationMode::Strict,
        Some("lenient") => ValidationMode::Lenient,
        Some(other) => {
            return Err(HandlerError::Blocked {
                message: format!("unknown validation mode {other:?}"),
                remediation: Some("kie validate --mode strict".to_string()),
            });
        }
        None => ValidationMode::Strict,
    };
    let mut report = ValidationReport::new(mode);
    for (location, chart) in load_chart_files(ctx.workspace)? {
        validate_chart(&mut report, &chart, &location);
    }
    for location in unparsable_chart_files(ctx.workspace)? {
        report.record(
            format!("brand.parse@{location}"),
            vec![Finding::new(
                "brand.parse",
                Severity::Critical,
                "chart configuration is not valid chart JSON",
                &location,
                Some("regenerate via `kie build` — configs are engine-produced".to_string()),
            )],
        );
    }
    if let Some(spec) = ctx.spec {
        let skill_ctx = SkillContext {
            workspace: ctx.workspace,
            spec,
        };
        if let Ok(data_path) = resolve_data(&skill_ctx)
            && let Ok(table) = load_table(&data_path, ctx.config.loader.max_rows)
        {
            let rows = dataset_rows(&table, 200);
            let location = ctx
                .workspace
                .relative(&data_path)
                .unwrap_or_else(|| data_path.display().to_string());
            validate_rows(&mut report, &rows, &location);
        }
    }

    let relative = "outputs/validation_report.json";
    let json = serde_json::to_vec_pretty(&report)
        .map_err(|err| HandlerError::Failed(err.to_string()))?;
    atomic_write(&ctx.workspace.root().join(relative), &json)
        .map_err(|err| HandlerError::Failed(err.to_string()))?;
    let artifact = ArtifactRef::from_file(ctx.workspace.root(), relative)
        .map_err(|err| HandlerError::Failed(err.to_string()))?;

    Ok(HandlerOutput {
        summary: format!("validation ran {} check(s)", report.checks.len()),
        artifacts: vec![artifact],
        skills_executed: vec!["brand.validate".to_string()],
        validation: Some(report),
        ..HandlerOutput::default()
    })
}

// ============================================================================
// SECTION: Shared Helpers
// ============================================================================

/// Reads a required JSON artifact.
fn read_json<T: serde::de::DeserializeOwned>(
    workspace: &WorkspaceLayout,
    relative: &str,
    what: &str,
) -> Result<T, HandlerError> {
    let path = workspace.root().join(relative);
    let contents = fs::read_to_string(&path).map_err(|_| HandlerError::Blocked {
        message: format!("{what} not found at {relative}"),
        remediation: Some("kie analyze".to_string()),
    })?;
    serde_json::from_str(&contents)
        .map_err(|err| HandlerError::Failed(format!("{what} is unreadable: {err}")))
}

/// Resolves the data file through the load skill's rules.
fn resolve_data(ctx: &SkillContext<'_>) -> Result<std::path::PathBuf, HandlerError> {
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
        .map_err(|err| HandlerError::Failed(err.to_string()))?;
    files
        .into_iter()
        .find(|file| kie_intelligence::detect_format(file).is_some())
        .ok_or_else(|| HandlerError::Blocked {
            message: "no data file present under data/".to_string(),
            remediation: Some("kie spec --set data_sources=<file>".to_string()),
        })
}

/// Loads every parsable chart configuration under `outputs/charts/`.
fn load_chart_files(
    workspace: &WorkspaceLayout,
) -> Result<Vec<(String, ChartConfig)>, HandlerError> {
    let mut charts = Vec::new();
    for (location, contents) in chart_file_contents(workspace)? {
        if let Ok(chart) = serde_json::from_str::<ChartConfig>(&contents) {
            charts.push((location, chart));
        }
    }
    Ok(charts)
}

/// Lists chart files that do not parse as chart configurations.
fn unparsable_chart_files(workspace: &WorkspaceLayout) -> Result<Vec<String>, HandlerError> {
    let mut bad = Vec::new();
    for (location, contents) in chart_file_contents(workspace)? {
        if serde_json::from_str::<ChartConfig>(&contents).is_err() {
            bad.push(location);
        }
    }
    Ok(bad)
}

/// Reads every JSON file under `outputs/charts/`, sorted by name.
fn chart_file_contents(
    workspace: &WorkspaceLayout,
) -> Result<Vec<(String, String)>, HandlerError> {
    let dir = workspace.charts_dir();
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let entries = fs::read_dir(&dir).map_err(|err| HandlerError::Failed(err.to_string()))?;
    let mut paths: Vec<std::path::PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| HandlerError::Failed(err.to_string()))?;
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }
    paths.sort();
    let mut contents = Vec::new();
    for path in paths {
        let text =
            fs::read_to_string(&path).map_err(|err| HandlerError::Failed(err.to_string()))?;
        let location = workspace
            .relative(&path)
            .unwrap_or_else(|| path.display().to_string());
        contents.push((location, text));
    }
    Ok(contents)
}

/// Suggests the build target implied by the spec's project type.
#[must_use]
pub const fn default_build_target(project_type: ProjectType) -> BuildTarget {
    match project_type {
        ProjectType::Dashboard => BuildTarget::Dashboard,
        ProjectType::Presentation | ProjectType::Proposal => BuildTarget::Presentation,
        ProjectType::Analytics | ProjectType::Modeling | ProjectType::Research => {
            BuildTarget::Report
        }
    }
}
