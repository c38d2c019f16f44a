// crates/kie-engine/src/gates.rs
// ============================================================================
// Module: Gate Engine
// Description: Pre- and post-command policy checks.
// Purpose: Enforce the invariant table before and after every command.
// Dependencies: crate::{commands, probe}, kie-brand, kie-config, kie-core
// ============================================================================

//! ## Overview
//! The gate engine runs an ordered list of checks yielding
//! `ALLOW | WARN | BLOCK` with message and remediation. Checks execute until
//! the first BLOCK; all WARNs are collected. Gates never mutate rails state
//! or the spec; they only gate and decorate results. Only the stage handler,
//! through the dispatcher's single mutation surface, writes rails state.

// ============================================================================
// SECTION: Imports
// ============================================================================

use kie_brand::ValidationReport;
use kie_config::EngineConfig;
use kie_core::ArtifactRef;
use kie_core::BuildTarget;
use kie_core::EnvSnapshot;
use kie_core::GateDecision;
use kie_core::GateFinding;
use kie_core::GateReport;
use kie_core::ProjectSpec;
use kie_core::RailsState;
use kie_core::WorkspaceLayout;
use tracing::debug;

use crate::commands::CommandKind;
use crate::probe::major_version;

// ============================================================================
// SECTION: Pre-Gate
// ============================================================================

/// Inputs to the pre-gate evaluation.
///
/// # Invariants
/// - Values are snapshots; the gate never mutates them.
#[derive(Debug, Clone, Copy)]
pub struct PreGateInput<'a> {
    /// Command about to run.
    pub command: &'a CommandKind,
    /// Workspace layout.
    pub workspace: &'a WorkspaceLayout,
    /// Rails state, when one exists.
    pub rails: Option<&'a RailsState>,
    /// Project spec, when one exists.
    pub spec: Option<&'a ProjectSpec>,
    /// Environment snapshot.
    pub env: &'a EnvSnapshot,
    /// Engine configuration.
    pub config: &'a EngineConfig,
}

/// Evaluates every pre-command policy, stopping at the first BLOCK.
#[must_use]
pub fn pre_gate(input: &PreGateInput<'_>) -> GateReport {
    let mut report = GateReport::new();
    let checks: [fn(&PreGateInput<'_>) -> GateFinding; 9] = [
        check_workspace_marker,
        check_state_consistency,
        check_intent,
        check_theme,
        check_data_present,
        check_eda_profile,
        check_visualization_plan,
        check_preview_order,
        check_toolchain,
    ];
    for check in checks {
        let finding = check(input);
        let blocked = finding.decision == GateDecision::Block;
        report.push(finding);
        if blocked {
            debug!(command = input.command.verb(), "pre-gate blocked");
            return report;
        }
    }
    report.extend(environment_warnings(input));
    report
}

/// Workspace marker must exist for anything but bootstrap and read-only verbs.
fn check_workspace_marker(input: &PreGateInput<'_>) -> GateFinding {
    let exempt = matches!(input.command, CommandKind::Bootstrap) || input.command.is_read_only();
    if exempt || input.workspace.is_workspace() {
        GateFinding::allow("gate.workspace", "workspace marker present")
    } else {
        GateFinding::block(
            "gate.workspace",
            "this directory is not a KIE workspace",
            "kie bootstrap",
        )
    }
}

/// Rails artifact pointers must match the files on disk.
fn check_state_consistency(input: &PreGateInput<'_>) -> GateFinding {
    // Read-only verbs observe state (including tampered state) rather than
    // progress on it; the repair path must be reachable over corruption.
    if matches!(input.command, CommandKind::Bootstrap | CommandKind::Spec(_))
        || input.command.is_read_only()
    {
        return GateFinding::allow("gate.state_consistency", "observational or repair path");
    }
    let Some(rails) = input.rails else {
        return GateFinding::allow("gate.state_consistency", "no rails state yet");
    };
    for artifacts in rails.artifacts.values() {
        for artifact in artifacts {
            if !artifact.matches_disk(input.workspace.root()) {
                return GateFinding::block(
                    "gate.state_consistency",
                    format!(
                        "recorded artifact {} is missing or does not match its hash",
                        artifact.path
                    ),
                    "kie spec --repair",
                );
            }
        }
    }
    GateFinding::allow("gate.state_consistency", "recorded artifacts match disk")
}

/// Intent-bearing commands need a complete spec.
fn check_intent(input: &PreGateInput<'_>) -> GateFinding {
    let needs_spec = matches!(
        input.command,
        CommandKind::Analyze
            | CommandKind::Build(_)
            | CommandKind::Preview
            | CommandKind::Go {
                ..
            }
    );
    if !needs_spec {
        return GateFinding::allow("gate.intent", "command does not require a spec");
    }
    match input.spec {
        Some(spec) if spec.is_complete() => {
            GateFinding::allow("gate.intent", "spec present and complete")
        }
        Some(spec) => GateFinding::block(
            "gate.intent",
            format!("spec is incomplete: missing {}", spec.missing_fields().join(", ")),
            "kie interview --objective \"<objective>\"",
        ),
        None => GateFinding::block(
            "gate.intent",
            "no spec found; capture the project intent first",
            "kie spec --init <project-name>",
        ),
    }
}

/// `build` requires an explicit theme; there is no default.
fn check_theme(input: &PreGateInput<'_>) -> GateFinding {
    if !matches!(input.command, CommandKind::Build(_)) {
        return GateFinding::allow("gate.theme", "command does not require a theme");
    }
    if input.spec.is_some_and(|spec| spec.theme.is_some()) {
        GateFinding::allow("gate.theme", "theme is set")
    } else {
        GateFinding::block(
            "gate.theme",
            "theme is not set and has no default",
            "kie theme dark",
        )
    }
}

/// `eda` requires at least one data file.
fn check_data_present(input: &PreGateInput<'_>) -> GateFinding {
    if !matches!(
        input.command,
        CommandKind::Eda {
            ..
        }
    ) {
        return GateFinding::allow("gate.data", "command does not require data");
    }
    let has_data = input
        .workspace
        .list_data_files()
        .map(|files| !files.is_empty())
        .unwrap_or(false);
    let spec_source_exists = input.spec.is_some_and(|spec| {
        spec.data_sources
            .iter()
            .any(|source| input.workspace.root().join(source).is_file())
    });
    if has_data || spec_source_exists {
        GateFinding::allow("gate.data", "data file present")
    } else {
        GateFinding::block(
            "gate.data",
            "no data file present under data/",
            "kie spec --set data_sources=<file>",
        )
    }
}

/// `analyze` requires the EDA profile.
fn check_eda_profile(input: &PreGateInput<'_>) -> GateFinding {
    if !matches!(input.command, CommandKind::Analyze) {
        return GateFinding::allow("gate.eda_profile", "command does not require the profile");
    }
    if input.workspace.eda_profile_json_path().is_file() {
        GateFinding::allow("gate.eda_profile", "EDA profile present")
    } else {
        GateFinding::block("gate.eda_profile", "no EDA profile found", "kie eda")
    }
}

/// `build` requires the visualization plan.
fn check_visualization_plan(input: &PreGateInput<'_>) -> GateFinding {
    if !matches!(input.command, CommandKind::Build(_)) {
        return GateFinding::allow("gate.visualization_plan", "command does not require the plan");
    }
    if input.workspace.visualization_plan_path().is_file() {
        GateFinding::allow("gate.visualization_plan", "visualization plan present")
    } else {
        GateFinding::block(
            "gate.visualization_plan",
            "no visualization plan found",
            "kie analyze",
        )
    }
}

/// `preview` follows `build`; stages are not skippable.
fn check_preview_order(input: &PreGateInput<'_>) -> GateFinding {
    if !matches!(input.command, CommandKind::Preview) {
        return GateFinding::allow("gate.stage_order", "command has no ordering constraint");
    }
    let build_done = input
        .rails
        .is_some_and(|rails| rails.is_completed(kie_core::Stage::Build));
    if build_done {
        GateFinding::allow("gate.stage_order", "build stage is complete")
    } else {
        GateFinding::block(
            "gate.stage_order",
            "preview follows build; nothing has been built yet",
            "kie build presentation",
        )
    }
}

/// `build dashboard` requires Node at or above the configured floor.
fn check_toolchain(input: &PreGateInput<'_>) -> GateFinding {
    if !matches!(input.command, CommandKind::Build(BuildTarget::Dashboard)) {
        return GateFinding::allow("gate.toolchain", "command has no toolchain floor");
    }
    let floor = input.config.toolchain.node_floor_major;
    match input.env.node.as_deref().and_then(major_version) {
        Some(major) if major >= floor => {
            GateFinding::allow("gate.toolchain", format!("node {major} meets the floor {floor}"))
        }
        Some(major) => GateFinding::block(
            "gate.toolchain",
            format!("node {major} is below the required floor {floor}"),
            "kie doctor",
        ),
        None => GateFinding::block(
            "gate.toolchain",
            format!("node toolchain not found; dashboard builds require node >= {floor}"),
            "kie doctor",
        ),
    }
}

/// Advisory warnings about optional toolchains.
fn environment_warnings(input: &PreGateInput<'_>) -> GateReport {
    let mut report = GateReport::new();
    let builds_non_dashboard = matches!(
        input.command,
        CommandKind::Build(BuildTarget::Presentation) | CommandKind::Build(BuildTarget::Report)
    );
    if builds_non_dashboard && input.env.node.is_none() {
        report.push(GateFinding::warn(
            "gate.environment",
            "node toolchain not found; interactive variants of this target are unavailable",
            None,
        ));
    }
    if input.config.toolchain.python_optional
        && input.env.python.is_none()
        && matches!(input.command, CommandKind::Build(_))
    {
        report.push(GateFinding::warn(
            "gate.environment",
            "python toolchain not found; python-based export helpers are unavailable",
            None,
        ));
    }
    report
}

// ============================================================================
// SECTION: Post-Gate
// ============================================================================

/// Confirms produced artifacts and brand compliance after a handler ran.
///
/// Any failure downgrades the command to BLOCK; the rails never advance on
/// BLOCK.
#[must_use]
pub fn post_gate(
    workspace: &WorkspaceLayout,
    artifacts: &[ArtifactRef],
    validation: Option<&ValidationReport>,
) -> GateReport {
    let mut report = GateReport::new();
    for artifact in artifacts {
        if artifact.matches_disk(workspace.root()) {
            continue;
        }
        report.push(GateFinding::block(
            "post.artifacts",
            format!("declared artifact {} is absent or does not match its hash", artifact.path),
            "kie spec --repair",
        ));
        return report;
    }
    report.push(GateFinding::allow("post.artifacts", "declared artifacts verified on disk"));
    if let Some(validation) = validation {
        if validation.is_blocking() {
            report.push(GateFinding::block(
                "post.brand",
                validation.blocking_messages().join("; "),
                "kie build presentation",
            ));
            return report;
        }
        report.push(GateFinding::allow("post.brand", "validation passed"));
        for message in validation.advisory_messages() {
            report.push(GateFinding::warn("post.brand", message, None));
        }
    }
    report
}
