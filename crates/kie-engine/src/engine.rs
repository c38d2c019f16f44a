// crates/kie-engine/src/engine.rs
// ============================================================================
// Module: Command Dispatcher
// Description: Single-threaded orchestration of gates, handlers, and stores.
// Purpose: Own the one mutation surface for rails state, spec persistence,
// evidence, trust bundles, and recovery plans.
// Dependencies: crate::{commands, gates, handlers, probe}, kie-config, kie-core
// ============================================================================

//! ## Overview
//! The dispatcher executes one command at a time per workspace: pre-gate →
//! handler → post-gate → evidence write → rails advance → trust bundle. The
//! ordering guarantees hold within every run: inputs are hashed before
//! execution, outputs after, the evidence record lands once outputs are on
//! disk, and the rails state advances last. A BLOCK never mutates rails
//! state; a failed command never claims success.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;

use kie_config::EngineConfig;
use kie_core::ArtifactRef;
use kie_core::Clock;
use kie_core::EnvSnapshot;
use kie_core::EnvironmentInspector;
use kie_core::EvidenceRecord;
use kie_core::GateDecision;
use kie_core::GateFinding;
use kie_core::GateReport;
use kie_core::LedgerStore;
use kie_core::ProjectSpec;
use kie_core::RailsState;
use kie_core::RecoveryPlan;
use kie_core::RunId;
use kie_core::Stage;
use kie_core::Timestamp;
use kie_core::TrustBundle;
use kie_core::TrustExecuted;
use kie_core::TrustIdentity;
use kie_core::TrustStage;
use kie_core::WorkspaceLayout;
use kie_core::atomic_write;
use kie_core::runtime::FileLedger;
use kie_core::runtime::RailsStore;
use tracing::info;
use tracing::warn;

use crate::commands::CommandKind;
use crate::commands::SpecAction;
use crate::gates::PreGateInput;
use crate::gates::post_gate;
use crate::gates::pre_gate;
use crate::handlers;
use crate::handlers::HandlerContext;
use crate::handlers::HandlerError;
use crate::handlers::HandlerOutput;
use crate::probe::EnvironmentProbe;
use crate::probe::SystemClock;

// ============================================================================
// SECTION: Outcome Types
// ============================================================================

/// Final status of one command execution.
///
/// # Invariants
/// - Variants map one-to-one onto the CLI exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    /// Clean success; exit 0.
    Success,
    /// Success with advisory warnings; exit 4 when strict mode is off.
    SuccessWithWarnings,
    /// Policy block; exit 2. Never mutates rails state.
    Blocked,
    /// Unexpected failure; exit 3.
    Failed,
}

/// Result of one command execution, ready for CLI rendering.
///
/// # Invariants
/// - `summary` is a single line.
/// - `exit_code` follows the documented mapping.
#[derive(Debug, Clone)]
pub struct EngineOutcome {
    /// Final status.
    pub status: OutcomeStatus,
    /// Exit code the CLI should return.
    pub exit_code: u8,
    /// One-line outcome summary.
    pub summary: String,
    /// Warnings surfaced during the run.
    pub warnings: Vec<String>,
    /// Blocks surfaced during the run.
    pub blocks: Vec<String>,
    /// Extra lines for the CLI to print (doctor, status).
    pub info_lines: Vec<String>,
    /// Run identifier, when an evidence record was written.
    pub run_id: Option<RunId>,
    /// Recovery plan path, when one was written.
    pub recovery_path: Option<String>,
}

/// The next step the rails suggest.
///
/// # Invariants
/// - `Run` carries a command the engine can execute unattended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextStep {
    /// An executable next command.
    Run(CommandKind),
    /// The user must supply intent first.
    NeedsUser(String),
    /// The rails are complete.
    Done,
}

// ============================================================================
// SECTION: Engine
// ============================================================================

/// Workspace-scoped command dispatcher.
///
/// # Invariants
/// - Single-threaded: one command runs to completion before the next.
/// - Only this type writes rails state, spec files, evidence, and bundles.
pub struct Engine {
    /// Workspace layout.
    layout: WorkspaceLayout,
    /// Time source.
    clock: Box<dyn Clock>,
    /// Environment prober.
    inspector: Box<dyn EnvironmentInspector>,
}

impl Engine {
    /// Creates an engine over a workspace root with host facilities.
    #[must_use]
    pub fn new(root: impl Into<std::path::PathBuf>) -> Self {
        Self {
            layout: WorkspaceLayout::new(root),
            clock: Box::new(SystemClock),
            inspector: Box::new(EnvironmentProbe),
        }
    }

    /// Creates an engine with substitute host facilities (tests).
    #[must_use]
    pub fn with_parts(
        layout: WorkspaceLayout,
        clock: Box<dyn Clock>,
        inspector: Box<dyn EnvironmentInspector>,
    ) -> Self {
        Self {
            layout,
            clock,
            inspector,
        }
    }

    /// Returns the workspace layout.
    #[must_use]
    pub const fn layout(&self) -> &WorkspaceLayout {
        &self.layout
    }

    /// Executes one command to completion.
    pub fn execute(&self, command: &CommandKind) -> EngineOutcome {
        let run_id = RunId::mint();
        let now = self.clock.now();
        let env = self.inspector.probe();
        info!(command = command.verb(), run_id = %run_id, "command dispatched");

        let config = match EngineConfig::load(&self.layout.config_path()) {
            Ok(config) => config,
            Err(err) => {
                return self.finish_failed(command, &run_id, now, &env, err.to_string(), None);
            }
        };

        let spec = match self.load_spec() {
            Ok(spec) => spec,
            Err(detail) => {
                return self.finish_failed(command, &run_id, now, &env, detail, None);
            }
        };

        let repairing = matches!(command, CommandKind::Bootstrap | CommandKind::Spec(SpecAction::Repair));
        let rails = match RailsStore::new(self.layout.clone()).load() {
            Ok(rails) => rails,
            Err(err) if repairing => {
                warn!(detail = %err, "rails state unreadable; repair path continues");
                None
            }
            Err(err) => {
                return self.finish_blocked(
                    command,
                    &run_id,
                    now,
                    &env,
                    spec.as_ref(),
                    None,
                    GateReport {
                        findings: vec![GateFinding::block(
                            "gate.state_consistency",
                            format!("rails state is corrupt: {err}"),
                            "kie spec --repair",
                        )],
                    },
                );
            }
        };

        if let CommandKind::Go {
            full,
            showcase,
        } = command
        {
            return self.execute_go(*full, *showcase, &config);
        }

        let gate_input = PreGateInput {
            command,
            workspace: &self.layout,
            rails: rails.as_ref(),
            spec: spec.as_ref(),
            env: &env,
            config: &config,
        };
        let pre_report = pre_gate(&gate_input);
        if pre_report.decision() == GateDecision::Block {
            return self.finish_blocked(
                command,
                &run_id,
                now,
                &env,
                spec.as_ref(),
                rails.as_ref(),
                pre_report,
            );
        }

        let inputs = self.hash_inputs(command, spec.as_ref());
        let ctx = HandlerContext {
            workspace: &self.layout,
            config: &config,
            spec: spec.as_ref(),
            rails: rails.as_ref(),
            env: &env,
        };
        let handled = self.run_handler(&ctx, command, spec.as_ref(), rails.as_ref(), &config);
        let output = match handled {
            Ok(output) => output,
            Err(HandlerError::Blocked {
                message,
                remediation,
            }) => {
                let mut report = pre_report;
                report.push(GateFinding::block(
                    "handler.blocked",
                    message,
                    remediation.unwrap_or_else(|| "kie status".to_string()),
                ));
                return self.finish_blocked(
                    command,
                    &run_id,
                    now,
                    &env,
                    spec.as_ref(),
                    rails.as_ref(),
                    report,
                );
            }
            Err(HandlerError::Failed(detail)) => {
                return self.finish_failed(command, &run_id, now, &env, detail, spec.as_ref());
            }
        };

        let post_report = post_gate(&self.layout, &output.artifacts, output.validation.as_ref());
        let mut gate_report = pre_report;
        gate_report.extend(post_report);
        if gate_report.decision() == GateDecision::Block {
            return self.finish_post_blocked(
                command,
                &run_id,
                now,
                &env,
                spec.as_ref(),
                rails.as_ref(),
                gate_report,
                inputs,
                output,
            );
        }

        self.finish_success(
            command,
            &run_id,
            now,
            &env,
            spec,
            rails,
            &config,
            gate_report,
            inputs,
            output,
        )
    }

    /// Runs the handler matching the command.
    fn run_handler(
        &self,
        ctx: &HandlerContext<'_>,
        command: &CommandKind,
        spec: Option<&ProjectSpec>,
        rails: Option<&RailsState>,
        config: &EngineConfig,
    ) -> Result<HandlerOutput, HandlerError> {
        match command {
            CommandKind::Bootstrap => handlers::handle_bootstrap(ctx),
            CommandKind::Doctor => handlers::handle_doctor(ctx),
            CommandKind::Status => {
                let next = self.next_action_text(spec, rails, config);
                handlers::handle_status(ctx, &next)
            }
            CommandKind::Interview(input) => handlers::handle_interview(ctx, input),
            CommandKind::Spec(action) => handlers::handle_spec(ctx, action),
            CommandKind::Theme(theme) => handlers::handle_theme(ctx, *theme),
            CommandKind::Eda {
                file,
            } => handlers::handle_eda(ctx, file.as_deref()),
            CommandKind::Analyze => handlers::handle_analyze(ctx),
            CommandKind::Build(target) => handlers::handle_build(ctx, *target),
            CommandKind::Preview => handlers::handle_preview(ctx),
            CommandKind::Validate {
                mode,
            } => handlers::handle_validate(ctx, mode.as_deref()),
            CommandKind::Go {
                ..
            } => Err(HandlerError::Failed("go is dispatched before handlers".to_string())),
        }
    }

    // ------------------------------------------------------------------
    // Go
    // ------------------------------------------------------------------

    /// Executes the next rails-suggested step, or the full remaining chain.
    fn execute_go(&self, full: bool, showcase: bool, config: &EngineConfig) -> EngineOutcome {
        if showcase {
            return Self::showcase_outcome();
        }
        let mut last: Option<EngineOutcome> = None;
        // Hard cap: the chain is at most one command per remaining stage.
        for _ in 0..STAGE_CHAIN_CAP {
            let spec = match self.load_spec() {
                Ok(spec) => spec,
                Err(detail) => {
                    return outcome(OutcomeStatus::Failed, detail, Vec::new(), Vec::new());
                }
            };
            let rails = RailsStore::new(self.layout.clone()).load().ok().flatten();
            let step = self.suggest_next(spec.as_ref(), rails.as_ref(), config);
            match step {
                NextStep::Done => {
                    return last.unwrap_or_else(|| {
                        outcome(
                            OutcomeStatus::Success,
                            "rails complete; nothing left to run".to_string(),
                            Vec::new(),
                            Vec::new(),
                        )
                    });
                }
                NextStep::NeedsUser(action) => {
                    let mut blocked = outcome(
                        OutcomeStatus::Blocked,
                        format!("the next step needs your input: {action}"),
                        Vec::new(),
                        vec![action.clone()],
                    );
                    blocked.recovery_path = self
                        .write_recovery_plan(
                            "the next rails step needs user intent",
                            "no evidence record exists for the missing step",
                            vec![action],
                        )
                        .ok();
                    return blocked;
                }
                NextStep::Run(command) => {
                    let result = self.execute(&command);
                    let stop = result.status != OutcomeStatus::Success
                        && result.status != OutcomeStatus::SuccessWithWarnings;
                    let done = !full;
                    let summary = format!("go ran `kie {}`: {}", command.verb(), result.summary);
                    let result = EngineOutcome {
                        summary,
                        ..result
                    };
                    if stop || done {
                        return result;
                    }
                    last = Some(result);
                }
            }
        }
        last.unwrap_or_else(|| {
            outcome(
                OutcomeStatus::Failed,
                "go exceeded the stage chain cap without completing".to_string(),
                Vec::new(),
                Vec::new(),
            )
        })
    }

    /// Suggests the next rails step.
    #[must_use]
    pub fn suggest_next(
        &self,
        spec: Option<&ProjectSpec>,
        rails: Option<&RailsState>,
        _config: &EngineConfig,
    ) -> NextStep {
        if !self.layout.is_workspace() {
            return NextStep::Run(CommandKind::Bootstrap);
        }
        let Some(rails) = rails else {
            return NextStep::Run(CommandKind::Bootstrap);
        };
        match rails.next_stage() {
            Some(Stage::Spec) => match spec {
                Some(spec) if spec.is_complete() => NextStep::Run(CommandKind::Eda {
                    file: None,
                }),
                _ => NextStep::NeedsUser(
                    "kie interview --objective \"<objective>\"".to_string(),
                ),
            },
            Some(Stage::Eda) => NextStep::Run(CommandKind::Eda {
                file: None,
            }),
            Some(Stage::Analyze) => NextStep::Run(CommandKind::Analyze),
            Some(Stage::Build) => {
                let Some(spec) = spec else {
                    return NextStep::NeedsUser("kie spec --init <project-name>".to_string());
                };
                if spec.theme.is_none() {
                    return NextStep::NeedsUser("kie theme dark".to_string());
                }
                NextStep::Run(CommandKind::Build(handlers::default_build_target(
                    spec.project_type,
                )))
            }
            Some(Stage::Preview) => NextStep::Run(CommandKind::Preview),
            Some(Stage::Startkie) | None => NextStep::Done,
        }
    }

    /// Renders the next action as a CLI line.
    fn next_action_text(
        &self,
        spec: Option<&ProjectSpec>,
        rails: Option<&RailsState>,
        config: &EngineConfig,
    ) -> String {
        match self.suggest_next(spec, rails, config) {
            NextStep::Run(command) => match &command {
                CommandKind::Build(target) => format!("kie build {target}"),
                CommandKind::Eda {
                    ..
                } => "kie eda".to_string(),
                other => format!("kie {}", other.verb()),
            },
            NextStep::NeedsUser(action) => action,
            NextStep::Done => "kie status".to_string(),
        }
    }

    /// Produces the showcase walkthrough without touching any state.
    fn showcase_outcome() -> EngineOutcome {
        let lines = vec![
            "showcase: what a full run looks like".to_string(),
            "  1. kie bootstrap           — workspace skeleton and marker".to_string(),
            "  2. kie interview …         — capture objective, client, theme".to_string(),
            "  3. kie eda                 — profile the data".to_string(),
            "  4. kie analyze             — insights, mapping, plan".to_string(),
            "  5. kie build presentation  — brand-compliant charts and exports".to_string(),
            "  6. kie preview             — inspect the result".to_string(),
        ];
        EngineOutcome {
            info_lines: lines,
            ..outcome(
                OutcomeStatus::Success,
                "showcase walkthrough printed; no state was changed".to_string(),
                Vec::new(),
                Vec::new(),
            )
        }
    }

    // ------------------------------------------------------------------
    // State loading and hashing
    // ------------------------------------------------------------------

    /// Loads the spec, when one exists.
    fn load_spec(&self) -> Result<Option<ProjectSpec>, String> {
        let path = self.layout.spec_path();
        if !path.is_file() {
            return Ok(None);
        }
        let contents =
            fs::read_to_string(&path).map_err(|err| format!("cannot read spec.yaml: {err}"))?;
        ProjectSpec::from_yaml(&contents)
            .map(Some)
            .map_err(|err| format!("spec.yaml is unreadable: {err}"))
    }

    /// Hashes the command's input artifacts before execution.
    fn hash_inputs(&self, command: &CommandKind, spec: Option<&ProjectSpec>) -> Vec<ArtifactRef> {
        let mut candidates: Vec<String> = Vec::new();
        if self.layout.spec_path().is_file() {
            candidates.push("project_state/spec.yaml".to_string());
        }
        match command {
            CommandKind::Eda {
                ..
            }
            | CommandKind::Analyze
            | CommandKind::Build(_) => {
                if let Some(spec) = spec {
                    candidates.extend(spec.data_sources.iter().cloned());
                }
                if let Ok(files) = self.layout.list_data_files() {
                    for file in files {
                        if let Some(relative) = self.layout.relative(&file) {
                            candidates.push(relative);
                        }
                    }
                }
            }
            _ => {}
        }
        match command {
            CommandKind::Analyze => candidates.push("outputs/eda_profile.json".to_string()),
            CommandKind::Build(_) => {
                candidates.push("outputs/visualization_plan.json".to_string());
                candidates.push("outputs/column_mapping.json".to_string());
            }
            CommandKind::Preview => {
                candidates.push("outputs/visualization_plan.json".to_string());
            }
            _ => {}
        }
        candidates.sort();
        candidates.dedup();
        candidates
            .into_iter()
            .filter(|relative| self.layout.root().join(relative).is_file())
            .filter_map(|relative| ArtifactRef::from_file(self.layout.root(), &relative).ok())
            .collect()
    }

    // ------------------------------------------------------------------
    // Finalization
    // ------------------------------------------------------------------

    /// Finalizes a clean or warning success.
    #[allow(clippy::too_many_arguments, reason = "Finalization needs the full run context.")]
    fn finish_success(
        &self,
        command: &CommandKind,
        run_id: &RunId,
        now: Timestamp,
        env: &EnvSnapshot,
        spec: Option<ProjectSpec>,
        rails: Option<RailsState>,
        config: &EngineConfig,
        gate_report: GateReport,
        inputs: Vec<ArtifactRef>,
        output: HandlerOutput,
    ) -> EngineOutcome {
        // Persist the spec first: rails completion checks read the new value.
        let spec = match &output.spec_after {
            Some(updated) => {
                if let Err(err) = self.persist_spec(updated) {
                    return self.finish_failed(command, run_id, now, env, err, spec.as_ref());
                }
                Some(updated.clone())
            }
            None => spec,
        };

        let stage_before = rails.as_ref().map_or(Stage::Startkie, |state| state.current_stage);
        let rails_after = self.advance_rails(command, rails, &spec, &output, now);
        let rails_after = match rails_after {
            Ok(rails_after) => rails_after,
            Err(detail) => {
                return self.finish_failed(command, run_id, now, env, detail, spec.as_ref());
            }
        };
        let stage_after = rails_after.as_ref().map_or(stage_before, |state| state.current_stage);

        let warnings: Vec<String> = gate_report
            .warnings()
            .into_iter()
            .chain(output.warnings.iter().cloned())
            .collect();
        let record = EvidenceRecord {
            run_id: run_id.clone(),
            timestamp: now,
            command: command.verb().to_string(),
            args: command_args(command),
            stage_before,
            stage_after,
            env: env.clone(),
            inputs,
            outputs: output.artifacts.clone(),
            invalid_outputs: Vec::new(),
            policies_applied: gate_report.policies_applied(),
            skills_executed: output.skills_executed.clone(),
            success: true,
            warnings: warnings.clone(),
            blocks: Vec::new(),
        };
        // A non-workspace directory stays untouched: read-only verbs may run
        // anywhere, but ledgers and bundles exist only inside a workspace.
        if self.layout.is_workspace() {
            self.write_evidence(&record);
            self.write_trust_bundle(&record, spec.as_ref(), rails_after.as_ref(), config);
        }

        let mut recovery_path = None;
        if warnings.is_empty() {
            let _ = fs::remove_file(self.layout.recovery_plan_path());
        } else if self.layout.is_workspace() {
            recovery_path = self
                .write_recovery_plan(
                    "command succeeded with warnings",
                    format!("see evidence record {run_id}"),
                    vec!["kie doctor".to_string()],
                )
                .ok();
        }

        let status = if warnings.is_empty() {
            OutcomeStatus::Success
        } else {
            OutcomeStatus::SuccessWithWarnings
        };
        EngineOutcome {
            info_lines: output.info_lines,
            run_id: Some(run_id.clone()),
            recovery_path,
            ..outcome(status, output.summary, warnings, Vec::new())
        }
    }

    /// Finalizes a pre-gate or handler block. Rails state is untouched.
    #[allow(clippy::too_many_arguments, reason = "Finalization needs the full run context.")]
    fn finish_blocked(
        &self,
        command: &CommandKind,
        run_id: &RunId,
        now: Timestamp,
        env: &EnvSnapshot,
        spec: Option<&ProjectSpec>,
        rails: Option<&RailsState>,
        gate_report: GateReport,
    ) -> EngineOutcome {
        let blocks = gate_report.blocks();
        let warnings = gate_report.warnings();
        let stage = rails.map_or(Stage::Startkie, |state| state.current_stage);
        let record = EvidenceRecord {
            run_id: run_id.clone(),
            timestamp: now,
            command: command.verb().to_string(),
            args: command_args(command),
            stage_before: stage,
            stage_after: stage,
            env: env.clone(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            invalid_outputs: Vec::new(),
            policies_applied: gate_report.policies_applied(),
            skills_executed: Vec::new(),
            success: false,
            warnings: warnings.clone(),
            blocks: blocks.clone(),
        };
        if self.layout.is_workspace() {
            self.write_evidence(&record);
            if let Ok(config) = EngineConfig::load(&self.layout.config_path()) {
                self.write_trust_bundle(&record, spec, rails, &config);
            }
        }
        let fix = gate_report
            .first_block()
            .and_then(|finding| finding.remediation.clone())
            .map_or_else(|| vec!["kie status".to_string()], |remediation| vec![remediation]);
        let cause = format!("evidence record {run_id} lists the blocking policy");
        let summary = blocks.first().cloned().unwrap_or_else(|| "blocked".to_string());
        let recovery_path = if self.layout.is_workspace() {
            self.write_recovery_plan(&summary, cause, fix).ok()
        } else {
            None
        };
        EngineOutcome {
            run_id: Some(run_id.clone()),
            recovery_path,
            ..outcome(OutcomeStatus::Blocked, summary, warnings, blocks)
        }
    }

    /// Finalizes a post-gate block: outputs stay on disk but are invalid.
    #[allow(clippy::too_many_arguments, reason = "Finalization needs the full run context.")]
    fn finish_post_blocked(
        &self,
        command: &CommandKind,
        run_id: &RunId,
        now: Timestamp,
        env: &EnvSnapshot,
        spec: Option<&ProjectSpec>,
        rails: Option<&RailsState>,
        gate_report: GateReport,
        inputs: Vec<ArtifactRef>,
        output: HandlerOutput,
    ) -> EngineOutcome {
        let blocks = gate_report.blocks();
        let warnings: Vec<String> = gate_report
            .warnings()
            .into_iter()
            .chain(output.warnings.iter().cloned())
            .collect();
        let stage = rails.map_or(Stage::Startkie, |state| state.current_stage);
        let record = EvidenceRecord {
            run_id: run_id.clone(),
            timestamp: now,
            command: command.verb().to_string(),
            args: command_args(command),
            stage_before: stage,
            stage_after: stage,
            env: env.clone(),
            inputs,
            outputs: Vec::new(),
            invalid_outputs: output.artifacts.clone(),
            policies_applied: gate_report.policies_applied(),
            skills_executed: output.skills_executed.clone(),
            success: false,
            warnings: warnings.clone(),
            blocks: blocks.clone(),
        };
        self.write_evidence(&record);
        if let Ok(config) = EngineConfig::load(&self.layout.config_path()) {
            self.write_trust_bundle(&record, spec, rails, &config);
        }
        let fix = gate_report
            .first_block()
            .and_then(|finding| finding.remediation.clone())
            .map_or_else(|| vec!["kie validate".to_string()], |remediation| vec![remediation]);
        let summary = blocks.first().cloned().unwrap_or_else(|| "blocked".to_string());
        let cause = format!(
            "evidence record {run_id} marks the produced outputs invalid; they remain on disk"
        );
        let recovery_path = self.write_recovery_plan(&summary, cause, fix).ok();
        EngineOutcome {
            run_id: Some(run_id.clone()),
            recovery_path,
            ..outcome(OutcomeStatus::Blocked, summary, warnings, blocks)
        }
    }

    /// Finalizes an unexpected failure.
    fn finish_failed(
        &self,
        command: &CommandKind,
        run_id: &RunId,
        now: Timestamp,
        env: &EnvSnapshot,
        detail: String,
        _spec: Option<&ProjectSpec>,
    ) -> EngineOutcome {
        warn!(command = command.verb(), detail = %detail, "command failed");
        if self.layout.is_workspace() {
            let stage = RailsStore::new(self.layout.clone())
                .load()
                .ok()
                .flatten()
                .map_or(Stage::Startkie, |state| state.current_stage);
            let record = EvidenceRecord {
                run_id: run_id.clone(),
                timestamp: now,
                command: command.verb().to_string(),
                args: command_args(command),
                stage_before: stage,
                stage_after: stage,
                env: env.clone(),
                inputs: Vec::new(),
                outputs: Vec::new(),
                invalid_outputs: Vec::new(),
                policies_applied: Vec::new(),
                skills_executed: Vec::new(),
                success: false,
                warnings: Vec::new(),
                blocks: vec![detail.clone()],
            };
            self.write_evidence(&record);
        }
        let recovery_path = if self.layout.is_workspace() {
            self.write_recovery_plan(
                &detail,
                format!("evidence record {run_id} carries the failure"),
                vec!["kie doctor".to_string()],
            )
            .ok()
        } else {
            None
        };
        EngineOutcome {
            run_id: Some(run_id.clone()),
            recovery_path,
            ..outcome(OutcomeStatus::Failed, detail, Vec::new(), Vec::new())
        }
    }

    // ------------------------------------------------------------------
    // Mutation surface
    // ------------------------------------------------------------------

    /// Persists the spec atomically.
    fn persist_spec(&self, spec: &ProjectSpec) -> Result<(), String> {
        let yaml = spec.to_yaml().map_err(|err| err.to_string())?;
        atomic_write(&self.layout.spec_path(), yaml.as_bytes()).map_err(|err| err.to_string())
    }

    /// Applies rails mutations for a successful command.
    fn advance_rails(
        &self,
        command: &CommandKind,
        rails: Option<RailsState>,
        spec: &Option<ProjectSpec>,
        output: &HandlerOutput,
        now: Timestamp,
    ) -> Result<Option<RailsState>, String> {
        let store = RailsStore::new(self.layout.clone());
        let mut rails = rails;

        if matches!(command, CommandKind::Bootstrap) && rails.is_none() {
            let fresh = RailsState::new(now);
            store.save(&fresh).map_err(|err| err.to_string())?;
            return Ok(Some(fresh));
        }

        if let Some(reset_stage) = output.rails_reset {
            let mut state = rails.unwrap_or_else(|| RailsState::new(now));
            state.reset_to(reset_stage, now);
            store.save(&state).map_err(|err| err.to_string())?;
            return Ok(Some(state));
        }

        let Some(state) = rails.as_mut() else {
            return Ok(rails);
        };
        let mut dirty = false;

        // The spec is user-owned: a hand-written complete spec counts as the
        // spec stage the first time a pipeline command runs over it.
        if matches!(command.completes_stage(), Some(Stage::Eda))
            && !state.is_completed(Stage::Spec)
            && spec.as_ref().is_some_and(ProjectSpec::is_complete)
        {
            state
                .attempt_transition(Stage::Spec, Vec::new(), true, now)
                .map_err(|err| err.to_string())?;
            dirty = true;
        }

        match command.completes_stage() {
            Some(Stage::Spec) => {
                let complete = spec.as_ref().is_some_and(ProjectSpec::is_complete);
                if complete && !state.is_completed(Stage::Spec) {
                    state
                        .attempt_transition(Stage::Spec, output.artifacts.clone(), true, now)
                        .map_err(|err| err.to_string())?;
                    dirty = true;
                }
            }
            Some(target @ (Stage::Eda | Stage::Analyze | Stage::Build | Stage::Preview)) => {
                state
                    .attempt_transition(target, output.artifacts.clone(), true, now)
                    .map_err(|err| err.to_string())?;
                dirty = true;
                if let Some(sub_goal) = output.sub_goal {
                    state.record_sub_goal(sub_goal, now);
                }
            }
            Some(Stage::Startkie) | None => {}
        }

        if dirty {
            store.save(state).map_err(|err| err.to_string())?;
        }
        Ok(rails)
    }

    /// Appends the evidence record; a write failure is surfaced as a warning
    /// in logs but never invents success.
    fn write_evidence(&self, record: &EvidenceRecord) {
        let ledger = FileLedger::new(self.layout.clone());
        if let Err(err) = ledger.append(record) {
            warn!(detail = %err, "evidence write failed");
        }
    }

    /// Regenerates the trust bundle in both forms.
    fn write_trust_bundle(
        &self,
        record: &EvidenceRecord,
        spec: Option<&ProjectSpec>,
        rails: Option<&RailsState>,
        config: &EngineConfig,
    ) {
        let identity = spec.map_or_else(TrustIdentity::default, |spec| TrustIdentity {
            project_name: spec.project_name.clone(),
            client: spec.client.clone(),
            objective: spec.objective.clone(),
            project_type: spec.project_type.to_string(),
        });
        let stage = TrustStage {
            current: rails.map_or(Stage::Startkie, |state| state.current_stage),
            completed: rails.map_or_else(|| vec![Stage::Startkie], |state| {
                state.completed_stages.clone()
            }),
        };
        let executed = TrustExecuted {
            command: record.command.clone(),
            args: record.args.clone(),
            success: record.success,
            timestamp: record.timestamp,
        };
        let missing = self.missing_for_next(spec, rails);
        let next_actions = vec![self.next_action_text(spec, rails, config)];
        let bundle = TrustBundle::new(
            identity,
            stage,
            executed,
            record.outputs.clone(),
            record.skills_executed.clone(),
            record.warnings.clone(),
            record.blocks.clone(),
            missing,
            next_actions,
        );
        if let Err(err) = atomic_write(
            &self.layout.trust_bundle_md_path(),
            bundle.render_markdown().as_bytes(),
        ) {
            warn!(detail = %err, "trust bundle markdown write failed");
        }
        match serde_json::to_vec_pretty(&bundle) {
            Ok(json) => {
                if let Err(err) = atomic_write(&self.layout.trust_bundle_json_path(), &json) {
                    warn!(detail = %err, "trust bundle json write failed");
                }
            }
            Err(err) => warn!(detail = %err, "trust bundle serialization failed"),
        }
    }

    /// Lists what is missing before the next stage can run.
    fn missing_for_next(
        &self,
        spec: Option<&ProjectSpec>,
        rails: Option<&RailsState>,
    ) -> Vec<String> {
        let mut missing = Vec::new();
        let next = rails.and_then(RailsState::next_stage);
        match next {
            Some(Stage::Spec) => {
                match spec {
                    Some(spec) => {
                        for field in spec.missing_fields() {
                            missing.push(format!("spec field {field}"));
                        }
                    }
                    None => missing.push("a spec document".to_string()),
                }
            }
            Some(Stage::Eda) => {
                let has_data = self
                    .layout
                    .list_data_files()
                    .map(|files| !files.is_empty())
                    .unwrap_or(false);
                if !has_data {
                    missing.push("a data file under data/".to_string());
                }
            }
            Some(Stage::Analyze) => {
                if !self.layout.eda_profile_json_path().is_file() {
                    missing.push("the EDA profile".to_string());
                }
            }
            Some(Stage::Build) => {
                if !self.layout.visualization_plan_path().is_file() {
                    missing.push("the visualization plan".to_string());
                }
                if spec.is_none_or(|spec| spec.theme.is_none()) {
                    missing.push("an explicit theme".to_string());
                }
            }
            Some(Stage::Preview) => {
                if self
                    .layout
                    .charts_dir()
                    .read_dir()
                    .map(|mut dir| dir.next().is_none())
                    .unwrap_or(true)
                {
                    missing.push("built chart configurations".to_string());
                }
            }
            Some(Stage::Startkie) | None => {}
        }
        missing
    }

    /// Writes the recovery plan, returning its workspace-relative path.
    fn write_recovery_plan(
        &self,
        summary: &str,
        cause: impl Into<String>,
        fix: Vec<String>,
    ) -> Result<String, String> {
        let plan = RecoveryPlan::new(
            summary,
            cause,
            fix,
            vec!["kie status".to_string(), "kie validate".to_string()],
            vec!["kie doctor".to_string()],
        )
        .or_else(|_| {
            RecoveryPlan::new(
                summary,
                "the original remediation was not a CLI command",
                vec!["kie status".to_string()],
                vec!["kie validate".to_string()],
                vec!["kie doctor".to_string()],
            )
        })
        .map_err(|err| err.to_string())?;
        atomic_write(
            &self.layout.recovery_plan_path(),
            plan.render_markdown().as_bytes(),
        )
        .map_err(|err| err.to_string())?;
        Ok("project_state/recovery_plan.md".to_string())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Upper bound on commands one `go --full` invocation may chain.
const STAGE_CHAIN_CAP: usize = 8;

/// Builds an outcome with the documented exit mapping.
fn outcome(
    status: OutcomeStatus,
    summary: String,
    warnings: Vec<String>,
    blocks: Vec<String>,
) -> EngineOutcome {
    let exit_code = match status {
        OutcomeStatus::Success => 0,
        OutcomeStatus::SuccessWithWarnings => 4,
        OutcomeStatus::Blocked => 2,
        OutcomeStatus::Failed => 3,
    };
    EngineOutcome {
        status,
        exit_code,
        summary,
        warnings,
        blocks,
        info_lines: Vec::new(),
        run_id: None,
        recovery_path: None,
    }
}

/// Renders command arguments as recorded in evidence.
fn command_args(command: &CommandKind) -> Vec<String> {
    match command {
        CommandKind::Interview(input) => {
            let mut args = Vec::new();
            if let Some(objective) = &input.objective {
                args.push(format!("--objective={objective}"));
            }
            if let Some(client) = &input.client {
                args.push(format!("--client={client}"));
            }
            if let Some(project_type) = &input.project_type {
                args.push(format!("--project-type={project_type}"));
            }
            if let Some(theme) = &input.theme {
                args.push(format!("--theme={theme}"));
            }
            if let Some(data) = &input.data {
                args.push(format!("--data={data}"));
            }
            args
        }
        CommandKind::Spec(SpecAction::Init {
            project_name,
        }) => vec!["--init".to_string(), project_name.clone()],
        CommandKind::Spec(SpecAction::Set {
            key,
            value,
        }) => vec!["--set".to_string(), format!("{key}={value}")],
        CommandKind::Spec(SpecAction::Repair) => vec!["--repair".to_string()],
        CommandKind::Theme(theme) => vec![theme.to_string()],
        CommandKind::Eda {
            file: Some(file),
        } => vec![file.clone()],
        CommandKind::Build(target) => vec![target.to_string()],
        CommandKind::Validate {
            mode: Some(mode),
        } => vec![format!("--mode={mode}")],
        CommandKind::Go {
            full,
            showcase,
        } => {
            let mut args = Vec::new();
            if *full {
                args.push("--full".to_string());
            }
            if *showcase {
                args.push("--showcase".to_string());
            }
            args
        }
        _ => Vec::new(),
    }
}
