// crates/kie-cli/src/main.rs
// ============================================================================
// Module: KIE CLI Entry Point
// Description: Command dispatcher for the Kearney Insight Engine workspace.
// Purpose: Provide the single CLI surface over the gated engine.
// Dependencies: clap, kie-core, kie-engine, serde_json, thiserror,
// tracing-subscriber
// ============================================================================

//! ## Overview
//! The `kie` binary maps the CLI surface onto the engine's command
//! vocabulary, renders outcomes, and returns the documented exit codes:
//! 0 success, 2 BLOCK, 3 FAIL, 4 WARN-with-success. All user-facing strings
//! route through the i18n catalog. The engine never reads stdin; every user
//! decision arrives as a flag or a prior command.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use kie_cli::t;
use kie_core::BuildTarget;
use kie_core::Theme;
use kie_engine::CommandKind;
use kie_engine::Engine;
use kie_engine::EngineOutcome;
use kie_engine::InterviewInput;
use kie_engine::OutcomeStatus;
use kie_engine::SpecAction;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Surface
// ============================================================================

/// Kearney Insight Engine command line.
#[derive(Parser, Debug)]
#[command(name = "kie", version, about = "Workspace-scoped insight engine")]
struct Cli {
    /// Workspace root directory.
    #[arg(long, value_name = "DIR", default_value = ".")]
    workspace: PathBuf,
    /// Command to execute.
    #[command(subcommand)]
    command: Commands,
}

/// CLI commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Ensure the workspace skeleton and marker.
    Bootstrap,
    /// Report environment facts; never changes state.
    Doctor,
    /// Print current stage, completed stages, and the next suggested command.
    #[command(alias = "rails")]
    Status {
        /// Print the machine-readable trust bundle instead.
        #[arg(long, action = ArgAction::SetTrue)]
        json: bool,
    },
    /// Capture requirements into the spec (flag-driven; never reads stdin).
    Interview(InterviewArgs),
    /// Initialize, set, or repair the spec.
    Spec(SpecArgs),
    /// Set the deliverable theme; required before `build`.
    Theme {
        /// Theme to use.
        #[arg(value_enum)]
        theme: CliTheme,
    },
    /// Produce the EDA profile.
    Eda {
        /// Data file override, workspace-relative.
        file: Option<String>,
    },
    /// Produce insights, column mapping, and the visualization plan.
    Analyze,
    /// Consume the visualization plan and produce exports.
    Build {
        /// Deliverable target.
        #[arg(value_enum)]
        target: CliTarget,
    },
    /// Render the latest outputs for inspection.
    Preview,
    /// Run the brand validator standalone.
    Validate {
        /// Mode override.
        #[arg(long, value_enum)]
        mode: Option<CliMode>,
    },
    /// Execute the next rails-suggested step.
    Go {
        /// Execute the full remaining chain.
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
        /// Print the showcase walkthrough; never mutates rails state.
        #[arg(long, action = ArgAction::SetTrue)]
        showcase: bool,
    },
}

/// Arguments for the interview command.
#[derive(Args, Debug)]
struct InterviewArgs {
    /// Project name.
    #[arg(long, value_name = "NAME")]
    project_name: Option<String>,
    /// Natural-language objective.
    #[arg(long, value_name = "TEXT")]
    objective: Option<String>,
    /// Client name.
    #[arg(long, value_name = "NAME")]
    client: Option<String>,
    /// Project type (analytics, presentation, dashboard, modeling, proposal, research).
    #[arg(long, value_name = "TYPE")]
    project_type: Option<String>,
    /// Theme (dark or light).
    #[arg(long, value_name = "THEME")]
    theme: Option<String>,
    /// Comma-separated data sources.
    #[arg(long, value_name = "FILES")]
    data: Option<String>,
}

/// Arguments for the spec command.
#[derive(Args, Debug)]
struct SpecArgs {
    /// Initialize a fresh spec with the given project name.
    #[arg(long, value_name = "NAME")]
    init: Option<String>,
    /// Set one field as `key=value`.
    #[arg(long, value_name = "KEY=VALUE")]
    set: Option<String>,
    /// Repair engine state: re-verify artifacts and reset the rails.
    #[arg(long, action = ArgAction::SetTrue)]
    repair: bool,
}

/// Theme values accepted by the CLI.
#[derive(ValueEnum, Copy, Clone, Debug)]
enum CliTheme {
    /// Dark backgrounds with light text.
    Dark,
    /// Light backgrounds with dark text.
    Light,
}

impl From<CliTheme> for Theme {
    fn from(theme: CliTheme) -> Self {
        match theme {
            CliTheme::Dark => Self::Dark,
            CliTheme::Light => Self::Light,
        }
    }
}

/// Build targets accepted by the CLI.
#[derive(ValueEnum, Copy, Clone, Debug)]
enum CliTarget {
    /// Slide-deck deliverable.
    Presentation,
    /// Interactive dashboard deliverable.
    Dashboard,
    /// Written report deliverable.
    Report,
}

impl From<CliTarget> for BuildTarget {
    fn from(target: CliTarget) -> Self {
        match target {
            CliTarget::Presentation => Self::Presentation,
            CliTarget::Dashboard => Self::Dashboard,
            CliTarget::Report => Self::Report,
        }
    }
}

/// Validation modes accepted by the CLI.
#[derive(ValueEnum, Copy, Clone, Debug)]
enum CliMode {
    /// Warnings also block.
    Strict,
    /// Only critical findings block.
    Lenient,
}

impl CliMode {
    /// Returns the engine wire form of the mode.
    const fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Lenient => "lenient",
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for catalog-routed error messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    let filter = tracing_subscriber::EnvFilter::try_from_env("KIE_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
    match run() {
        Ok(code) => code,
        Err(err) => {
            let _ = write_stderr_line(&err.to_string());
            ExitCode::from(3)
        }
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let engine = Engine::new(cli.workspace.clone());

    let command = match cli.command {
        Commands::Bootstrap => CommandKind::Bootstrap,
        Commands::Doctor => CommandKind::Doctor,
        Commands::Status {
            json,
        } => {
            if json {
                return print_trust_bundle_json(&engine);
            }
            CommandKind::Status
        }
        Commands::Interview(args) => CommandKind::Interview(InterviewInput {
            project_name: args.project_name,
            objective: args.objective,
            client: args.client,
            project_type: args.project_type,
            theme: args.theme,
            data: args.data,
        }),
        Commands::Spec(args) => CommandKind::Spec(parse_spec_action(args)?),
        Commands::Theme {
            theme,
        } => CommandKind::Theme(theme.into()),
        Commands::Eda {
            file,
        } => CommandKind::Eda {
            file,
        },
        Commands::Analyze => CommandKind::Analyze,
        Commands::Build {
            target,
        } => CommandKind::Build(target.into()),
        Commands::Preview => CommandKind::Preview,
        Commands::Validate {
            mode,
        } => CommandKind::Validate {
            mode: mode.map(|mode| mode.as_str().to_string()),
        },
        Commands::Go {
            full,
            showcase,
        } => CommandKind::Go {
            full,
            showcase,
        },
    };

    let outcome = engine.execute(&command);
    render_outcome(&outcome)?;
    Ok(ExitCode::from(outcome.exit_code))
}

/// Converts spec flags into exactly one action.
fn parse_spec_action(args: SpecArgs) -> CliResult<SpecAction> {
    let selected =
        usize::from(args.init.is_some()) + usize::from(args.set.is_some()) + usize::from(args.repair);
    if selected != 1 {
        return Err(CliError::new(
            "spec requires exactly one of --init, --set, --repair".to_string(),
        ));
    }
    if let Some(project_name) = args.init {
        return Ok(SpecAction::Init {
            project_name,
        });
    }
    if let Some(assignment) = args.set {
        let Some((key, value)) = assignment.split_once('=') else {
            return Err(CliError::new(format!(
                "--set expects key=value, got {assignment:?}"
            )));
        };
        return Ok(SpecAction::Set {
            key: key.trim().to_string(),
            value: value.trim().to_string(),
        });
    }
    Ok(SpecAction::Repair)
}

// ============================================================================
// SECTION: Rendering
// ============================================================================

/// Renders an engine outcome to stdout.
fn render_outcome(outcome: &EngineOutcome) -> CliResult<()> {
    for line in &outcome.info_lines {
        write_line(line)?;
    }
    let summary = match outcome.status {
        OutcomeStatus::Success => t!("outcome.ok", summary = outcome.summary),
        OutcomeStatus::SuccessWithWarnings => t!("outcome.ok_warn", summary = outcome.summary),
        OutcomeStatus::Blocked => t!("outcome.blocked", summary = outcome.summary),
        OutcomeStatus::Failed => t!("outcome.failed", summary = outcome.summary),
    };
    write_line(&summary)?;
    for warning in &outcome.warnings {
        write_line(&t!("outcome.warning", message = warning))?;
    }
    for block in &outcome.blocks {
        write_line(&t!("outcome.block", message = block))?;
    }
    if let Some(run_id) = &outcome.run_id {
        write_line(&t!("outcome.run", run_id = run_id))?;
    }
    if let Some(path) = &outcome.recovery_path {
        write_line(&t!("outcome.recovery", path = path))?;
    }
    Ok(())
}

/// Prints the machine-readable trust bundle verbatim.
fn print_trust_bundle_json(engine: &Engine) -> CliResult<ExitCode> {
    let path = engine.layout().trust_bundle_json_path();
    if !path.is_file() {
        write_line(&t!("status.json_missing"))?;
        return Ok(ExitCode::from(2));
    }
    let contents = fs::read_to_string(&path)
        .map_err(|err| CliError::new(t!("output.write_failed", stream = "stdout", error = err)))?;
    write_line(contents.trim_end())?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a line to stdout.
fn write_line(message: &str) -> CliResult<()> {
    write_stdout_line(message)
        .map_err(|err| CliError::new(t!("output.write_failed", stream = "stdout", error = err)))
}

/// Writes a message line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a message line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}
