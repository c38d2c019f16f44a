// crates/kie-engine/src/commands.rs
// ============================================================================
// Module: Command Model
// Description: The closed command vocabulary the dispatcher executes.
// Purpose: Give gates and handlers one typed view of every CLI verb.
// Dependencies: kie-core, serde
// ============================================================================

//! ## Overview
//! Every CLI verb maps to one [`CommandKind`]. Commands know which rails
//! stage they complete, whether they mutate state, and how they appear in
//! evidence records. The vocabulary is closed; gates dispatch on it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use kie_core::BuildTarget;
use kie_core::Stage;
use kie_core::Theme;
use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Spec Actions
// ============================================================================

/// Sub-actions of the `spec` command.
///
/// # Invariants
/// - `Repair` is the only legal rails regression path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecAction {
    /// Initialize a fresh spec document.
    Init {
        /// Project name to seed the spec with.
        project_name: String,
    },
    /// Set one spec field.
    Set {
        /// Field key (`objective`, `theme`, `column_mapping.<role>`, …).
        key: String,
        /// Field value.
        value: String,
    },
    /// Repair engine state: re-validate files and reset the rails.
    Repair,
}

// ============================================================================
// SECTION: Interview Input
// ============================================================================

/// Flag-driven requirements capture; the engine never reads stdin.
///
/// # Invariants
/// - All fields are optional; omitted fields keep their current spec value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewInput {
    /// Project name.
    pub project_name: Option<String>,
    /// Natural-language objective.
    pub objective: Option<String>,
    /// Client name.
    pub client: Option<String>,
    /// Project type wire form.
    pub project_type: Option<String>,
    /// Theme wire form.
    pub theme: Option<String>,
    /// Comma-separated data sources.
    pub data: Option<String>,
}

// ============================================================================
// SECTION: Command Kind
// ============================================================================

/// Closed command vocabulary.
///
/// # Invariants
/// - Variants are stable for evidence records and gate dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    /// Ensure the workspace skeleton and marker.
    Bootstrap,
    /// Report environment facts; never changes state.
    Doctor,
    /// Print current stage, completed stages, and the next suggested command.
    Status,
    /// Flag-driven requirements gathering; writes the spec.
    Interview(InterviewInput),
    /// Initialize, set, or repair the spec.
    Spec(SpecAction),
    /// Explicit theme setter; required before `build`.
    Theme(Theme),
    /// Produce the EDA profile, optionally over a named file.
    Eda {
        /// Data file override, workspace-relative.
        file: Option<String>,
    },
    /// Produce insights, column mapping, and the visualization plan.
    Analyze,
    /// Consume the visualization plan and produce exports.
    Build(BuildTarget),
    /// Render the latest outputs for inspection.
    Preview,
    /// Run the brand validator standalone.
    Validate {
        /// Optional mode override (`strict` or `lenient`).
        mode: Option<String>,
    },
    /// Execute the next rails-suggested step (or the full chain).
    Go {
        /// Execute the full remaining chain.
        full: bool,
        /// Showcase walkthrough; never mutates rails state.
        showcase: bool,
    },
}

impl CommandKind {
    /// Returns the command verb as recorded in evidence.
    #[must_use]
    pub const fn verb(&self) -> &'static str {
        match self {
            Self::Bootstrap => "bootstrap",
            Self::Doctor => "doctor",
            Self::Status => "status",
            Self::Interview(_) => "interview",
            Self::Spec(_) => "spec",
            Self::Theme(_) => "theme",
            Self::Eda {
                ..
            } => "eda",
            Self::Analyze => "analyze",
            Self::Build(_) => "build",
            Self::Preview => "preview",
            Self::Validate {
                ..
            } => "validate",
            Self::Go {
                ..
            } => "go",
        }
    }

    /// Returns the rails stage a successful run of this command completes.
    #[must_use]
    pub const fn completes_stage(&self) -> Option<Stage> {
        match self {
            Self::Bootstrap => Some(Stage::Startkie),
            Self::Interview(_) | Self::Spec(_) | Self::Theme(_) => Some(Stage::Spec),
            Self::Eda {
                ..
            } => Some(Stage::Eda),
            Self::Analyze => Some(Stage::Analyze),
            Self::Build(_) => Some(Stage::Build),
            Self::Preview => Some(Stage::Preview),
            Self::Doctor
            | Self::Status
            | Self::Validate {
                ..
            }
            | Self::Go {
                ..
            } => None,
        }
    }

    /// Returns true for read-only commands that may run outside a workspace.
    #[must_use]
    pub const fn is_read_only(&self) -> bool {
        matches!(
            self,
            Self::Doctor
                | Self::Status
                | Self::Validate {
                    ..
                }
        )
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}
