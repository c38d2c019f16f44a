// crates/kie-core/src/core/stage.rs
// ============================================================================
// Module: Rails Stages
// Description: The closed, ordered stage sequence governing workflow progression.
// Purpose: Provide stable stage ordering, wire forms, and successor lookup.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The rails advance through a fixed stage sequence:
//! `startkie → spec → eda → analyze → build → preview`. Stages are not
//! skippable and never regress without an explicit reset. Build-target
//! variations (presentation, dashboard, report) are recorded as sub-goals
//! within the `build` stage rather than as stages of their own.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Stage Sequence
// ============================================================================

/// Workflow stage on the rails.
///
/// # Invariants
/// - Variants are stable for serialization and rails-state matching.
/// - Ordering follows [`STAGE_ORDER`]; `Ord` reflects rails position.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Workspace bootstrap complete; engine skeleton present.
    Startkie,
    /// Requirements captured into the project spec.
    Spec,
    /// Exploratory data analysis profile produced.
    Eda,
    /// Insights, column mapping, and visualization plan produced.
    Analyze,
    /// Chart configurations and export deliverables produced.
    Build,
    /// Latest outputs rendered for inspection.
    Preview,
}

/// Ordered list of every stage on the rails.
///
/// # Invariants
/// - Ordering is the canonical rails progression and is stable.
pub const STAGE_ORDER: [Stage; 6] = [
    Stage::Startkie,
    Stage::Spec,
    Stage::Eda,
    Stage::Analyze,
    Stage::Build,
    Stage::Preview,
];

impl Stage {
    /// Returns the canonical wire form of the stage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Startkie => "startkie",
            Self::Spec => "spec",
            Self::Eda => "eda",
            Self::Analyze => "analyze",
            Self::Build => "build",
            Self::Preview => "preview",
        }
    }

    /// Returns the zero-based position of the stage on the rails.
    #[must_use]
    pub fn index(self) -> usize {
        STAGE_ORDER.iter().position(|stage| *stage == self).unwrap_or(0)
    }

    /// Returns the stage immediately following this one, if any.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        STAGE_ORDER.get(self.index() + 1).copied()
    }

    /// Returns true when this stage immediately follows `previous`.
    #[must_use]
    pub fn follows(self, previous: Self) -> bool {
        previous.next() == Some(self)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error raised when parsing an unknown stage name.
///
/// # Invariants
/// - Carries the rejected input verbatim for diagnostics.
#[derive(Debug, Error)]
#[error("unknown stage: {0}")]
pub struct StageParseError(pub String);

impl FromStr for Stage {
    type Err = StageParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        STAGE_ORDER
            .iter()
            .find(|stage| stage.as_str() == s)
            .copied()
            .ok_or_else(|| StageParseError(s.to_string()))
    }
}

// ============================================================================
// SECTION: Build Targets
// ============================================================================

/// Deliverable target for the `build` stage.
///
/// # Invariants
/// - Variants are stable for serialization and sub-goal recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildTarget {
    /// Slide-deck deliverable.
    Presentation,
    /// Interactive dashboard deliverable.
    Dashboard,
    /// Written report deliverable.
    Report,
}

impl BuildTarget {
    /// Returns the canonical wire form of the target.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Presentation => "presentation",
            Self::Dashboard => "dashboard",
            Self::Report => "report",
        }
    }
}

impl fmt::Display for BuildTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildTarget {
    type Err = StageParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "presentation" => Ok(Self::Presentation),
            "dashboard" => Ok(Self::Dashboard),
            "report" => Ok(Self::Report),
            other => Err(StageParseError(other.to_string())),
        }
    }
}
