// crates/kie-core/src/core/spec.rs
// ============================================================================
// Module: Project Spec
// Description: User-owned requirements document consumed by the engine.
// Purpose: Model the objective, project type, theme, and mapping overrides.
// Dependencies: crate::core::roles, serde, serde_yaml, thiserror
// ============================================================================

//! ## Overview
//! The spec captures user intent: objective, project type, client, data
//! references, theme, and an optional column-mapping override. The spec is
//! user-owned: the engine reads it and mutates it only through the documented
//! `spec --set` surface. Theme is required before `build` and has **no**
//! default. A `column_mapping` entry takes absolute precedence over inference
//! when it names an existing column.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::roles::SemanticRole;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Spec manipulation errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum SpecError {
    /// The spec document could not be parsed.
    #[error("failed to parse spec: {0}")]
    Parse(String),
    /// The spec document could not be serialized.
    #[error("failed to serialize spec: {0}")]
    Serialize(String),
    /// `spec --set` received an unknown key.
    #[error("unknown spec key: {0}")]
    UnknownKey(String),
    /// `spec --set` received a value outside the key's domain.
    #[error("invalid value {value:?} for {key}: expected {expected}")]
    InvalidValue {
        /// Key being assigned.
        key: String,
        /// Rejected value.
        value: String,
        /// Description of the accepted domain.
        expected: String,
    },
}

// ============================================================================
// SECTION: Enumerations
// ============================================================================

/// Project deliverable family declared in the spec.
///
/// # Invariants
/// - Variants are stable for serialization and gate checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectType {
    /// Analytic deep-dive.
    #[default]
    Analytics,
    /// Slide-deck presentation.
    Presentation,
    /// Interactive dashboard.
    Dashboard,
    /// Statistical or predictive modeling.
    Modeling,
    /// Client proposal.
    Proposal,
    /// Research study.
    Research,
}

impl ProjectType {
    /// Returns the canonical wire form of the project type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Analytics => "analytics",
            Self::Presentation => "presentation",
            Self::Dashboard => "dashboard",
            Self::Modeling => "modeling",
            Self::Proposal => "proposal",
            Self::Research => "research",
        }
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectType {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "analytics" => Ok(Self::Analytics),
            "presentation" => Ok(Self::Presentation),
            "dashboard" => Ok(Self::Dashboard),
            "modeling" => Ok(Self::Modeling),
            "proposal" => Ok(Self::Proposal),
            "research" => Ok(Self::Research),
            other => Err(SpecError::InvalidValue {
                key: "project_type".to_string(),
                value: other.to_string(),
                expected: "analytics|presentation|dashboard|modeling|proposal|research"
                    .to_string(),
            }),
        }
    }
}

/// Visual theme for produced deliverables.
///
/// # Invariants
/// - Required before `build`; there is deliberately no default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    /// Dark backgrounds with light text.
    Dark,
    /// Light backgrounds with dark text.
    Light,
}

impl Theme {
    /// Returns the canonical wire form of the theme.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dark" => Ok(Self::Dark),
            "light" => Ok(Self::Light),
            other => Err(SpecError::InvalidValue {
                key: "theme".to_string(),
                value: other.to_string(),
                expected: "dark|light".to_string(),
            }),
        }
    }
}

// ============================================================================
// SECTION: Project Spec
// ============================================================================

/// User-owned requirements document.
///
/// # Invariants
/// - `theme` has no default; `None` blocks `build`.
/// - `column_mapping` keys are semantic roles; entries override inference.
/// - Mutation happens only through [`ProjectSpec::set_value`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectSpec {
    /// Project name used in deliverable identity.
    #[serde(default)]
    pub project_name: String,
    /// Natural-language objective driving triage and planning.
    #[serde(default)]
    pub objective: String,
    /// Client name, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
    /// Deliverable family.
    #[serde(default)]
    pub project_type: ProjectType,
    /// Visual theme; required before `build`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    /// Data files referenced by the project, workspace-relative.
    #[serde(default)]
    pub data_sources: Vec<String>,
    /// Optional role-to-column override; absolute precedence over inference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_mapping: Option<BTreeMap<SemanticRole, String>>,
}

impl ProjectSpec {
    /// Creates an initialized spec with the given project name.
    #[must_use]
    pub fn init(project_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            ..Self::default()
        }
    }

    /// Returns the required fields that are still missing or empty.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.project_name.trim().is_empty() {
            missing.push("project_name");
        }
        if self.objective.trim().is_empty() {
            missing.push("objective");
        }
        missing
    }

    /// Returns true when every required field is present.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Sets a spec field from a `key=value` assignment.
    ///
    /// Supported keys: `project_name`, `objective`, `client`, `project_type`,
    /// `theme`, `data_sources` (comma-separated), and dotted
    /// `column_mapping.<role>` entries.
    ///
    /// Returns `false` when the assignment left the spec unchanged, so the
    /// caller can record the no-op truthfully.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::UnknownKey`] or [`SpecError::InvalidValue`] when
    /// the assignment is outside the spec surface.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<bool, SpecError> {
        if let Some(role_name) = key.strip_prefix("column_mapping.") {
            let role = SemanticRole::from_str(role_name)
                .map_err(|_| SpecError::UnknownKey(key.to_string()))?;
            let mapping = self.column_mapping.get_or_insert_with(BTreeMap::new);
            let previous = mapping.insert(role, value.to_string());
            return Ok(previous.as_deref() != Some(value));
        }
        match key {
            "project_name" => Ok(replace_string(&mut self.project_name, value)),
            "objective" => Ok(replace_string(&mut self.objective, value)),
            "client" => {
                let next = Some(value.to_string());
                let changed = self.client != next;
                self.client = next;
                Ok(changed)
            }
            "project_type" => {
                let next = ProjectType::from_str(value)?;
                let changed = self.project_type != next;
                self.project_type = next;
                Ok(changed)
            }
            "theme" => {
                let next = Some(Theme::from_str(value)?);
                let changed = self.theme != next;
                self.theme = next;
                Ok(changed)
            }
            "data_sources" => {
                let next: Vec<String> = value
                    .split(',')
                    .map(str::trim)
                    .filter(|entry| !entry.is_empty())
                    .map(ToString::to_string)
                    .collect();
                let changed = self.data_sources != next;
                self.data_sources = next;
                Ok(changed)
            }
            other => Err(SpecError::UnknownKey(other.to_string())),
        }
    }

    /// Serializes the spec to YAML.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::Serialize`] when serialization fails.
    pub fn to_yaml(&self) -> Result<String, SpecError> {
        serde_yaml::to_string(self).map_err(|err| SpecError::Serialize(err.to_string()))
    }

    /// Parses a spec from YAML.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::Parse`] when the document is malformed.
    pub fn from_yaml(yaml: &str) -> Result<Self, SpecError> {
        serde_yaml::from_str(yaml).map_err(|err| SpecError::Parse(err.to_string()))
    }
}

/// Replaces a string field, reporting whether it changed.
fn replace_string(field: &mut String, value: &str) -> bool {
    if field == value {
        return false;
    }
    value.clone_into(field);
    true
}
