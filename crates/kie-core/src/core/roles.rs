// crates/kie-core/src/core/roles.rs
// ============================================================================
// Module: Semantic Roles
// Description: Closed vocabulary of semantic column roles.
// Purpose: Provide the stable role set shared by spec overrides and inference.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Column mapping assigns semantic roles drawn from a closed vocabulary to
//! real dataset columns. The vocabulary is shared between user-supplied spec
//! overrides (which take absolute precedence) and the semantic mapper's
//! inference tiers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Role Vocabulary
// ============================================================================

/// Semantic role assignable to a dataset column.
///
/// # Invariants
/// - The vocabulary is closed; variants are stable for serialization.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SemanticRole {
    /// Primary revenue measure.
    Revenue,
    /// Cost measure.
    Cost,
    /// Margin or rate measure; value-range aware.
    Margin,
    /// Unit or volume measure.
    Quantity,
    /// Date or datetime dimension.
    Date,
    /// Categorical grouping dimension.
    Category,
    /// Geographic region dimension.
    Region,
    /// Row identifier; excluded from measures.
    Id,
    /// Geocodable location column.
    Geo,
}

/// Ordered list of every semantic role.
///
/// # Invariants
/// - Ordering is stable for deterministic mapping output.
pub const ALL_ROLES: [SemanticRole; 9] = [
    SemanticRole::Revenue,
    SemanticRole::Cost,
    SemanticRole::Margin,
    SemanticRole::Quantity,
    SemanticRole::Date,
    SemanticRole::Category,
    SemanticRole::Region,
    SemanticRole::Id,
    SemanticRole::Geo,
];

impl SemanticRole {
    /// Returns the canonical wire form of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Revenue => "revenue",
            Self::Cost => "cost",
            Self::Margin => "margin",
            Self::Quantity => "quantity",
            Self::Date => "date",
            Self::Category => "category",
            Self::Region => "region",
            Self::Id => "id",
            Self::Geo => "geo",
        }
    }

    /// Returns true for roles that demand a numeric measure column.
    #[must_use]
    pub const fn is_measure(self) -> bool {
        matches!(self, Self::Revenue | Self::Cost | Self::Margin | Self::Quantity)
    }

    /// Returns true for roles that semantically expect rate-like values in `[0, 1]`.
    #[must_use]
    pub const fn expects_rate(self) -> bool {
        matches!(self, Self::Margin)
    }
}

impl fmt::Display for SemanticRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error raised when parsing an unknown role name.
///
/// # Invariants
/// - Carries the rejected input verbatim for diagnostics.
#[derive(Debug, Error)]
#[error("unknown semantic role: {0}")]
pub struct RoleParseError(pub String);

impl FromStr for SemanticRole {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_ROLES
            .iter()
            .find(|role| role.as_str() == s)
            .copied()
            .ok_or_else(|| RoleParseError(s.to_string()))
    }
}
