// crates/kie-core/src/core/identifiers.rs
// ============================================================================
// Module: KIE Identifiers
// Description: Canonical opaque identifiers for runs, insights, and plan items.
// Purpose: Provide strongly typed, serializable identifiers with stable wire forms.
// Dependencies: serde, uuid
// ============================================================================

//! ## Overview
//! This module defines the canonical identifiers used throughout the engine.
//! Identifiers are opaque and serialize as strings on the wire. Run
//! identifiers are minted once per command execution and are never reused;
//! insight and plan-item identifiers are derived deterministically from their
//! producing skill so repeated runs over unchanged inputs yield identical ids.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

// ============================================================================
// SECTION: Run Identifier
// ============================================================================

/// Run identifier scoped to a single command execution.
///
/// # Invariants
/// - Opaque UTF-8 string; no normalization or validation is applied by this type.
/// - A fresh identifier is minted per command and never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    /// Creates a run identifier from an existing string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mints a fresh random run identifier.
    #[must_use]
    pub fn mint() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for RunId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RunId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// SECTION: Insight Identifier
// ============================================================================

/// Insight identifier assigned by the statistical analyzer.
///
/// # Invariants
/// - Opaque UTF-8 string; derived deterministically from kind and source columns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InsightId(String);

impl InsightId {
    /// Creates an insight identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InsightId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for InsightId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for InsightId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// SECTION: Plan Item Identifier
// ============================================================================

/// Plan-item identifier assigned by the visualization planner.
///
/// # Invariants
/// - Opaque UTF-8 string; derived deterministically from plan ordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanItemId(String);

impl PlanItemId {
    /// Creates a plan-item identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlanItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for PlanItemId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PlanItemId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
