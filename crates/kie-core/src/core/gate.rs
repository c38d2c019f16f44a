// crates/kie-core/src/core/gate.rs
// ============================================================================
// Module: Gate Decisions
// Description: ALLOW/WARN/BLOCK outcomes with findings and remediation.
// Purpose: Express pre- and post-command policy results deterministically.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A gate is a pre- or post-command hook producing `ALLOW | WARN | BLOCK`.
//! Checks execute in order until the first BLOCK; all WARNs are collected.
//! Gates never mutate rails state or the spec; they only gate and decorate
//! command results.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Decision
// ============================================================================

/// Gate outcome, ordered from most to least permissive.
///
/// # Invariants
/// - Variants are stable for serialization and evidence matching.
/// - `Ord` reflects severity: `Allow < Warn < Block`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum GateDecision {
    /// All conditions satisfied; proceed.
    Allow,
    /// Proceed, surfacing an advisory warning.
    Warn,
    /// Refuse to proceed; never mutates rails state.
    Block,
}

impl GateDecision {
    /// Returns the canonical wire form of the decision.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Warn => "warn",
            Self::Block => "block",
        }
    }
}

impl fmt::Display for GateDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Findings
// ============================================================================

/// Single policy finding raised by a gate check.
///
/// # Invariants
/// - `policy` is a stable identifier suitable for evidence records.
/// - `remediation`, when present, is an exact CLI invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateFinding {
    /// Stable identifier of the policy that fired.
    pub policy: String,
    /// Decision contributed by this finding.
    pub decision: GateDecision,
    /// Human-readable explanation.
    pub message: String,
    /// Exact CLI remediation, when one exists.
    pub remediation: Option<String>,
}

impl GateFinding {
    /// Creates an allow finding for a satisfied policy.
    #[must_use]
    pub fn allow(policy: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            policy: policy.into(),
            decision: GateDecision::Allow,
            message: message.into(),
            remediation: None,
        }
    }

    /// Creates a warn finding with optional remediation.
    #[must_use]
    pub fn warn(
        policy: impl Into<String>,
        message: impl Into<String>,
        remediation: Option<String>,
    ) -> Self {
        Self {
            policy: policy.into(),
            decision: GateDecision::Warn,
            message: message.into(),
            remediation,
        }
    }

    /// Creates a block finding with its required remediation.
    #[must_use]
    pub fn block(
        policy: impl Into<String>,
        message: impl Into<String>,
        remediation: impl Into<String>,
    ) -> Self {
        Self {
            policy: policy.into(),
            decision: GateDecision::Block,
            message: message.into(),
            remediation: Some(remediation.into()),
        }
    }
}

// ============================================================================
// SECTION: Report
// ============================================================================

/// Ordered collection of gate findings for one hook execution.
///
/// # Invariants
/// - Findings appear in check-execution order.
/// - At most one BLOCK finding is present (checks stop at the first BLOCK).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateReport {
    /// Findings in execution order.
    pub findings: Vec<GateFinding>,
}

impl GateReport {
    /// Creates an empty report.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            findings: Vec::new(),
        }
    }

    /// Appends a finding to the report.
    pub fn push(&mut self, finding: GateFinding) {
        self.findings.push(finding);
    }

    /// Returns the overall decision (worst finding; ALLOW when empty).
    #[must_use]
    pub fn decision(&self) -> GateDecision {
        self.findings
            .iter()
            .map(|finding| finding.decision)
            .max()
            .unwrap_or(GateDecision::Allow)
    }

    /// Returns the identifiers of every policy that was evaluated.
    #[must_use]
    pub fn policies_applied(&self) -> Vec<String> {
        self.findings.iter().map(|finding| finding.policy.clone()).collect()
    }

    /// Returns warning messages in execution order.
    #[must_use]
    pub fn warnings(&self) -> Vec<String> {
        self.findings
            .iter()
            .filter(|finding| finding.decision == GateDecision::Warn)
            .map(|finding| finding.message.clone())
            .collect()
    }

    /// Returns block messages in execution order.
    #[must_use]
    pub fn blocks(&self) -> Vec<String> {
        self.findings
            .iter()
            .filter(|finding| finding.decision == GateDecision::Block)
            .map(|finding| finding.message.clone())
            .collect()
    }

    /// Returns the first blocking finding, if any.
    #[must_use]
    pub fn first_block(&self) -> Option<&GateFinding> {
        self.findings.iter().find(|finding| finding.decision == GateDecision::Block)
    }

    /// Merges another report's findings into this one.
    pub fn extend(&mut self, other: Self) {
        self.findings.extend(other.findings);
    }
}
