// crates/kie-brand/src/report.rs
// ============================================================================
// Module: Validation Report
// Description: Combined rule outcomes with strict/lenient blocking semantics.
// Purpose: Decide, reproducibly, whether outputs may be certified.
// Dependencies: crate::{chart, rules}, serde, serde_json, tracing
// ============================================================================

//! ## Overview
//! The validator runs the closed rule set over chart configurations and data
//! rows and combines the findings into one report. A report with any CRITICAL
//! finding fails. In strict mode (the delivery default) WARN findings fail
//! too; lenient mode lets them through for development and preview.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use tracing::info;

use crate::chart::ChartConfig;
use crate::rules::Finding;
use crate::rules::Severity;
use crate::rules::check_content;
use crate::rules::check_contrast;
use crate::rules::check_data_quality_rows;
use crate::rules::check_gridlines;
use crate::rules::check_palette;
use crate::rules::check_pie_segments;
use crate::rules::check_readability;
use crate::rules::check_synthetic_rows;
use crate::rules::check_typography;

// ============================================================================
// SECTION: Modes
// ============================================================================

/// Validation strictness.
///
/// # Invariants
/// - Strict is the default for delivery targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    /// WARN findings also block.
    Strict,
    /// Only CRITICAL findings block.
    Lenient,
}

impl ValidationMode {
    /// Returns the canonical wire form of the mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Lenient => "lenient",
        }
    }
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Report
// ============================================================================

/// Outcome of one named check over one artifact.
///
/// # Invariants
/// - `passed` is true exactly when `findings` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOutcome {
    /// Check identifier (`rule family @ location`).
    pub check: String,
    /// True when the check raised no findings.
    pub passed: bool,
    /// Findings raised by the check.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub findings: Vec<Finding>,
}

/// Combined validation report.
///
/// # Invariants
/// - Every executed check appears, passed or not.
/// - A report with any CRITICAL finding never certifies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Mode the validation ran under.
    pub mode: ValidationMode,
    /// Check outcomes in execution order.
    pub checks: Vec<CheckOutcome>,
}

impl ValidationReport {
    /// Creates an empty report for the given mode.
    #[must_use]
    pub const fn new(mode: ValidationMode) -> Self {
        Self {
            mode,
            checks: Vec::new(),
        }
    }

    /// Records one check outcome.
    pub fn record(&mut self, check: impl Into<String>, findings: Vec<Finding>) {
        self.checks.push(CheckOutcome {
            check: check.into(),
            passed: findings.is_empty(),
            findings,
        });
    }

    /// Iterates over all findings.
    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.checks.iter().flat_map(|check| check.findings.iter())
    }

    /// Returns the most severe finding level, when any finding exists.
    #[must_use]
    pub fn worst_severity(&self) -> Option<Severity> {
        self.findings().map(|finding| finding.severity).max()
    }

    /// Returns true when the report blocks certification under its mode.
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        match self.worst_severity() {
            Some(Severity::Critical) => true,
            Some(Severity::Warn) => self.mode == ValidationMode::Strict,
            Some(Severity::Info) | None => false,
        }
    }

    /// Returns the messages of blocking findings under the report's mode.
    #[must_use]
    pub fn blocking_messages(&self) -> Vec<String> {
        self.findings()
            .filter(|finding| match finding.severity {
                Severity::Critical => true,
                Severity::Warn => self.mode == ValidationMode::Strict,
                Severity::Info => false,
            })
            .map(|finding| format!("[{}] {}: {}", finding.severity, finding.rule, finding.message))
            .collect()
    }

    /// Returns advisory (non-blocking) messages under the report's mode.
    #[must_use]
    pub fn advisory_messages(&self) -> Vec<String> {
        self.findings()
            .filter(|finding| match finding.severity {
                Severity::Critical => false,
                Severity::Warn => self.mode == ValidationMode::Lenient,
                Severity::Info => true,
            })
            .map(|finding| format!("[{}] {}: {}", finding.severity, finding.rule, finding.message))
            .collect()
    }
}

// ============================================================================
// SECTION: Validation Entry Points
// ============================================================================

/// Runs the full chart rule set over one configuration.
pub fn validate_chart(report: &mut ValidationReport, chart: &ChartConfig, location: &str) {
    report.record(format!("brand.palette@{location}"), check_palette(chart, location));
    report.record(format!("brand.gridlines@{location}"), check_gridlines(chart, location));
    report.record(format!("brand.typography@{location}"), check_typography(chart, location));
    report.record(format!("brand.pie_segments@{location}"), check_pie_segments(chart, location));
    report.record(
        format!("accessibility.contrast@{location}"),
        check_contrast(chart, location),
    );
    report.record(
        format!("integrity.synthetic_data@{location}"),
        check_synthetic_rows(&chart.data, location),
    );
    report.record(format!("content@{location}"), check_content(chart, location));
    report.record(format!("readability@{location}"), check_readability(chart, location));
}

/// Runs the data rule set over dataset rows.
pub fn validate_rows(
    report: &mut ValidationReport,
    rows: &[Map<String, Value>],
    location: &str,
) {
    report.record(
        format!("integrity.synthetic_data@{location}"),
        check_synthetic_rows(rows, location),
    );
    report.record(format!("quality@{location}"), check_data_quality_rows(rows, location));
}

/// Validates a set of charts plus optional dataset rows.
#[must_use]
pub fn validate_all(
    mode: ValidationMode,
    charts: &[(String, ChartConfig)],
    dataset: Option<(&str, &[Map<String, Value>])>,
) -> ValidationReport {
    let mut report = ValidationReport::new(mode);
    for (location, chart) in charts {
        validate_chart(&mut report, chart, location);
    }
    if let Some((location, rows)) = dataset {
        validate_rows(&mut report, rows, location);
    }
    info!(
        mode = %report.mode,
        checks = report.checks.len(),
        blocking = report.is_blocking(),
        "validation complete"
    );
    report
}
