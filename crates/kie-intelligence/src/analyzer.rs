// crates/kie-intelligence/src/analyzer.rs
// ============================================================================
// Module: Statistical Analyzer
// Description: Raw-insight generation across the fixed kind set.
// Purpose: Find trends, comparisons, outliers, correlations, concentration,
// composition, and rankings, each with magnitude, confidence, and citations.
// Dependencies: crate::{mapper, table}, kie-core, serde
// ============================================================================

//! ## Overview
//! The analyzer turns the mapped table into raw insights. Every insight
//! cites its source columns and carries a standardized magnitude in `[0, 1]`
//! and a confidence derived from sample support. No insight may claim a
//! result without citing the columns it was computed from. Generation order
//! and all numeric output are deterministic; floats are rounded to six
//! decimals before serialization.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use kie_core::InsightId;
use kie_core::SemanticRole;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::mapper::ColumnMapping;
use crate::table::CellValue;
use crate::table::Column;
use crate::table::ColumnType;
use crate::table::DataTable;
use crate::table::mad;
use crate::table::mean;
use crate::table::median;
use crate::table::ols_slope;
use crate::table::spearman;
use crate::table::std_dev;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Cardinality guard: groupwise analysis skips categories beyond this.
const MAX_GROUPS: usize = 20;

/// Cardinality guard: correlation considers at most this many numeric columns.
const MAX_CORRELATION_COLUMNS: usize = 8;

/// Robust z-score beyond which a value counts as an outlier.
const OUTLIER_Z: f64 = 3.5;

/// Absolute Spearman rho below which a correlation is not reported.
const CORRELATION_FLOOR: f64 = 0.5;

/// Top-group share below which concentration is not reported.
const CONCENTRATION_FLOOR: f64 = 0.4;

/// Share-shift below which composition change is not reported.
const COMPOSITION_FLOOR: f64 = 0.05;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Analyzer errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    /// The dataset has no rows; there is nothing to analyze.
    #[error("no rows: the dataset is empty")]
    NoRows,
}

// ============================================================================
// SECTION: Insight Types
// ============================================================================

/// Kind of analytic finding.
///
/// # Invariants
/// - The kind set is closed; variants are stable for serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    /// Time-series slope with a change-point check.
    Trend,
    /// Groupwise aggregate difference with effect size.
    Comparison,
    /// Robust z-score outliers on a numeric column.
    Outlier,
    /// Pairwise rank correlation between numeric columns.
    Correlation,
    /// Top-k share of a measure by group.
    Concentration,
    /// Share within group over time.
    Composition,
    /// Ordered groups by measure.
    Ranking,
}

impl InsightKind {
    /// Returns the canonical wire form of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trend => "trend",
            Self::Comparison => "comparison",
            Self::Outlier => "outlier",
            Self::Correlation => "correlation",
            Self::Concentration => "concentration",
            Self::Composition => "composition",
            Self::Ranking => "ranking",
        }
    }
}

impl fmt::Display for InsightKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Un-triaged analytic finding.
///
/// # Invariants
/// - `source_columns` is never empty.
/// - `magnitude` and `confidence` lie in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawInsight {
    /// Deterministic insight identifier.
    pub id: InsightId,
    /// Finding kind.
    pub kind: InsightKind,
    /// Entities the finding is about (groups, columns, periods).
    pub entities: Vec<String>,
    /// Standardized magnitude in `[0, 1]`.
    pub magnitude: f64,
    /// Confidence derived from sample support.
    pub confidence: f64,
    /// Columns the finding was computed from.
    pub source_columns: Vec<String>,
    /// Analyst-style narrative sentence.
    pub narrative: String,
}

// ============================================================================
// SECTION: Analysis Entry Point
// ============================================================================

/// Produces raw insights for a mapped table.
///
/// # Errors
///
/// Returns [`AnalyzeError::NoRows`] for an empty dataset.
pub fn analyze(table: &DataTable, mapping: &ColumnMapping) -> Result<Vec<RawInsight>, AnalyzeError> {
    if table.row_count == 0 {
        return Err(AnalyzeError::NoRows);
    }

    let mut findings: Vec<Finding> = Vec::new();
    findings.extend(trend_insights(table, mapping));
    findings.extend(comparison_insights(table, mapping));
    findings.extend(outlier_insights(table));
    findings.extend(correlation_insights(table));
    findings.extend(concentration_insights(table, mapping));
    findings.extend(composition_insights(table, mapping));
    findings.extend(ranking_insights(table, mapping));

    let insights = findings
        .into_iter()
        .enumerate()
        .map(|(index, finding)| RawInsight {
            id: InsightId::new(format!("ins-{:03}", index + 1)),
            kind: finding.kind,
            entities: finding.entities,
            magnitude: round6(finding.magnitude.clamp(0.0, 1.0)),
            confidence: round6(finding.confidence.clamp(0.0, 1.0)),
            source_columns: finding.source_columns,
            narrative: finding.narrative,
        })
        .collect::<Vec<_>>();
    debug!(count = insights.len(), "analysis produced raw insights");
    Ok(insights)
}

/// Intermediate finding before identifier assignment.
struct Finding {
    /// Finding kind.
    kind: InsightKind,
    /// Entities the finding is about.
    entities: Vec<String>,
    /// Unclamped magnitude.
    magnitude: f64,
    /// Unclamped confidence.
    confidence: f64,
    /// Columns cited.
    source_columns: Vec<String>,
    /// Narrative sentence.
    narrative: String,
}

/// Rounds to six decimals for stable serialization.
fn round6(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

/// Confidence from sample support: grows with n, saturating at 1.
fn support_confidence(n: usize) -> f64 {
    n as f64 / (n as f64 + 10.0)
}

// ============================================================================
// SECTION: Measure Selection
// ============================================================================

/// Measure roles considered by groupwise and trend analysis, in order.
const MEASURE_ROLES: [SemanticRole; 4] = [
    SemanticRole::Revenue,
    SemanticRole::Cost,
    SemanticRole::Quantity,
    SemanticRole::Margin,
];

/// Returns mapped measure columns in role order.
fn mapped_measures<'a>(table: &'a DataTable, mapping: &ColumnMapping) -> Vec<&'a Column> {
    MEASURE_ROLES
        .iter()
        .filter_map(|role| mapping.column_for(*role))
        .filter_map(|name| table.column(name))
        .collect()
}

// ============================================================================
// SECTION: Trend
// ============================================================================

/// Aggregates a measure by date and tests slope and change point.
fn trend_insights(table: &DataTable, mapping: &ColumnMapping) -> Vec<Finding> {
    let Some(date_column) = mapping
        .column_for(SemanticRole::Date)
        .and_then(|name| table.column(name))
    else {
        return Vec::new();
    };
    let mut findings = Vec::new();
    for measure in mapped_measures(table, mapping) {
        let series = date_series(date_column, measure);
        if series.len() < 3 {
            continue;
        }
        let values: Vec<f64> = series.iter().map(|(_, value)| *value).collect();
        let Some(slope) = ols_slope(&values) else {
            continue;
        };
        let Some(center) = mean(&values) else {
            continue;
        };
        if center.abs() < f64::EPSILON {
            continue;
        }
        let relative_change = slope * (values.len() - 1) as f64 / center.abs();
        if relative_change.abs() < 0.01 {
            continue;
        }
        let direction = if relative_change > 0.0 { "upward" } else { "downward" };
        let shift = change_point_shift(&values);
        let mut narrative = format!(
            "{} trended {direction} about {:.1}% across {} periods",
            measure.name,
            relative_change.abs() * 100.0,
            values.len()
        );
        if shift {
            narrative.push_str(", with a level shift between the halves of the period");
        }
        findings.push(Finding {
            kind: InsightKind::Trend,
            entities: vec![measure.name.clone(), date_column.name.clone()],
            magnitude: relative_change.abs(),
            confidence: support_confidence(values.len()),
            source_columns: vec![date_column.name.clone(), measure.name.clone()],
            narrative,
        });
    }
    findings
}

/// Builds a per-date aggregated series, sorted by date.
fn date_series(date_column: &Column, measure: &Column) -> Vec<(String, f64)> {
    let mut sums: BTreeMap<String, f64> = BTreeMap::new();
    for (index, cell) in date_column.values.iter().enumerate() {
        let CellValue::Date(date) = cell else {
            continue;
        };
        let Some(value) = measure.values.get(index).and_then(CellValue::as_number) else {
            continue;
        };
        *sums.entry(date.to_string()).or_insert(0.0) += value;
    }
    sums.into_iter().collect()
}

/// Two-halves change-point check: true when the halves differ materially.
fn change_point_shift(values: &[f64]) -> bool {
    if values.len() < 4 {
        return false;
    }
    let mid = values.len() / 2;
    let (first, second) = values.split_at(mid);
    let (Some(first_mean), Some(second_mean)) = (mean(first), mean(second)) else {
        return false;
    };
    let Some(pooled) = std_dev(values) else {
        return false;
    };
    if pooled < f64::EPSILON {
        return false;
    }
    ((second_mean - first_mean) / pooled).abs() > 1.0
}

// ============================================================================
// SECTION: Comparison
// ============================================================================

/// Groupwise aggregate comparison with an effect size.
fn comparison_insights(table: &DataTable, mapping: &ColumnMapping) -> Vec<Finding> {
    let Some(category) = mapping
        .column_for(SemanticRole::Category)
        .and_then(|name| table.column(name))
    else {
        return Vec::new();
    };
    let mut findings = Vec::new();
    for measure in mapped_measures(table, mapping) {
        let groups = group_means(category, measure);
        if groups.len() < 2 || groups.len() > MAX_GROUPS {
            continue;
        }
        let Some(spread) = std_dev(&measure.numeric_values()) else {
            continue;
        };
        if spread < f64::EPSILON {
            continue;
        }
        let Some((top_name, top_mean)) = groups.first().cloned() else {
            continue;
        };
        let Some((bottom_name, bottom_mean)) = groups.last().cloned() else {
            continue;
        };
        let effect = (top_mean - bottom_mean) / spread;
        findings.push(Finding {
            kind: InsightKind::Comparison,
            entities: vec![top_name.clone(), bottom_name.clone()],
            magnitude: effect / 4.0,
            confidence: support_confidence(measure.numeric_values().len()),
            source_columns: vec![category.name.clone(), measure.name.clone()],
            narrative: format!(
                "{top_name} leads {bottom_name} on {} ({} vs {})",
                measure.name,
                format_amount(top_mean),
                format_amount(bottom_mean)
            ),
        });
    }
    findings
}

/// Group means sorted by descending mean, then name.
fn group_means(category: &Column, measure: &Column) -> Vec<(String, f64)> {
    let mut sums: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for (index, cell) in category.values.iter().enumerate() {
        if cell.is_null() {
            continue;
        }
        let Some(value) = measure.values.get(index).and_then(CellValue::as_number) else {
            continue;
        };
        let entry = sums.entry(cell.render()).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }
    let mut groups: Vec<(String, f64)> = sums
        .into_iter()
        .map(|(name, (sum, count))| (name, sum / count as f64))
        .collect();
    groups.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    groups
}

/// Group sums sorted by descending sum, then name.
fn group_sums(category: &Column, measure: &Column) -> Vec<(String, f64)> {
    let mut sums: BTreeMap<String, f64> = BTreeMap::new();
    for (index, cell) in category.values.iter().enumerate() {
        if cell.is_null() {
            continue;
        }
        let Some(value) = measure.values.get(index).and_then(CellValue::as_number) else {
            continue;
        };
        *sums.entry(cell.render()).or_insert(0.0) += value;
    }
    let mut groups: Vec<(String, f64)> = sums.into_iter().collect();
    groups.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    groups
}

/// Formats a measure amount compactly for narratives.
fn format_amount(value: f64) -> String {
    if value.abs() >= 1_000_000.0 {
        format!("{:.1}M", value / 1_000_000.0)
    } else if value.abs() >= 1_000.0 {
        format!("{:.1}K", value / 1_000.0)
    } else {
        format!("{value:.1}")
    }
}

// ============================================================================
// SECTION: Outliers
// ============================================================================

/// Robust z-score outlier screen on numeric columns.
fn outlier_insights(table: &DataTable) -> Vec<Finding> {
    let mut findings = Vec::new();
    for column in &table.columns {
        if column.column_type != ColumnType::Numeric {
            continue;
        }
        let numbers = column.numeric_values();
        if numbers.len() < 4 {
            continue;
        }
        let (Some(center), Some(spread)) = (median(&numbers), mad(&numbers)) else {
            continue;
        };
        let scaled = spread * 1.4826;
        if scaled < f64::EPSILON {
            continue;
        }
        let mut count = 0_usize;
        let mut extreme = 0.0_f64;
        let mut extreme_value = center;
        for value in &numbers {
            let z = (value - center) / scaled;
            if z.abs() > OUTLIER_Z {
                count += 1;
                if z.abs() > extreme.abs() {
                    extreme = z;
                    extreme_value = *value;
                }
            }
        }
        if count == 0 {
            continue;
        }
        findings.push(Finding {
            kind: InsightKind::Outlier,
            entities: vec![column.name.clone()],
            magnitude: extreme.abs() / 10.0,
            confidence: support_confidence(numbers.len()),
            source_columns: vec![column.name.clone()],
            narrative: format!(
                "{count} outlier value(s) in {}, most extreme at {}",
                column.name,
                format_amount(extreme_value)
            ),
        });
    }
    findings
}

// ============================================================================
// SECTION: Correlation
// ============================================================================

/// Pairwise Spearman correlation with cardinality guards.
fn correlation_insights(table: &DataTable) -> Vec<Finding> {
    let numeric: Vec<&Column> = table
        .columns
        .iter()
        .filter(|column| column.column_type == ColumnType::Numeric)
        .take(MAX_CORRELATION_COLUMNS)
        .collect();
    let mut findings = Vec::new();
    for (left_index, left) in numeric.iter().enumerate() {
        for right in numeric.iter().skip(left_index + 1) {
            let (left_values, right_values) = paired_values(left, right);
            let Some(rho) = spearman(&left_values, &right_values) else {
                continue;
            };
            if rho.abs() < CORRELATION_FLOOR {
                continue;
            }
            let direction = if rho > 0.0 { "positive" } else { "negative" };
            findings.push(Finding {
                kind: InsightKind::Correlation,
                entities: vec![left.name.clone(), right.name.clone()],
                magnitude: rho.abs(),
                confidence: support_confidence(left_values.len()),
                source_columns: vec![left.name.clone(), right.name.clone()],
                narrative: format!(
                    "strong {direction} rank correlation ({rho:.2}) between {} and {}",
                    left.name, right.name
                ),
            });
        }
    }
    findings
}

/// Collects rows where both columns hold numbers.
fn paired_values(left: &Column, right: &Column) -> (Vec<f64>, Vec<f64>) {
    let mut left_out = Vec::new();
    let mut right_out = Vec::new();
    for (index, cell) in left.values.iter().enumerate() {
        let (Some(left_value), Some(right_value)) = (
            cell.as_number(),
            right.values.get(index).and_then(CellValue::as_number),
        ) else {
            continue;
        };
        left_out.push(left_value);
        right_out.push(right_value);
    }
    (left_out, right_out)
}

// ============================================================================
// SECTION: Concentration
// ============================================================================

/// Top-k share of a measure by group.
fn concentration_insights(table: &DataTable, mapping: &ColumnMapping) -> Vec<Finding> {
    let Some(category) = mapping
        .column_for(SemanticRole::Category)
        .and_then(|name| table.column(name))
    else {
        return Vec::new();
    };
    let mut findings = Vec::new();
    for measure in mapped_measures(table, mapping) {
        let groups = group_sums(category, measure);
        if groups.len() < 3 || groups.len() > MAX_GROUPS {
            continue;
        }
        let total: f64 = groups.iter().map(|(_, value)| value).sum();
        if total.abs() < f64::EPSILON {
            continue;
        }
        let k = (groups.len().div_ceil(5)).max(1);
        let top_sum: f64 = groups.iter().take(k).map(|(_, value)| value).sum();
        let share = top_sum / total;
        if share < CONCENTRATION_FLOOR {
            continue;
        }
        let leaders: Vec<String> =
            groups.iter().take(k).map(|(name, _)| name.clone()).collect();
        findings.push(Finding {
            kind: InsightKind::Concentration,
            entities: leaders.clone(),
            magnitude: share,
            confidence: support_confidence(measure.numeric_values().len()),
            source_columns: vec![category.name.clone(), measure.name.clone()],
            narrative: format!(
                "top {k} of {} groups hold {:.0}% of {}",
                groups.len(),
                share * 100.0,
                measure.name
            ),
        });
    }
    findings
}

// ============================================================================
// SECTION: Composition
// ============================================================================

/// Share within group between the first and last period.
fn composition_insights(table: &DataTable, mapping: &ColumnMapping) -> Vec<Finding> {
    let (Some(category), Some(date_column)) = (
        mapping.column_for(SemanticRole::Category).and_then(|name| table.column(name)),
        mapping.column_for(SemanticRole::Date).and_then(|name| table.column(name)),
    ) else {
        return Vec::new();
    };
    let mut findings = Vec::new();
    for measure in mapped_measures(table, mapping) {
        let mut periods: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
        for (index, cell) in date_column.values.iter().enumerate() {
            let CellValue::Date(date) = cell else {
                continue;
            };
            let Some(group) = category.values.get(index).filter(|value| !value.is_null())
            else {
                continue;
            };
            let Some(value) = measure.values.get(index).and_then(CellValue::as_number) else {
                continue;
            };
            *periods
                .entry(date.to_string())
                .or_default()
                .entry(group.render())
                .or_insert(0.0) += value;
        }
        if periods.len() < 2 {
            continue;
        }
        let (Some(first), Some(last)) =
            (periods.values().next(), periods.values().next_back())
        else {
            continue;
        };
        let Some((group, delta, from, to)) = largest_share_shift(first, last) else {
            continue;
        };
        if delta < COMPOSITION_FLOOR {
            continue;
        }
        findings.push(Finding {
            kind: InsightKind::Composition,
            entities: vec![group.clone()],
            magnitude: (delta * 2.0).min(1.0),
            confidence: support_confidence(periods.len()),
            source_columns: vec![
                date_column.name.clone(),
                category.name.clone(),
                measure.name.clone(),
            ],
            narrative: format!(
                "{group} moved from {:.0}% to {:.0}% of {} between the first and last period",
                from * 100.0,
                to * 100.0,
                measure.name
            ),
        });
    }
    findings
}

/// Finds the group with the largest share shift between two periods.
fn largest_share_shift(
    first: &BTreeMap<String, f64>,
    last: &BTreeMap<String, f64>,
) -> Option<(String, f64, f64, f64)> {
    let first_total: f64 = first.values().sum();
    let last_total: f64 = last.values().sum();
    if first_total.abs() < f64::EPSILON || last_total.abs() < f64::EPSILON {
        return None;
    }
    let mut best: Option<(String, f64, f64, f64)> = None;
    for (group, value) in first {
        let from = value / first_total;
        let to = last.get(group).copied().unwrap_or(0.0) / last_total;
        let delta = (to - from).abs();
        let better = best
            .as_ref()
            .is_none_or(|(_, best_delta, _, _)| delta > *best_delta);
        if better {
            best = Some((group.clone(), delta, from, to));
        }
    }
    best
}

// ============================================================================
// SECTION: Ranking
// ============================================================================

/// Ordered groups by measure.
fn ranking_insights(table: &DataTable, mapping: &ColumnMapping) -> Vec<Finding> {
    let Some(category) = mapping
        .column_for(SemanticRole::Category)
        .and_then(|name| table.column(name))
    else {
        return Vec::new();
    };
    let mut findings = Vec::new();
    for measure in mapped_measures(table, mapping) {
        let groups = group_sums(category, measure);
        if groups.len() < 2 || groups.len() > MAX_GROUPS {
            continue;
        }
        let Some((leader, leader_value)) = groups.first().cloned() else {
            continue;
        };
        let total: f64 = groups.iter().map(|(_, value)| value).sum();
        if total.abs() < f64::EPSILON {
            continue;
        }
        findings.push(Finding {
            kind: InsightKind::Ranking,
            entities: groups.iter().map(|(name, _)| name.clone()).collect(),
            magnitude: leader_value / total,
            confidence: support_confidence(measure.numeric_values().len()),
            source_columns: vec![category.name.clone(), measure.name.clone()],
            narrative: format!(
                "{leader} ranks first on {} at {}",
                measure.name,
                format_amount(leader_value)
            ),
        });
    }
    findings
}
