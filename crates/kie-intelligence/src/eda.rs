// crates/kie-intelligence/src/eda.rs
// ============================================================================
// Module: EDA Profile
// Description: Dataset schema and quality summary produced by the load skill.
// Purpose: Give downstream skills and consultants one honest view of the data.
// Dependencies: crate::table, serde
// ============================================================================

//! ## Overview
//! The EDA profile summarizes shape, per-column types and statistics, and
//! data-quality warnings. One profile exists per EDA run and overwrites the
//! previous one. An empty dataset is a valid profile with shape `(0, n)` and
//! a warning; it is the analyzer, not the loader, that refuses empty data.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::table::Column;
use crate::table::ColumnType;
use crate::table::DataTable;
use crate::table::mean;
use crate::table::median;
use crate::table::std_dev;

// ============================================================================
// SECTION: Profile Types
// ============================================================================

/// Numeric summary statistics for a column.
///
/// # Invariants
/// - Present only for numeric columns with at least one value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    /// Minimum value.
    pub min: f64,
    /// Maximum value.
    pub max: f64,
    /// Arithmetic mean.
    pub mean: f64,
    /// Median.
    pub median: f64,
    /// Sample standard deviation; absent below two observations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub std_dev: Option<f64>,
}

/// Most frequent value entry for categorical columns.
///
/// # Invariants
/// - Sorted by descending count, then ascending value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopValue {
    /// Rendered value.
    pub value: String,
    /// Occurrence count.
    pub count: usize,
}

/// Per-column profile entry.
///
/// # Invariants
/// - `null_ratio` lies in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    /// Column name.
    pub name: String,
    /// Inferred type.
    pub column_type: ColumnType,
    /// Missing-value count.
    pub null_count: usize,
    /// Missing-value ratio.
    pub null_ratio: f64,
    /// Distinct non-null value count.
    pub unique_count: usize,
    /// Numeric summary, for numeric columns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<NumericSummary>,
    /// Most frequent values, for categorical columns.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub top_values: Vec<TopValue>,
}

/// Dataset schema and quality summary.
///
/// # Invariants
/// - `shape` is `[rows, columns]`.
/// - Overwritten whole on every EDA run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdaProfile {
    /// Workspace-relative path of the profiled data file.
    pub source: String,
    /// Dataset shape as `[rows, columns]`.
    pub shape: [usize; 2],
    /// Per-column profiles in source order.
    pub columns: Vec<ColumnProfile>,
    /// Data-quality warnings.
    pub warnings: Vec<String>,
    /// Analyses the inferred schema supports.
    pub suggested_analyses: Vec<String>,
}

// ============================================================================
// SECTION: Profile Construction
// ============================================================================

/// Thresholds used while profiling, taken from loader configuration.
#[derive(Debug, Clone, Copy)]
pub struct ProfileThresholds {
    /// Null ratio at which a column draws a warning.
    pub null_ratio_warn: f64,
    /// Warn on constant columns.
    pub constant_warn: bool,
    /// Uniqueness ratio flagging a categorical column as high-cardinality.
    pub high_cardinality_ratio: f64,
}

/// Number of top values retained per categorical column.
const TOP_VALUE_COUNT: usize = 5;

/// Builds the EDA profile for a loaded table.
#[must_use]
pub fn build_profile(
    source: &str,
    table: &DataTable,
    thresholds: ProfileThresholds,
) -> EdaProfile {
    let mut warnings = Vec::new();
    if table.row_count == 0 {
        warnings.push("dataset has no rows".to_string());
    } else if table.row_count == 1 {
        warnings.push("single-row dataset: variance-based analysis is unavailable".to_string());
    }

    let mut columns = Vec::with_capacity(table.columns.len());
    for column in &table.columns {
        columns.push(profile_column(column, thresholds, &mut warnings));
    }

    EdaProfile {
        source: source.to_string(),
        shape: [table.row_count, table.columns.len()],
        columns,
        warnings,
        suggested_analyses: suggest_analyses(table),
    }
}

/// Profiles a single column, pushing quality warnings as found.
fn profile_column(
    column: &Column,
    thresholds: ProfileThresholds,
    warnings: &mut Vec<String>,
) -> ColumnProfile {
    let null_ratio = column.null_ratio();
    if null_ratio > thresholds.null_ratio_warn {
        warnings.push(format!(
            "column {} is {:.0}% null",
            column.name,
            null_ratio * 100.0
        ));
    }
    if thresholds.constant_warn && column.is_constant() {
        warnings.push(format!("column {} is constant", column.name));
    }
    if column.column_type == ColumnType::Categorical
        && column.unique_ratio() > thresholds.high_cardinality_ratio
    {
        warnings.push(format!("column {} is high-cardinality", column.name));
    }

    let numbers = column.numeric_values();
    let stats = if column.column_type == ColumnType::Numeric && !numbers.is_empty() {
        Some(NumericSummary {
            min: numbers.iter().copied().fold(f64::INFINITY, f64::min),
            max: numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            mean: mean(&numbers).unwrap_or(0.0),
            median: median(&numbers).unwrap_or(0.0),
            std_dev: std_dev(&numbers),
        })
    } else {
        None
    };

    let top_values = if column.column_type == ColumnType::Categorical {
        column
            .top_values(TOP_VALUE_COUNT)
            .into_iter()
            .map(|(value, count)| TopValue {
                value,
                count,
            })
            .collect()
    } else {
        Vec::new()
    };

    ColumnProfile {
        name: column.name.clone(),
        column_type: column.column_type,
        null_count: column.null_count(),
        null_ratio,
        unique_count: column.unique_count(),
        stats,
        top_values,
    }
}

/// Suggests analyses the inferred schema supports.
fn suggest_analyses(table: &DataTable) -> Vec<String> {
    let has = |kind: ColumnType| table.columns.iter().any(|column| column.column_type == kind);
    let mut suggestions = Vec::new();
    if has(ColumnType::Datetime) && has(ColumnType::Numeric) {
        suggestions.push("trend analysis over the date column".to_string());
    }
    if has(ColumnType::Categorical) && has(ColumnType::Numeric) {
        suggestions.push("groupwise comparison and ranking".to_string());
        suggestions.push("concentration of measures by group".to_string());
    }
    let numeric_count = table
        .columns
        .iter()
        .filter(|column| column.column_type == ColumnType::Numeric)
        .count();
    if numeric_count >= 2 {
        suggestions.push("pairwise correlation across numeric columns".to_string());
    }
    if has(ColumnType::Numeric) {
        suggestions.push("outlier screening on numeric columns".to_string());
    }
    suggestions
}
