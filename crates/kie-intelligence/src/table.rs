// crates/kie-intelligence/src/table.rs
// ============================================================================
// Module: Tabular Data Model
// Description: In-memory typed table with deterministic statistics.
// Purpose: Give every intelligence skill one canonical view of the data.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! The table model holds loaded data as typed columns. Statistics are
//! implemented here once, deterministically, so the mapper, analyzer, and
//! validator agree on every number. All helpers skip nulls and guard
//! degenerate inputs (empty, single-row) instead of producing NaN.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use time::Date;

// ============================================================================
// SECTION: Cell Values
// ============================================================================

/// Typed cell value.
///
/// # Invariants
/// - `Float` never holds NaN or infinities; loaders convert those to `Null`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Missing value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Finite floating-point value.
    Float(f64),
    /// Textual value.
    Text(String),
    /// Calendar date value.
    Date(Date),
}

impl CellValue {
    /// Returns true for missing values.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the value as a finite float when it is numeric.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Int(value) => Some(*value as f64),
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns a canonical string rendering for grouping and display.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(value) => value.to_string(),
            Self::Int(value) => value.to_string(),
            Self::Float(value) => format_float(*value),
            Self::Text(value) => value.clone(),
            Self::Date(value) => value.to_string(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Formats a float without scientific notation and without trailing zeros.
fn format_float(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        let mut out = format!("{value:.6}");
        while out.ends_with('0') {
            out.pop();
        }
        if out.ends_with('.') {
            out.pop();
        }
        out
    }
}

// ============================================================================
// SECTION: Column Types
// ============================================================================

/// Inferred column type.
///
/// # Invariants
/// - Variants are stable for serialization into the EDA profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// Continuous or integer measure.
    Numeric,
    /// Low-cardinality grouping dimension.
    Categorical,
    /// Date or datetime dimension.
    Datetime,
    /// Boolean flag.
    Boolean,
    /// Free text.
    Textual,
    /// Row identifier or code; excluded from measures.
    Identifier,
}

impl ColumnType {
    /// Returns the canonical wire form of the type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Categorical => "categorical",
            Self::Datetime => "datetime",
            Self::Boolean => "boolean",
            Self::Textual => "textual",
            Self::Identifier => "identifier",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Columns
// ============================================================================

/// Single typed column.
///
/// # Invariants
/// - `values.len()` equals the owning table's row count.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Column name as it appears in the source file.
    pub name: String,
    /// Inferred type.
    pub column_type: ColumnType,
    /// Cell values, one per row.
    pub values: Vec<CellValue>,
}

impl Column {
    /// Creates a column from a name, type, and values.
    #[must_use]
    pub fn new(name: impl Into<String>, column_type: ColumnType, values: Vec<CellValue>) -> Self {
        Self {
            name: name.into(),
            column_type,
            values,
        }
    }

    /// Returns the number of missing values.
    #[must_use]
    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|value| value.is_null()).count()
    }

    /// Returns the ratio of missing values (0 for an empty column).
    #[must_use]
    pub fn null_ratio(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.null_count() as f64 / self.values.len() as f64
    }

    /// Returns the number of distinct non-null values.
    #[must_use]
    pub fn unique_count(&self) -> usize {
        self.values
            .iter()
            .filter(|value| !value.is_null())
            .map(CellValue::render)
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Returns the ratio of distinct values among non-null rows.
    #[must_use]
    pub fn unique_ratio(&self) -> f64 {
        let non_null = self.values.len() - self.null_count();
        if non_null == 0 {
            return 0.0;
        }
        self.unique_count() as f64 / non_null as f64
    }

    /// Returns true when every non-null value is identical.
    #[must_use]
    pub fn is_constant(&self) -> bool {
        self.unique_count() <= 1 && self.values.iter().any(|value| !value.is_null())
    }

    /// Returns the finite numeric values in row order.
    #[must_use]
    pub fn numeric_values(&self) -> Vec<f64> {
        self.values.iter().filter_map(CellValue::as_number).collect()
    }

    /// Returns true when non-null integers increase strictly row over row.
    #[must_use]
    pub fn is_monotone_int(&self) -> bool {
        let mut previous: Option<i64> = None;
        let mut seen = 0_usize;
        for value in &self.values {
            if let CellValue::Int(current) = value {
                if let Some(last) = previous
                    && *current <= last
                {
                    return false;
                }
                previous = Some(*current);
                seen += 1;
            } else if !value.is_null() {
                return false;
            }
        }
        seen >= 2
    }

    /// Returns true when every numeric value lies in `[0, 1]` (rate signature).
    #[must_use]
    pub fn has_rate_signature(&self) -> bool {
        let numbers = self.numeric_values();
        !numbers.is_empty()
            && numbers.iter().all(|value| (-1e-9..=1.0 + 1e-9).contains(value))
    }

    /// Returns the most frequent non-null values with their counts.
    ///
    /// Sorted by descending count, then ascending value, truncated to `k`.
    #[must_use]
    pub fn top_values(&self, k: usize) -> Vec<(String, usize)> {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for value in &self.values {
            if !value.is_null() {
                *counts.entry(value.render()).or_insert(0) += 1;
            }
        }
        let mut entries: Vec<(String, usize)> = counts.into_iter().collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        entries.truncate(k);
        entries
    }
}

// ============================================================================
// SECTION: Data Table
// ============================================================================

/// In-memory typed table.
///
/// # Invariants
/// - Every column has exactly `row_count` values.
/// - Column order follows the source file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataTable {
    /// Columns in source order.
    pub columns: Vec<Column>,
    /// Number of rows.
    pub row_count: usize,
}

impl DataTable {
    /// Creates a table from columns, taking the row count from the first.
    #[must_use]
    pub fn new(columns: Vec<Column>) -> Self {
        let row_count = columns.first().map_or(0, |column| column.values.len());
        Self {
            columns,
            row_count,
        }
    }

    /// Returns the column with the given name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Returns true when a column with the given name exists.
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Returns the column names in source order.
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|column| column.name.clone()).collect()
    }
}

// ============================================================================
// SECTION: Statistics
// ============================================================================

/// Arithmetic mean; `None` on empty input.
#[must_use]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation; `None` below two observations.
#[must_use]
pub fn std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let center = mean(values)?;
    let sum_sq: f64 = values.iter().map(|value| (value - center).powi(2)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

/// Median over a copy of the input; `None` on empty input.
#[must_use]
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Median absolute deviation; `None` on empty input.
#[must_use]
pub fn mad(values: &[f64]) -> Option<f64> {
    let center = median(values)?;
    let deviations: Vec<f64> = values.iter().map(|value| (value - center).abs()).collect();
    median(&deviations)
}

/// Coefficient of variation (std / |mean|); `None` when undefined.
#[must_use]
pub fn coefficient_of_variation(values: &[f64]) -> Option<f64> {
    let center = mean(values)?;
    if center.abs() < f64::EPSILON {
        return None;
    }
    Some(std_dev(values)? / center.abs())
}

/// Average ranks (1-based) with ties sharing their mean rank.
#[must_use]
pub fn ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    let mut out = vec![0.0; values.len()];
    let mut index = 0;
    while index < order.len() {
        let mut end = index;
        while end + 1 < order.len()
            && values[order[end + 1]].total_cmp(&values[order[index]]).is_eq()
        {
            end += 1;
        }
        let rank = (index + 1 + end + 1) as f64 / 2.0;
        for &position in &order[index..=end] {
            out[position] = rank;
        }
        index = end + 1;
    }
    out
}

/// Spearman rank correlation; `None` below three paired observations or when
/// either side is constant.
#[must_use]
pub fn spearman(left: &[f64], right: &[f64]) -> Option<f64> {
    if left.len() != right.len() || left.len() < 3 {
        return None;
    }
    let left_ranks = ranks(left);
    let right_ranks = ranks(right);
    pearson(&left_ranks, &right_ranks)
}

/// Pearson correlation; `None` when either side has zero variance.
#[must_use]
pub fn pearson(left: &[f64], right: &[f64]) -> Option<f64> {
    let n = left.len();
    if n != right.len() || n < 2 {
        return None;
    }
    let left_mean = mean(left)?;
    let right_mean = mean(right)?;
    let mut covariance = 0.0;
    let mut left_var = 0.0;
    let mut right_var = 0.0;
    for index in 0..n {
        let dl = left[index] - left_mean;
        let dr = right[index] - right_mean;
        covariance += dl * dr;
        left_var += dl * dl;
        right_var += dr * dr;
    }
    if left_var < f64::EPSILON || right_var < f64::EPSILON {
        return None;
    }
    Some(covariance / (left_var.sqrt() * right_var.sqrt()))
}

/// Ordinary least squares slope of `values` against their index.
#[must_use]
pub fn ols_slope(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let xs: Vec<f64> = (0..n).map(|index| index as f64).collect();
    let x_mean = mean(&xs)?;
    let y_mean = mean(values)?;
    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for index in 0..n {
        let dx = xs[index] - x_mean;
        numerator += dx * (values[index] - y_mean);
        denominator += dx * dx;
    }
    if denominator < f64::EPSILON {
        return None;
    }
    Some(numerator / denominator)
}
