// crates/kie-engine/src/builder.rs
// ============================================================================
// Module: Chart Builder
// Description: Turns visualization-plan items into render-ready chart configs.
// Purpose: The only code path that generates charts, and only from the plan.
// Dependencies: crate nothing; kie-brand, kie-config, kie-core, kie-intelligence
// ============================================================================

//! ## Overview
//! The builder consumes `visualization_plan.json` and nothing else: no chart
//! is ever synthesized from raw insights. Each plan item's data slice is
//! executed over the loaded table (filter, group-by, aggregate, sort, limit),
//! themed with compliant KDS options, and written to `outputs/charts/`.
//! Suppressed plan items are never rendered. Exports receive a manifest
//! naming every chart; deliverable assembly is downstream of this crate.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use kie_brand::AxisOptions;
use kie_brand::ChartConfig;
use kie_brand::ChartOptions;
use kie_brand::ChartType;
use kie_brand::Formatter;
use kie_brand::FormatterKind;
use kie_brand::series_colors;
use kie_core::ArtifactRef;
use kie_core::BuildTarget;
use kie_core::ProjectSpec;
use kie_core::SemanticRole;
use kie_core::Theme;
use kie_core::WorkspaceLayout;
use kie_core::atomic_write;
use kie_intelligence::CellValue;
use kie_intelligence::ColumnMapping;
use kie_intelligence::DataTable;
use kie_intelligence::PlanItem;
use kie_intelligence::VisualizationPlan;
use kie_intelligence::planner::AggregateOp;
use kie_intelligence::planner::ChartKind;
use kie_intelligence::planner::Orientation;
use kie_intelligence::planner::SortKey;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;
use tracing::info;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Chart building errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A plan item references a column the dataset does not have.
    #[error("plan item {item} references unknown column {column}")]
    UnknownColumn {
        /// Plan item identifier.
        item: String,
        /// Missing column name.
        column: String,
    },
    /// Serializing a chart configuration failed.
    #[error("failed to serialize chart: {0}")]
    Serialize(String),
    /// A filesystem operation failed.
    #[error("build io error at {path}: {detail}")]
    Io {
        /// Path involved in the failed operation.
        path: String,
        /// Failure detail.
        detail: String,
    },
}

// ============================================================================
// SECTION: Slice Execution
// ============================================================================

/// Default row cap for un-aggregated slices.
const RAW_SLICE_LIMIT: usize = 500;

/// Executes a plan item's data slice over the table.
///
/// # Errors
///
/// Returns [`BuildError::UnknownColumn`] when the slice references a column
/// the dataset does not have.
pub fn execute_slice(
    table: &DataTable,
    item: &PlanItem,
) -> Result<Vec<Map<String, Value>>, BuildError> {
    let slice = &item.data_slice;
    let mut row_indices: Vec<usize> = (0..table.row_count).collect();

    if let Some(filter) = &slice.filter {
        let column = table.column(&filter.column).ok_or_else(|| BuildError::UnknownColumn {
            item: item.id.to_string(),
            column: filter.column.clone(),
        })?;
        row_indices.retain(|&row| {
            column.values.get(row).map(CellValue::render).as_deref()
                == Some(filter.equals.as_str())
        });
    }

    if slice.group_by.is_empty() {
        return project_rows(table, item, &row_indices);
    }

    for name in &slice.group_by {
        if !table.has_column(name) {
            return Err(BuildError::UnknownColumn {
                item: item.id.to_string(),
                column: name.clone(),
            });
        }
    }
    let aggregate = slice.aggregate.as_ref();
    let measure_name = aggregate.and_then(|spec| spec.column.clone()).unwrap_or_else(|| {
        item.y.first().cloned().unwrap_or_else(|| "count".to_string())
    });
    let measure = table.column(&measure_name);
    let op = aggregate.map_or(AggregateOp::Count, |spec| spec.op);

    let mut groups: BTreeMap<Vec<String>, (f64, usize)> = BTreeMap::new();
    for &row in &row_indices {
        let mut key = Vec::with_capacity(slice.group_by.len());
        let mut key_complete = true;
        for name in &slice.group_by {
            let Some(cell) = table.column(name).and_then(|column| column.values.get(row))
            else {
                key_complete = false;
                break;
            };
            if cell.is_null() {
                key_complete = false;
                break;
            }
            key.push(cell.render());
        }
        if !key_complete {
            continue;
        }
        let entry = groups.entry(key).or_insert((0.0, 0));
        entry.1 += 1;
        if let Some(value) = measure
            .and_then(|column| column.values.get(row))
            .and_then(CellValue::as_number)
        {
            entry.0 += value;
        }
    }

    let mut rows: Vec<Map<String, Value>> = groups
        .into_iter()
        .map(|(key, (sum, count))| {
            let mut row = Map::new();
            for (name, value) in slice.group_by.iter().zip(key) {
                row.insert(name.clone(), Value::String(value));
            }
            let aggregated = match op {
                AggregateOp::Sum => sum,
                AggregateOp::Mean => {
                    if count == 0 {
                        0.0
                    } else {
                        sum / count as f64
                    }
                }
                AggregateOp::Count => count as f64,
            };
            row.insert(measure_name.clone(), number_value(aggregated));
            row
        })
        .collect();

    if let Some(sort) = slice.sort {
        match sort.by {
            SortKey::Value => rows.sort_by(|a, b| {
                let left = a.get(&measure_name).and_then(Value::as_f64).unwrap_or(0.0);
                let right = b.get(&measure_name).and_then(Value::as_f64).unwrap_or(0.0);
                if sort.descending { right.total_cmp(&left) } else { left.total_cmp(&right) }
            }),
            SortKey::Label => {
                let label = slice.group_by.first().cloned().unwrap_or_default();
                rows.sort_by(|a, b| {
                    let left = a.get(&label).and_then(Value::as_str).unwrap_or("");
                    let right = b.get(&label).and_then(Value::as_str).unwrap_or("");
                    if sort.descending { right.cmp(left) } else { left.cmp(right) }
                });
            }
        }
    }
    if let Some(limit) = slice.limit {
        rows.truncate(limit);
    }
    Ok(rows)
}

/// Projects raw rows for un-aggregated slices (scatter charts).
fn project_rows(
    table: &DataTable,
    item: &PlanItem,
    row_indices: &[usize],
) -> Result<Vec<Map<String, Value>>, BuildError> {
    let mut names: Vec<String> = Vec::new();
    if let Some(x) = &item.x {
        names.push(x.clone());
    }
    names.extend(item.y.iter().cloned());
    for name in &names {
        if !table.has_column(name) {
            return Err(BuildError::UnknownColumn {
                item: item.id.to_string(),
                column: name.clone(),
            });
        }
    }
    let mut rows = Vec::new();
    for &row in row_indices.iter().take(RAW_SLICE_LIMIT) {
        let mut out = Map::new();
        let mut any_value = false;
        for name in &names {
            let Some(cell) = table.column(name).and_then(|column| column.values.get(row))
            else {
                continue;
            };
            if !cell.is_null() {
                any_value = true;
            }
            out.insert(name.clone(), cell_value(cell));
        }
        if any_value {
            rows.push(out);
        }
    }
    Ok(rows)
}

/// Converts a cell into a JSON value.
fn cell_value(cell: &CellValue) -> Value {
    match cell {
        CellValue::Null => Value::Null,
        CellValue::Bool(flag) => Value::Bool(*flag),
        CellValue::Int(int) => Value::Number((*int).into()),
        CellValue::Float(float) => number_value(*float),
        CellValue::Text(_) | CellValue::Date(_) => Value::String(cell.render()),
    }
}

/// Converts a float into a JSON number, mapping non-finite values to null.
fn number_value(value: f64) -> Value {
    serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number)
}

// ============================================================================
// SECTION: Chart Assembly
// ============================================================================

/// Result of building every chart in the plan.
///
/// # Invariants
/// - `charts` pairs each written file's workspace-relative path with its
///   parsed configuration (for validation).
#[derive(Debug, Default)]
pub struct BuiltCharts {
    /// Artifact references for the written chart files.
    pub artifacts: Vec<ArtifactRef>,
    /// Written charts by relative path.
    pub charts: Vec<(String, ChartConfig)>,
    /// Advisory warnings raised during building.
    pub warnings: Vec<String>,
}

/// Builds every renderable chart in the plan.
///
/// # Errors
///
/// Returns [`BuildError`] when a slice references unknown columns or a chart
/// cannot be written.
pub fn build_charts(
    workspace: &WorkspaceLayout,
    theme: Theme,
    table: &DataTable,
    plan: &VisualizationPlan,
    mapping: &ColumnMapping,
) -> Result<BuiltCharts, BuildError> {
    let mut built = BuiltCharts::default();
    for item in &plan.items {
        if item.suppressed {
            built.warnings.push(format!("plan item {} is suppressed; skipped", item.id));
            continue;
        }
        let data = execute_slice(table, item)?;
        if data.is_empty() {
            built.warnings.push(format!("plan item {} produced an empty slice; skipped", item.id));
            continue;
        }
        let chart = assemble_chart(theme, item, data, mapping);
        let relative = format!("outputs/charts/{}.json", item.id);
        let json = serde_json::to_vec_pretty(&chart)
            .map_err(|err| BuildError::Serialize(err.to_string()))?;
        let path = workspace.root().join(&relative);
        atomic_write(&path, &json).map_err(|err| BuildError::Io {
            path: path.display().to_string(),
            detail: err.to_string(),
        })?;
        let artifact =
            ArtifactRef::from_file(workspace.root(), &relative).map_err(|err| BuildError::Io {
                path: relative.clone(),
                detail: err.to_string(),
            })?;
        built.artifacts.push(artifact);
        built.charts.push((relative, chart));
    }
    info!(charts = built.charts.len(), "charts built from the visualization plan");
    Ok(built)
}

/// Assembles one compliant chart configuration from slice data.
fn assemble_chart(
    theme: Theme,
    item: &PlanItem,
    data: Vec<Map<String, Value>>,
    mapping: &ColumnMapping,
) -> ChartConfig {
    let series_count = match item.chart_type {
        ChartKind::Pie => data.len().max(1),
        ChartKind::Combo => 2,
        _ => {
            if item.stacked {
                distinct_series(&data, item.data_slice.group_by.get(1))
            } else {
                item.y.len().max(1)
            }
        }
    };
    let mut config = ChartOptions::compliant(theme, series_colors(series_count));
    config.stacked = item.stacked;
    if item.orientation == Orientation::Horizontal {
        config.layout = Some("horizontal".to_string());
    }
    config.x_axis = AxisOptions {
        title: item.x.clone(),
        ..config.x_axis
    };
    config.y_axis = AxisOptions {
        title: item.y.first().cloned(),
        ..config.y_axis
    };
    config.formatters = item.y.first().map(|measure| vec![formatter_for(measure, mapping)]);

    ChartConfig {
        chart_type: wire_type(item.chart_type),
        data,
        config,
        title: Some(item.title.clone()),
        subtitle: item.subtitle.clone(),
    }
}

/// Counts distinct values of the series column in slice output.
fn distinct_series(data: &[Map<String, Value>], series_column: Option<&String>) -> usize {
    let Some(column) = series_column else {
        return 1;
    };
    let mut seen: Vec<&str> = Vec::new();
    for row in data {
        if let Some(Value::String(value)) = row.get(column)
            && !seen.contains(&value.as_str())
        {
            seen.push(value);
        }
    }
    seen.len().max(1)
}

/// Chooses the y-axis formatter from the measure's mapped role.
fn formatter_for(measure: &str, mapping: &ColumnMapping) -> Formatter {
    let roles = mapping.roles_of(measure);
    let kind = if roles.contains(&SemanticRole::Margin) {
        FormatterKind::Percentage
    } else if roles.contains(&SemanticRole::Revenue) || roles.contains(&SemanticRole::Cost) {
        FormatterKind::Currency
    } else {
        FormatterKind::Number
    };
    Formatter {
        kind,
        axis: "y".to_string(),
        decimals: if kind == FormatterKind::Percentage { 1 } else { 0 },
        currency: (kind == FormatterKind::Currency).then(|| "USD".to_string()),
    }
}

/// Maps the planner's chart kind onto the wire type.
const fn wire_type(kind: ChartKind) -> ChartType {
    match kind {
        ChartKind::Bar => ChartType::Bar,
        ChartKind::Line => ChartType::Line,
        ChartKind::Area => ChartType::Area,
        ChartKind::Pie => ChartType::Pie,
        ChartKind::Scatter => ChartType::Scatter,
        ChartKind::Combo => ChartType::Combo,
    }
}

// ============================================================================
// SECTION: Exports
// ============================================================================

/// Export manifest describing the assembled deliverable inputs.
///
/// # Invariants
/// - `charts` lists workspace-relative chart paths in plan order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportManifest {
    /// Deliverable target.
    pub target: BuildTarget,
    /// Project name from the spec.
    pub project_name: String,
    /// Theme the charts were built with.
    pub theme: Theme,
    /// Chart files included in the deliverable.
    pub charts: Vec<String>,
    /// The plan the charts were generated from.
    pub generated_from: String,
}

/// Writes the export manifest for a build target.
///
/// # Errors
///
/// Returns [`BuildError`] when the manifest cannot be written.
pub fn write_export_manifest(
    workspace: &WorkspaceLayout,
    target: BuildTarget,
    spec: &ProjectSpec,
    theme: Theme,
    charts: &[(String, ChartConfig)],
) -> Result<ArtifactRef, BuildError> {
    let manifest = ExportManifest {
        target,
        project_name: spec.project_name.clone(),
        theme,
        charts: charts.iter().map(|(path, _)| path.clone()).collect(),
        generated_from: "outputs/visualization_plan.json".to_string(),
    };
    let relative = format!("exports/{target}/manifest.json");
    let json = serde_json::to_vec_pretty(&manifest)
        .map_err(|err| BuildError::Serialize(err.to_string()))?;
    let path = workspace.root().join(&relative);
    atomic_write(&path, &json).map_err(|err| BuildError::Io {
        path: path.display().to_string(),
        detail: err.to_string(),
    })?;
    ArtifactRef::from_file(workspace.root(), &relative).map_err(|err| BuildError::Io {
        path: relative.clone(),
        detail: err.to_string(),
    })
}

// ============================================================================
// SECTION: Dataset Rows
// ============================================================================

/// Renders table rows as JSON maps for the data-integrity rules.
#[must_use]
pub fn dataset_rows(table: &DataTable, limit: usize) -> Vec<Map<String, Value>> {
    let mut rows = Vec::new();
    for row in 0..table.row_count.min(limit) {
        let mut out = Map::new();
        for column in &table.columns {
            if let Some(cell) = column.values.get(row) {
                out.insert(column.name.clone(), cell_value(cell));
            }
        }
        rows.push(out);
    }
    rows
}
