// crates/kie-intelligence/src/planner.rs
// ============================================================================
// Module: Visualization Planner
// Description: Maps kept insights to chart intents through a fixed rubric.
// Purpose: Produce the sole legal input for downstream chart generation.
// Dependencies: crate::{analyzer, mapper, table, triage}, kie-core, serde
// ============================================================================

//! ## Overview
//! The planner converts kept insights into ordered chart intents using a
//! fixed rubric: trend→line, comparison→bar, composition with at most four
//! parts→pie (otherwise stacked bar), correlation→scatter, concentration→
//! sorted bar, ranking→horizontal bar, and combination cases→combo. Every
//! item carries its insight references, rationale, priority, and a data
//! slice specification. Downstream chart generation reads only the plan;
//! suppressed insights are never rendered and their omission is explained.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use kie_core::InsightId;
use kie_core::PlanItemId;
use kie_core::SemanticRole;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::analyzer::InsightKind;
use crate::analyzer::RawInsight;
use crate::mapper::ColumnMapping;
use crate::table::Column;
use crate::table::DataTable;
use crate::triage::TriageEntry;
use crate::triage::TriageStatus;

// ============================================================================
// SECTION: Chart Vocabulary
// ============================================================================

/// Chart families the front end can render.
///
/// # Invariants
/// - Variants are stable for the chart-configuration wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    /// Vertical or horizontal bars.
    Bar,
    /// Line chart.
    Line,
    /// Area chart.
    Area,
    /// Pie chart (two to four segments).
    Pie,
    /// Scatter plot.
    Scatter,
    /// Combined bar and line.
    Combo,
}

impl ChartKind {
    /// Returns the canonical wire form of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bar => "bar",
            Self::Line => "line",
            Self::Area => "area",
            Self::Pie => "pie",
            Self::Scatter => "scatter",
            Self::Combo => "combo",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bar orientation.
///
/// # Invariants
/// - Variants are stable for serialization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Vertical bars (default).
    #[default]
    Vertical,
    /// Horizontal bars, used for rankings.
    Horizontal,
}

// ============================================================================
// SECTION: Data Slice Specification
// ============================================================================

/// Aggregate operations a slice may apply.
///
/// # Invariants
/// - Variants are stable for serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateOp {
    /// Sum of the measure.
    Sum,
    /// Mean of the measure.
    Mean,
    /// Row count.
    Count,
}

/// Aggregation over a measure column.
///
/// # Invariants
/// - `column` is required for `sum` and `mean`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateSpec {
    /// Operation to apply.
    pub op: AggregateOp,
    /// Measure column, when the operation needs one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
}

/// Equality filter on one column.
///
/// # Invariants
/// - `equals` compares against the rendered cell value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Column to filter on.
    pub column: String,
    /// Rendered value rows must match.
    pub equals: String,
}

/// Sort key for slice output.
///
/// # Invariants
/// - Variants are stable for serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Sort by aggregated value.
    Value,
    /// Sort by group label.
    Label,
}

/// Sort directive for slice output.
///
/// # Invariants
/// - Applied after aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    /// Key to sort by.
    pub by: SortKey,
    /// Descending order when true.
    pub descending: bool,
}

/// Declarative slice of the dataset feeding one chart.
///
/// # Invariants
/// - `group_by` columns exist in the profiled dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSliceSpec {
    /// Optional row filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<FilterSpec>,
    /// Grouping columns, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group_by: Vec<String>,
    /// Aggregation over the groups.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<AggregateSpec>,
    /// Sort directive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortSpec>,
    /// Row cap after sorting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

// ============================================================================
// SECTION: Plan Types
// ============================================================================

/// One chart intent.
///
/// # Invariants
/// - `insight_refs` is never empty.
/// - A suppressed item is never rendered downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanItem {
    /// Plan-item identifier.
    pub id: PlanItemId,
    /// Chart family.
    pub chart_type: ChartKind,
    /// Stacked series rendering (bar charts).
    #[serde(default)]
    pub stacked: bool,
    /// Bar orientation.
    #[serde(default)]
    pub orientation: Orientation,
    /// X-axis column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    /// Y-axis columns (series).
    pub y: Vec<String>,
    /// Data slice feeding the chart.
    pub data_slice: DataSliceSpec,
    /// Chart title.
    pub title: String,
    /// Chart subtitle (analyst narrative).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    /// Why this chart exists.
    pub rationale: String,
    /// Priority inherited from triage.
    pub priority: f64,
    /// Insights this chart renders.
    pub insight_refs: Vec<InsightId>,
    /// Marked true only when the item must not be rendered.
    #[serde(default)]
    pub suppressed: bool,
}

/// Explanation for an insight that did not become a chart.
///
/// # Invariants
/// - One entry per non-kept insight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OmittedInsight {
    /// Insight identifier.
    pub id: InsightId,
    /// Why it was omitted.
    pub reason: String,
}

/// Ordered list of chart intents; the sole legal source for chart generation.
///
/// # Invariants
/// - Items are ordered by descending priority.
/// - No item references a suppressed insight.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisualizationPlan {
    /// Objective the plan serves.
    pub objective: String,
    /// Chart intents, highest priority first.
    pub items: Vec<PlanItem>,
    /// Omitted insights with reasons.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub omitted: Vec<OmittedInsight>,
}

// ============================================================================
// SECTION: Planning
// ============================================================================

/// Maximum segments a pie chart may carry.
const PIE_SEGMENT_CEILING: usize = 4;

/// Builds the visualization plan from kept insights.
#[must_use]
pub fn plan(
    table: &DataTable,
    insights: &[RawInsight],
    triage: &[TriageEntry],
    mapping: &ColumnMapping,
    objective: &str,
) -> VisualizationPlan {
    let mut omitted = Vec::new();
    let mut kept: Vec<(&RawInsight, f64)> = Vec::new();
    for insight in insights {
        let Some(entry) = triage.iter().find(|entry| entry.id == insight.id) else {
            continue;
        };
        match &entry.status {
            TriageStatus::Keep => kept.push((insight, entry.priority)),
            TriageStatus::Suppressed {
                reason,
            } => omitted.push(OmittedInsight {
                id: insight.id.clone(),
                reason: format!("suppressed: {reason}"),
            }),
            TriageStatus::MergedInto {
                id,
            } => omitted.push(OmittedInsight {
                id: insight.id.clone(),
                reason: format!("merged into {id}"),
            }),
        }
    }
    kept.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.id.cmp(&b.0.id)));

    let mut items: Vec<PlanItem> = kept
        .iter()
        .filter_map(|(insight, priority)| intent_for(table, insight, *priority, mapping))
        .collect();
    merge_combo_cases(&mut items, mapping);
    for (index, item) in items.iter_mut().enumerate() {
        item.id = PlanItemId::new(format!("chart-{:02}", index + 1));
    }
    debug!(items = items.len(), omitted = omitted.len(), "visualization plan built");
    VisualizationPlan {
        objective: objective.to_string(),
        items,
        omitted,
    }
}

/// Builds the chart intent for one kept insight.
fn intent_for(
    table: &DataTable,
    insight: &RawInsight,
    priority: f64,
    mapping: &ColumnMapping,
) -> Option<PlanItem> {
    let item = match insight.kind {
        InsightKind::Trend => trend_intent(insight, mapping)?,
        InsightKind::Comparison => comparison_intent(insight, false)?,
        InsightKind::Outlier => outlier_intent(insight)?,
        InsightKind::Correlation => correlation_intent(insight)?,
        InsightKind::Concentration => comparison_intent(insight, true)?,
        InsightKind::Composition => composition_intent(table, insight, mapping)?,
        InsightKind::Ranking => ranking_intent(insight)?,
    };
    Some(PlanItem {
        priority,
        subtitle: Some(insight.narrative.clone()),
        insight_refs: vec![insight.id.clone()],
        ..item
    })
}

/// Blank item template filled by the per-kind constructors.
fn blank(chart_type: ChartKind, title: String, rationale: String) -> PlanItem {
    PlanItem {
        id: PlanItemId::new("chart-00"),
        chart_type,
        stacked: false,
        orientation: Orientation::default(),
        x: None,
        y: Vec::new(),
        data_slice: DataSliceSpec::default(),
        title,
        subtitle: None,
        rationale,
        priority: 0.0,
        insight_refs: Vec::new(),
        suppressed: false,
    }
}

/// Trend → line over the date column.
fn trend_intent(insight: &RawInsight, mapping: &ColumnMapping) -> Option<PlanItem> {
    let date = mapping.column_for(SemanticRole::Date)?.to_string();
    let measure = insight
        .source_columns
        .iter()
        .find(|column| **column != date)?
        .clone();
    let mut item = blank(
        ChartKind::Line,
        format!("{measure} Over Time"),
        "time-series trend maps to a line chart".to_string(),
    );
    item.x = Some(date.clone());
    item.y = vec![measure.clone()];
    item.data_slice = DataSliceSpec {
        group_by: vec![date],
        aggregate: Some(AggregateSpec {
            op: AggregateOp::Sum,
            column: Some(measure),
        }),
        sort: Some(SortSpec {
            by: SortKey::Label,
            descending: false,
        }),
        ..DataSliceSpec::default()
    };
    Some(item)
}

/// Comparison (and concentration) → bar across categories.
fn comparison_intent(insight: &RawInsight, sorted_concentration: bool) -> Option<PlanItem> {
    let category = insight.source_columns.first()?.clone();
    let measure = insight.source_columns.get(1)?.clone();
    let (title, rationale) = if sorted_concentration {
        (
            format!("Concentration of {measure}"),
            "concentration maps to a bar chart sorted by share".to_string(),
        )
    } else {
        (
            format!("{measure} by {category}"),
            "comparison across categories maps to a bar chart".to_string(),
        )
    };
    let mut item = blank(ChartKind::Bar, title, rationale);
    item.x = Some(category.clone());
    item.y = vec![measure.clone()];
    item.data_slice = DataSliceSpec {
        group_by: vec![category],
        aggregate: Some(AggregateSpec {
            op: AggregateOp::Sum,
            column: Some(measure),
        }),
        sort: Some(SortSpec {
            by: SortKey::Value,
            descending: true,
        }),
        ..DataSliceSpec::default()
    };
    Some(item)
}

/// Outlier → scatter of the raw column against row order.
fn outlier_intent(insight: &RawInsight) -> Option<PlanItem> {
    let column = insight.source_columns.first()?.clone();
    let mut item = blank(
        ChartKind::Scatter,
        format!("Outliers in {column}"),
        "outlier screening maps to a scatter of raw values".to_string(),
    );
    item.y = vec![column];
    Some(item)
}

/// Correlation → scatter of the two columns.
fn correlation_intent(insight: &RawInsight) -> Option<PlanItem> {
    let left = insight.source_columns.first()?.clone();
    let right = insight.source_columns.get(1)?.clone();
    let mut item = blank(
        ChartKind::Scatter,
        format!("{left} vs {right}"),
        "correlation maps to a scatter plot".to_string(),
    );
    item.x = Some(left);
    item.y = vec![right];
    Some(item)
}

/// Composition → pie when at most four parts, otherwise stacked bar.
fn composition_intent(
    table: &DataTable,
    insight: &RawInsight,
    mapping: &ColumnMapping,
) -> Option<PlanItem> {
    let category = mapping.column_for(SemanticRole::Category)?.to_string();
    let measure = insight.source_columns.last()?.clone();
    let parts = table.column(&category).map_or(usize::MAX, Column::unique_count);
    if (2..=PIE_SEGMENT_CEILING).contains(&parts) {
        let mut item = blank(
            ChartKind::Pie,
            format!("{measure} Mix"),
            format!("composition with {parts} parts maps to a pie chart"),
        );
        item.x = Some(category.clone());
        item.y = vec![measure.clone()];
        item.data_slice = DataSliceSpec {
            group_by: vec![category],
            aggregate: Some(AggregateSpec {
                op: AggregateOp::Sum,
                column: Some(measure),
            }),
            sort: Some(SortSpec {
                by: SortKey::Value,
                descending: true,
            }),
            ..DataSliceSpec::default()
        };
        return Some(item);
    }
    let date = mapping.column_for(SemanticRole::Date)?.to_string();
    let mut item = blank(
        ChartKind::Bar,
        format!("{measure} Mix Over Time"),
        format!("composition with {parts} parts exceeds the pie ceiling; stacked bar instead"),
    );
    item.stacked = true;
    item.x = Some(date.clone());
    item.y = vec![measure.clone()];
    item.data_slice = DataSliceSpec {
        group_by: vec![date, category],
        aggregate: Some(AggregateSpec {
            op: AggregateOp::Sum,
            column: Some(measure),
        }),
        sort: Some(SortSpec {
            by: SortKey::Label,
            descending: false,
        }),
        ..DataSliceSpec::default()
    };
    Some(item)
}

/// Ranking → horizontal bar.
fn ranking_intent(insight: &RawInsight) -> Option<PlanItem> {
    let category = insight.source_columns.first()?.clone();
    let measure = insight.source_columns.get(1)?.clone();
    let mut item = blank(
        ChartKind::Bar,
        format!("Top {category} by {measure}"),
        "ranking maps to a horizontal bar chart".to_string(),
    );
    item.orientation = Orientation::Horizontal;
    item.x = Some(category.clone());
    item.y = vec![measure.clone()];
    item.data_slice = DataSliceSpec {
        group_by: vec![category],
        aggregate: Some(AggregateSpec {
            op: AggregateOp::Sum,
            column: Some(measure),
        }),
        sort: Some(SortSpec {
            by: SortKey::Value,
            descending: true,
        }),
        limit: Some(10),
        ..DataSliceSpec::default()
    };
    Some(item)
}

/// Combination cases: a trend line and a category bar over the same measure
/// collapse into one combo chart.
fn merge_combo_cases(items: &mut Vec<PlanItem>, mapping: &ColumnMapping) {
    let Some(category) = mapping.column_for(SemanticRole::Category) else {
        return;
    };
    let trend_position = items
        .iter()
        .position(|item| item.chart_type == ChartKind::Line && !item.y.is_empty());
    let Some(trend_position) = trend_position else {
        return;
    };
    let measure = items[trend_position].y[0].clone();
    let bar_position = items.iter().position(|item| {
        item.chart_type == ChartKind::Bar
            && !item.stacked
            && item.orientation == Orientation::Vertical
            && item.y.first() == Some(&measure)
    });
    let Some(bar_position) = bar_position else {
        return;
    };
    let bar = items.remove(bar_position);
    let trend_position = if bar_position < trend_position {
        trend_position - 1
    } else {
        trend_position
    };
    let Some(trend) = items.get_mut(trend_position) else {
        return;
    };
    trend.chart_type = ChartKind::Combo;
    trend.title = format!("{measure} Trend and {category} Split");
    trend.rationale =
        "combined trend and comparison over one measure maps to a combo chart".to_string();
    trend.data_slice.group_by.push(category.to_string());
    trend.insight_refs.extend(bar.insight_refs);
    trend.priority = trend.priority.max(bar.priority);
}
