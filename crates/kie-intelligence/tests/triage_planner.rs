// crates/kie-intelligence/tests/triage_planner.rs
// ============================================================================
// Module: Triage and Planner Tests
// Description: Validate suppression, dedup, priority, and the chart rubric.
// ============================================================================
//! ## Overview
//! Ensures triage deduplicates overlapping insights, suppresses below the
//! configured floors with persisted reasons, scores priority from the
//! configured weights, and that the planner maps kinds through the fixed
//! rubric (with the pie ceiling falling back to a stacked bar) while never
//! planning a suppressed insight.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use kie_config::TriageConfig;
use kie_core::InsightId;
use kie_intelligence::CellValue;
use kie_intelligence::ChartKind;
use kie_intelligence::Column;
use kie_intelligence::ColumnType;
use kie_intelligence::DataTable;
use kie_intelligence::InsightKind;
use kie_intelligence::RawInsight;
use kie_intelligence::RoleLexicon;
use kie_intelligence::TriageStatus;
use kie_intelligence::map_columns;
use kie_intelligence::plan;
use kie_intelligence::planner::Orientation;
use kie_intelligence::triage;
use time::Date;
use time::Month;

/// Builds an insight with the given identity and scores.
fn insight(
    id: &str,
    kind: InsightKind,
    entities: &[&str],
    magnitude: f64,
    confidence: f64,
    sources: &[&str],
) -> RawInsight {
    RawInsight {
        id: InsightId::new(id),
        kind,
        entities: entities.iter().map(ToString::to_string).collect(),
        magnitude,
        confidence,
        source_columns: sources.iter().map(ToString::to_string).collect(),
        narrative: format!("{kind} over {}", sources.join(", ")),
    }
}

/// A table whose category column has `parts` distinct groups.
fn table_with_groups(parts: usize) -> DataTable {
    let mut dates = Vec::new();
    let mut groups = Vec::new();
    let mut revenue = Vec::new();
    for index in 0..parts * 2 {
        let month = if index % 2 == 0 { Month::January } else { Month::June };
        dates.push(CellValue::Date(
            Date::from_calendar_date(2024, month, 1).expect("date"),
        ));
        groups.push(CellValue::Text(format!("Segment {}", index % parts)));
        revenue.push(CellValue::Float(100.0 + index as f64 * 10.0));
    }
    DataTable::new(vec![
        Column::new("order_date", ColumnType::Datetime, dates),
        Column::new("segment", ColumnType::Categorical, groups),
        Column::new("revenue", ColumnType::Numeric, revenue),
    ])
}

/// Default triage configuration for tests.
fn config() -> TriageConfig {
    TriageConfig::default()
}

#[test]
fn duplicates_merge_into_the_highest_magnitude() {
    let insights = vec![
        insight("ins-001", InsightKind::Ranking, &["North"], 0.4, 0.8, &["segment", "revenue"]),
        insight("ins-002", InsightKind::Ranking, &["North"], 0.7, 0.8, &["segment", "revenue"]),
    ];
    let table = table_with_groups(3);
    let mapping = map_columns(&table, None, &RoleLexicon::default());
    let entries = triage(&insights, "rank revenue", &mapping, &RoleLexicon::default(), &config());
    assert_eq!(
        entries[0].status,
        TriageStatus::MergedInto {
            id: InsightId::new("ins-002"),
        }
    );
    assert_eq!(entries[1].status, TriageStatus::Keep);
}

#[test]
fn floors_suppress_with_persisted_reasons() {
    let insights = vec![
        insight("ins-001", InsightKind::Trend, &["revenue"], 0.05, 0.9, &["order_date", "revenue"]),
        insight("ins-002", InsightKind::Trend, &["cost"], 0.8, 0.1, &["order_date", "revenue"]),
    ];
    let table = table_with_groups(3);
    let mapping = map_columns(&table, None, &RoleLexicon::default());
    let entries = triage(&insights, "revenue growth", &mapping, &RoleLexicon::default(), &config());

    match &entries[0].status {
        TriageStatus::Suppressed {
            reason,
        } => assert!(reason.contains("magnitude")),
        other => panic!("expected suppression, got {other:?}"),
    }
    match &entries[1].status {
        TriageStatus::Suppressed {
            reason,
        } => assert!(reason.contains("confidence")),
        other => panic!("expected suppression, got {other:?}"),
    }
}

#[test]
fn priority_blends_the_configured_weights() {
    let insights = vec![insight(
        "ins-001",
        InsightKind::Ranking,
        &["North"],
        0.8,
        0.6,
        &["segment", "revenue"],
    )];
    let table = table_with_groups(3);
    let mapping = map_columns(&table, None, &RoleLexicon::default());
    let entries = triage(&insights, "", &mapping, &RoleLexicon::default(), &config());
    // With an empty objective, relevance is zero and the priority reduces to
    // (0.5 * 0.8 + 0.3 * 0.6) / 1.0.
    assert!((entries[0].priority - 0.58).abs() < 1e-9);
    assert_eq!(entries[0].status, TriageStatus::Keep);
}

#[test]
fn objective_relevant_insights_outrank_unrelated_ones() {
    let insights = vec![
        insight("ins-001", InsightKind::Ranking, &["North"], 0.5, 0.5, &["segment", "revenue"]),
        insight("ins-002", InsightKind::Outlier, &["row_weight"], 0.5, 0.5, &["row_weight"]),
    ];
    let table = table_with_groups(3);
    let mapping = map_columns(&table, None, &RoleLexicon::default());
    let entries = triage(
        &insights,
        "grow revenue across segments",
        &mapping,
        &RoleLexicon::default(),
        &config(),
    );
    assert!(entries[0].priority > entries[1].priority);
}

#[test]
fn planner_maps_kinds_through_the_rubric() {
    let table = table_with_groups(3);
    let mapping = map_columns(&table, None, &RoleLexicon::default());
    let insights = vec![
        insight("ins-001", InsightKind::Ranking, &["Segment 0"], 0.8, 0.9, &["segment", "revenue"]),
        insight(
            "ins-002",
            InsightKind::Correlation,
            &["revenue", "cost"],
            0.7,
            0.9,
            &["revenue", "cost"],
        ),
    ];
    let entries = triage(&insights, "revenue", &mapping, &RoleLexicon::default(), &config());
    let visualization = plan(&table, &insights, &entries, &mapping, "revenue");

    let ranking = visualization
        .items
        .iter()
        .find(|item| item.insight_refs.contains(&InsightId::new("ins-001")))
        .expect("ranking item");
    assert_eq!(ranking.chart_type, ChartKind::Bar);
    assert_eq!(ranking.orientation, Orientation::Horizontal);

    let correlation = visualization
        .items
        .iter()
        .find(|item| item.insight_refs.contains(&InsightId::new("ins-002")))
        .expect("correlation item");
    assert_eq!(correlation.chart_type, ChartKind::Scatter);
}

#[test]
fn composition_respects_the_pie_ceiling() {
    let few = table_with_groups(3);
    let mapping_few = map_columns(&few, None, &RoleLexicon::default());
    let composition = vec![insight(
        "ins-001",
        InsightKind::Composition,
        &["Segment 0"],
        0.8,
        0.9,
        &["order_date", "segment", "revenue"],
    )];
    let entries = triage(&composition, "revenue", &mapping_few, &RoleLexicon::default(), &config());
    let visualization = plan(&few, &composition, &entries, &mapping_few, "revenue");
    assert_eq!(visualization.items[0].chart_type, ChartKind::Pie);

    let many = table_with_groups(6);
    let mapping_many = map_columns(&many, None, &RoleLexicon::default());
    let entries = triage(&composition, "revenue", &mapping_many, &RoleLexicon::default(), &config());
    let visualization = plan(&many, &composition, &entries, &mapping_many, "revenue");
    assert_eq!(visualization.items[0].chart_type, ChartKind::Bar);
    assert!(visualization.items[0].stacked);
}

#[test]
fn suppressed_insights_are_explained_never_planned() {
    let table = table_with_groups(3);
    let mapping = map_columns(&table, None, &RoleLexicon::default());
    let insights = vec![
        insight("ins-001", InsightKind::Ranking, &["Segment 0"], 0.8, 0.9, &["segment", "revenue"]),
        insight("ins-002", InsightKind::Trend, &["revenue"], 0.02, 0.9, &["order_date", "revenue"]),
    ];
    let entries = triage(&insights, "revenue", &mapping, &RoleLexicon::default(), &config());
    let visualization = plan(&table, &insights, &entries, &mapping, "revenue");

    for item in &visualization.items {
        assert!(!item.insight_refs.contains(&InsightId::new("ins-002")));
        assert!(!item.suppressed);
    }
    let omitted = visualization
        .omitted
        .iter()
        .find(|omitted| omitted.id == InsightId::new("ins-002"))
        .expect("omission explained");
    assert!(omitted.reason.contains("suppressed"));
}

#[test]
fn plan_output_is_deterministic() {
    let table = table_with_groups(4);
    let mapping = map_columns(&table, None, &RoleLexicon::default());
    let insights = vec![insight(
        "ins-001",
        InsightKind::Ranking,
        &["Segment 0"],
        0.8,
        0.9,
        &["segment", "revenue"],
    )];
    let entries = triage(&insights, "revenue", &mapping, &RoleLexicon::default(), &config());
    let first = plan(&table, &insights, &entries, &mapping, "revenue");
    let second = plan(&table, &insights, &entries, &mapping, "revenue");
    assert_eq!(first, second);
}
