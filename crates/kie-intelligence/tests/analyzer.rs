// crates/kie-intelligence/tests/analyzer.rs
// ============================================================================
// Module: Statistical Analyzer Tests
// Description: Validate insight generation, citations, and boundaries.
// ============================================================================
//! ## Overview
//! Ensures the analyzer finds trends, comparisons, and rankings on data
//! built to contain them; that every insight cites source columns with a
//! bounded magnitude and confidence; and that empty datasets refuse with
//! "no rows".

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use kie_intelligence::AnalyzeError;
use kie_intelligence::CellValue;
use kie_intelligence::Column;
use kie_intelligence::ColumnType;
use kie_intelligence::DataTable;
use kie_intelligence::InsightKind;
use kie_intelligence::RoleLexicon;
use kie_intelligence::analyzer::analyze;
use kie_intelligence::map_columns;
use time::Date;
use time::Month;

/// Builds a date cell for a day in 2024.
fn day(month: Month, day: u8) -> CellValue {
    CellValue::Date(Date::from_calendar_date(2024, month, day).expect("valid date"))
}

/// A small sales table with a clear upward trend and group separation.
fn sales_table() -> DataTable {
    let dates = vec![
        day(Month::January, 1),
        day(Month::February, 1),
        day(Month::March, 1),
        day(Month::April, 1),
        day(Month::May, 1),
        day(Month::June, 1),
    ];
    let regions = ["North", "South", "North", "South", "North", "South"];
    let revenue = [100.0, 40.0, 160.0, 55.0, 230.0, 70.0];
    DataTable::new(vec![
        Column::new("order_date", ColumnType::Datetime, dates),
        Column::new(
            "region",
            ColumnType::Categorical,
            regions.iter().map(|name| CellValue::Text((*name).to_string())).collect(),
        ),
        Column::new(
            "revenue",
            ColumnType::Numeric,
            revenue.iter().map(|value| CellValue::Float(*value)).collect(),
        ),
    ])
}

#[test]
fn empty_dataset_blocks_with_no_rows() {
    let table = DataTable::new(vec![Column::new("revenue", ColumnType::Numeric, Vec::new())]);
    let mapping = map_columns(&table, None, &RoleLexicon::default());
    let err = analyze(&table, &mapping).expect_err("no rows must refuse");
    assert!(matches!(err, AnalyzeError::NoRows));
    assert!(err.to_string().contains("no rows"));
}

#[test]
fn trend_is_found_on_trending_data() {
    let table = sales_table();
    let mapping = map_columns(&table, None, &RoleLexicon::default());
    let insights = analyze(&table, &mapping).expect("analyze");
    let trend = insights
        .iter()
        .find(|insight| insight.kind == InsightKind::Trend)
        .expect("a trend insight");
    assert!(trend.source_columns.contains(&"order_date".to_string()));
    assert!(trend.source_columns.contains(&"revenue".to_string()));
    assert!(trend.narrative.contains("upward"));
}

#[test]
fn ranking_orders_groups_by_measure() {
    let table = sales_table();
    let mapping = map_columns(&table, None, &RoleLexicon::default());
    let insights = analyze(&table, &mapping).expect("analyze");
    let ranking = insights
        .iter()
        .find(|insight| insight.kind == InsightKind::Ranking)
        .expect("a ranking insight");
    assert_eq!(ranking.entities.first().map(String::as_str), Some("North"));
}

#[test]
fn every_insight_cites_sources_and_stays_bounded() {
    let table = sales_table();
    let mapping = map_columns(&table, None, &RoleLexicon::default());
    let insights = analyze(&table, &mapping).expect("analyze");
    assert!(!insights.is_empty());
    for insight in &insights {
        assert!(!insight.source_columns.is_empty(), "{} cites no columns", insight.id);
        assert!((0.0..=1.0).contains(&insight.magnitude), "{} magnitude", insight.id);
        assert!((0.0..=1.0).contains(&insight.confidence), "{} confidence", insight.id);
        assert!(!insight.narrative.is_empty());
    }
}

#[test]
fn insight_ids_are_deterministic() {
    let table = sales_table();
    let mapping = map_columns(&table, None, &RoleLexicon::default());
    let first = analyze(&table, &mapping).expect("first run");
    let second = analyze(&table, &mapping).expect("second run");
    assert_eq!(first, second);
}

#[test]
fn correlation_respects_the_floor() {
    // Uncorrelated noise must not produce a correlation insight.
    let table = DataTable::new(vec![
        Column::new(
            "revenue_a",
            ColumnType::Numeric,
            vec![
                CellValue::Float(10.0),
                CellValue::Float(90.0),
                CellValue::Float(20.0),
                CellValue::Float(80.0),
                CellValue::Float(30.0),
                CellValue::Float(70.0),
            ],
        ),
        Column::new(
            "cost_b",
            ColumnType::Numeric,
            vec![
                CellValue::Float(50.0),
                CellValue::Float(49.0),
                CellValue::Float(52.0),
                CellValue::Float(48.0),
                CellValue::Float(51.0),
                CellValue::Float(50.5),
            ],
        ),
    ]);
    let mapping = map_columns(&table, None, &RoleLexicon::default());
    let insights = analyze(&table, &mapping).expect("analyze");
    let correlations: Vec<_> = insights
        .iter()
        .filter(|insight| insight.kind == InsightKind::Correlation)
        .collect();
    for correlation in correlations {
        assert!(correlation.magnitude >= 0.5);
    }
}

#[test]
fn single_row_produces_no_variance_insights() {
    let table = DataTable::new(vec![
        Column::new("order_date", ColumnType::Datetime, vec![day(Month::January, 1)]),
        Column::new(
            "region",
            ColumnType::Categorical,
            vec![CellValue::Text("North".to_string())],
        ),
        Column::new("revenue", ColumnType::Numeric, vec![CellValue::Float(100.0)]),
    ]);
    let mapping = map_columns(&table, None, &RoleLexicon::default());
    let insights = analyze(&table, &mapping).expect("analyze");
    assert!(
        insights
            .iter()
            .all(|insight| !matches!(insight.kind, InsightKind::Trend | InsightKind::Comparison))
    );
}
