// crates/kie-intelligence/tests/mapper.rs
// ============================================================================
// Module: Semantic Mapper Tests
// Description: Validate the four scoring tiers and override precedence.
// ============================================================================
//! ## Overview
//! Ensures keyword scoring prefers stronger matches, identifier-like columns
//! never fill measure roles, rate-signature columns win rate-expecting roles,
//! the coefficient-of-variation tie-breaker is deterministic, and spec
//! overrides take absolute precedence with graceful fallback for columns
//! that do not exist.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::collections::BTreeMap;

use kie_core::SemanticRole;
use kie_intelligence::CellValue;
use kie_intelligence::Column;
use kie_intelligence::ColumnType;
use kie_intelligence::DataTable;
use kie_intelligence::MappingTier;
use kie_intelligence::RoleLexicon;
use kie_intelligence::map_columns;

/// Builds a numeric column from values.
fn numeric(name: &str, values: &[f64]) -> Column {
    Column::new(
        name,
        ColumnType::Numeric,
        values.iter().map(|value| CellValue::Float(*value)).collect(),
    )
}

/// Builds an identifier column of sequential integers.
fn identifier(name: &str, len: i64) -> Column {
    Column::new(
        name,
        ColumnType::Identifier,
        (1..=len).map(CellValue::Int).collect(),
    )
}

/// The consulting dataset from the revenue-growth scenario.
fn revenue_table() -> DataTable {
    DataTable::new(vec![
        identifier("CustomerID", 6),
        identifier("ZipCode", 6),
        numeric("Revenue", &[120.0, 95.0, 140.0, 80.0, 210.0, 60.0]),
        numeric("Recurring_Revenue", &[90.0, 60.0, 120.0, 40.0, 180.0, 30.0]),
        numeric("GrossMargin", &[0.31, 0.28, 0.35, 0.22, 0.41, 0.19]),
    ])
}

#[test]
fn stronger_keyword_match_wins_revenue() {
    let mapping = map_columns(&revenue_table(), None, &RoleLexicon::default());
    let revenue = mapping.assignments.get(&SemanticRole::Revenue).expect("revenue assigned");
    assert_eq!(revenue.column, "Recurring_Revenue");
    assert_eq!(revenue.tier, MappingTier::KeywordMatch);
}

#[test]
fn margin_maps_to_gross_margin() {
    let mapping = map_columns(&revenue_table(), None, &RoleLexicon::default());
    let margin = mapping.assignments.get(&SemanticRole::Margin).expect("margin assigned");
    assert_eq!(margin.column, "GrossMargin");
}

#[test]
fn identifiers_never_fill_measure_roles() {
    let mapping = map_columns(&revenue_table(), None, &RoleLexicon::default());
    for role in [SemanticRole::Revenue, SemanticRole::Cost, SemanticRole::Quantity] {
        if let Some(assignment) = mapping.assignments.get(&role) {
            assert_ne!(assignment.column, "CustomerID");
            assert_ne!(assignment.column, "ZipCode");
        }
    }
    let id = mapping.assignments.get(&SemanticRole::Id).expect("id assigned");
    assert_eq!(id.column, "CustomerID");
}

#[test]
fn existing_override_takes_absolute_precedence() {
    let mut overrides = BTreeMap::new();
    overrides.insert(SemanticRole::Revenue, "Revenue".to_string());
    let mapping = map_columns(&revenue_table(), Some(&overrides), &RoleLexicon::default());
    let revenue = mapping.assignments.get(&SemanticRole::Revenue).expect("revenue assigned");
    assert_eq!(revenue.column, "Revenue");
    assert_eq!(revenue.tier, MappingTier::Override);
    assert!(mapping.overrides_ignored.is_empty());
}

#[test]
fn missing_override_column_falls_back_to_inference() {
    let mut overrides = BTreeMap::new();
    overrides.insert(SemanticRole::Revenue, "Total_Revenue".to_string());
    let mapping = map_columns(&revenue_table(), Some(&overrides), &RoleLexicon::default());

    let revenue = mapping.assignments.get(&SemanticRole::Revenue).expect("revenue assigned");
    assert_eq!(revenue.column, "Recurring_Revenue");
    assert_ne!(revenue.tier, MappingTier::Override);

    assert_eq!(mapping.overrides_ignored.len(), 1);
    assert_eq!(mapping.overrides_ignored[0].column, "Total_Revenue");
    assert_eq!(mapping.overrides_ignored[0].role, SemanticRole::Revenue);
}

#[test]
fn rate_signature_decides_margin_ties() {
    // Both names score identically for margin; only one carries rate-range
    // values, and small magnitudes are never penalized.
    let table = DataTable::new(vec![
        numeric("gross_profit", &[1200.0, 800.0, 1500.0, 600.0]),
        numeric("profit_margin", &[0.32, 0.18, 0.44, 0.12]),
    ]);
    let mapping = map_columns(&table, None, &RoleLexicon::default());
    let margin = mapping.assignments.get(&SemanticRole::Margin).expect("margin assigned");
    assert_eq!(margin.column, "profit_margin");
    assert_eq!(margin.tier, MappingTier::RateSignature);
}

#[test]
fn vitality_breaks_remaining_ties() {
    // Both columns match "cost" equally; the livelier one wins.
    let table = DataTable::new(vec![
        numeric("cost_flat", &[100.0, 101.0, 100.0, 99.0]),
        numeric("cost_alive", &[20.0, 180.0, 60.0, 240.0]),
    ]);
    let mapping = map_columns(&table, None, &RoleLexicon::default());
    let cost = mapping.assignments.get(&SemanticRole::Cost).expect("cost assigned");
    assert_eq!(cost.column, "cost_alive");
    assert_eq!(cost.tier, MappingTier::StatisticalVitality);
}

#[test]
fn all_null_columns_are_never_assigned() {
    let table = DataTable::new(vec![
        Column::new(
            "revenue",
            ColumnType::Numeric,
            vec![CellValue::Null, CellValue::Null, CellValue::Null],
        ),
        numeric("sales_total", &[10.0, 20.0, 30.0]),
    ]);
    let mapping = map_columns(&table, None, &RoleLexicon::default());
    let revenue = mapping.assignments.get(&SemanticRole::Revenue).expect("revenue assigned");
    assert_eq!(revenue.column, "sales_total");
}

#[test]
fn unfillable_roles_are_listed_unassigned() {
    let table = DataTable::new(vec![numeric("revenue", &[1.0, 2.0, 3.0])]);
    let mapping = map_columns(&table, None, &RoleLexicon::default());
    assert!(mapping.unassigned_roles.contains(&SemanticRole::Date));
    assert!(mapping.unassigned_roles.contains(&SemanticRole::Geo));
}

#[test]
fn mapping_is_deterministic() {
    let first = map_columns(&revenue_table(), None, &RoleLexicon::default());
    let second = map_columns(&revenue_table(), None, &RoleLexicon::default());
    assert_eq!(first, second);
}
