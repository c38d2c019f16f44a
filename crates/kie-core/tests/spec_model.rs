// crates/kie-core/tests/spec_model.rs
// ============================================================================
// Module: Project Spec Tests
// Description: Validate spec mutation, completeness, and YAML round-trips.
// ============================================================================
//! ## Overview
//! Ensures `spec --set` semantics: reads return what was set, re-setting the
//! same value is a recorded no-op, theme has no default, and column-mapping
//! keys parse as semantic roles.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use kie_core::ProjectSpec;
use kie_core::ProjectType;
use kie_core::SemanticRole;
use kie_core::SpecError;
use kie_core::Theme;

#[test]
fn set_then_read_returns_the_value() {
    let mut spec = ProjectSpec::init("margin-study");
    let changed = spec.set_value("objective", "grow recurring revenue").expect("set");
    assert!(changed);
    assert_eq!(spec.objective, "grow recurring revenue");
}

#[test]
fn resetting_the_same_value_is_a_no_op() {
    let mut spec = ProjectSpec::init("margin-study");
    spec.set_value("objective", "grow revenue").expect("set");
    let changed = spec.set_value("objective", "grow revenue").expect("set again");
    assert!(!changed);
}

#[test]
fn theme_has_no_default() {
    let spec = ProjectSpec::init("margin-study");
    assert!(spec.theme.is_none());
}

#[test]
fn theme_accepts_only_dark_and_light() {
    let mut spec = ProjectSpec::init("margin-study");
    spec.set_value("theme", "dark").expect("dark");
    assert_eq!(spec.theme, Some(Theme::Dark));
    let err = spec.set_value("theme", "sepia").expect_err("sepia is not a theme");
    assert!(matches!(
        err,
        SpecError::InvalidValue {
            ..
        }
    ));
}

#[test]
fn column_mapping_keys_parse_as_roles() {
    let mut spec = ProjectSpec::init("margin-study");
    spec.set_value("column_mapping.revenue", "Recurring_Revenue").expect("set mapping");
    let mapping = spec.column_mapping.expect("mapping present");
    assert_eq!(
        mapping.get(&SemanticRole::Revenue).map(String::as_str),
        Some("Recurring_Revenue")
    );
}

#[test]
fn unknown_keys_are_rejected() {
    let mut spec = ProjectSpec::init("margin-study");
    assert!(matches!(
        spec.set_value("colour_scheme", "mauve"),
        Err(SpecError::UnknownKey(_))
    ));
    assert!(matches!(
        spec.set_value("column_mapping.profitability", "x"),
        Err(SpecError::UnknownKey(_))
    ));
}

#[test]
fn completeness_requires_name_and_objective() {
    let mut spec = ProjectSpec::default();
    assert_eq!(spec.missing_fields(), vec!["project_name", "objective"]);
    spec.set_value("project_name", "margin-study").expect("name");
    spec.set_value("objective", "grow revenue").expect("objective");
    assert!(spec.is_complete());
}

#[test]
fn yaml_round_trip_preserves_every_field() {
    let mut spec = ProjectSpec::init("margin-study");
    spec.set_value("objective", "grow recurring revenue").expect("objective");
    spec.set_value("client", "Northwind").expect("client");
    spec.set_value("project_type", "dashboard").expect("type");
    spec.set_value("theme", "light").expect("theme");
    spec.set_value("data_sources", "data/sales.csv, data/costs.csv").expect("sources");
    spec.set_value("column_mapping.margin", "GrossMargin").expect("mapping");

    let yaml = spec.to_yaml().expect("serialize");
    let parsed = ProjectSpec::from_yaml(&yaml).expect("parse");
    assert_eq!(parsed, spec);
    assert_eq!(parsed.project_type, ProjectType::Dashboard);
    assert_eq!(parsed.data_sources.len(), 2);
}
