// crates/kie-brand/tests/validator.rs
// ============================================================================
// Module: Brand Validator Tests
// Description: Validate the rule classes, severities, and blocking modes.
// ============================================================================
//! ## Overview
//! Ensures a compliant chart certifies, each rule class fires on its
//! violation (gridlines, palette, typography, pie ceiling, contrast,
//! synthetic data), and that lenient mode lets warnings through while
//! strict mode blocks them.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use kie_brand::ChartConfig;
use kie_brand::ChartOptions;
use kie_brand::ChartType;
use kie_brand::Severity;
use kie_brand::ValidationMode;
use kie_brand::ValidationReport;
use kie_brand::is_palette_color;
use kie_brand::series_colors;
use kie_brand::validate_all;
use kie_brand::validate_chart;
use kie_core::Theme;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;

/// Builds a data row from key-value pairs.
fn row(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(key, value)| ((*key).to_string(), value.clone()))
        .collect()
}

/// A compliant bar chart over two regions.
fn compliant_chart() -> ChartConfig {
    ChartConfig {
        chart_type: ChartType::Bar,
        data: vec![
            row(&[("region", json!("North")), ("revenue", json!(1234.5))]),
            row(&[("region", json!("South")), ("revenue", json!(987.25))]),
        ],
        config: ChartOptions::compliant(Theme::Dark, series_colors(1)),
        title: Some("Revenue by Region".to_string()),
        subtitle: None,
    }
}

/// Runs the chart rule set in the given mode.
fn validate_one(chart: &ChartConfig, mode: ValidationMode) -> ValidationReport {
    let mut report = ValidationReport::new(mode);
    validate_chart(&mut report, chart, "outputs/charts/chart-01.json");
    report
}

#[test]
fn compliant_charts_certify_in_strict_mode() {
    let report = validate_one(&compliant_chart(), ValidationMode::Strict);
    assert!(!report.is_blocking(), "blocking: {:?}", report.blocking_messages());
    assert!(report.worst_severity() < Some(Severity::Warn));
}

#[test]
fn tampered_gridlines_are_critical() {
    let mut chart = compliant_chart();
    chart.config.grid_lines = true;
    let report = validate_one(&chart, ValidationMode::Lenient);
    assert!(report.is_blocking());
    let messages = report.blocking_messages();
    assert!(messages.iter().any(|message| message.contains("gridLines")));
    let fix = report
        .findings()
        .find(|finding| finding.rule == "brand.gridlines")
        .and_then(|finding| finding.suggested_fix.clone())
        .expect("suggested fix");
    assert!(fix.contains("kie build"));
}

#[test]
fn axis_lines_and_tick_lines_are_critical() {
    let mut chart = compliant_chart();
    chart.config.x_axis.axis_line = true;
    chart.config.y_axis.tick_line = true;
    let report = validate_one(&chart, ValidationMode::Lenient);
    assert_eq!(
        report
            .findings()
            .filter(|finding| finding.severity == Severity::Critical)
            .count(),
        2
    );
}

#[test]
fn off_palette_colors_are_critical() {
    let mut chart = compliant_chart();
    chart.config.colors = vec!["#FF0000".to_string()];
    let report = validate_one(&chart, ValidationMode::Lenient);
    assert!(report.is_blocking());
    assert!(!is_palette_color("#FF0000"));
}

#[test]
fn palette_membership_normalizes_case() {
    assert!(is_palette_color("#7823DC"));
    assert!(is_palette_color("7823dc"));
    assert!(is_palette_color(" #7823dc "));
    assert!(!is_palette_color("#7823DD"));
}

#[test]
fn missing_inter_typeface_is_critical() {
    let mut chart = compliant_chart();
    chart.config.font_family = "Comic Sans MS".to_string();
    let report = validate_one(&chart, ValidationMode::Lenient);
    assert!(report.is_blocking());
}

#[test]
fn pie_charts_carry_two_to_four_segments() {
    let mut chart = compliant_chart();
    chart.chart_type = ChartType::Pie;
    chart.data = (0..6)
        .map(|index| row(&[("part", json!(format!("P{index}"))), ("value", json!(10))]))
        .collect();
    let report = validate_one(&chart, ValidationMode::Lenient);
    assert!(report.is_blocking());

    chart.data.truncate(3);
    let report = validate_one(&chart, ValidationMode::Lenient);
    assert!(!report.is_blocking());
}

#[test]
fn low_contrast_text_is_critical() {
    let mut chart = compliant_chart();
    chart.config.text_color = "#2A2A2A".to_string();
    let report = validate_one(&chart, ValidationMode::Lenient);
    assert!(report.is_blocking());
}

#[test]
fn synthetic_sequential_round_numbers_are_critical() {
    let rows = vec![
        row(&[("Client", json!("Test Corp")), ("Revenue", json!(1_000_000))]),
        row(&[("Client", json!("Test Corp")), ("Revenue", json!(2_000_000))]),
        row(&[("Client", json!("Test Corp")), ("Revenue", json!(3_000_000))]),
    ];
    let report = validate_all(ValidationMode::Lenient, &[], Some(("data/demo.csv", &rows)));
    assert!(report.is_blocking());
    let messages = report.blocking_messages();
    assert!(messages.iter().any(|message| message.contains("synthetic data suspected")));
}

#[test]
fn real_looking_data_passes_the_synthetic_screen() {
    let rows = vec![
        row(&[("Client", json!("Northwind Traders")), ("Revenue", json!(1_284_311.42))]),
        row(&[("Client", json!("Fabrikam Industries")), ("Revenue", json!(2_017_554.10))]),
        row(&[("Client", json!("Contoso Partners")), ("Revenue", json!(1_655_902.77))]),
    ];
    let report = validate_all(ValidationMode::Lenient, &[], Some(("data/real.csv", &rows)));
    assert!(!report.is_blocking(), "blocking: {:?}", report.blocking_messages());
}

#[test]
fn strict_mode_blocks_warnings_lenient_passes_them() {
    let mut chart = compliant_chart();
    chart.title = Some("TODO better title".to_string());

    let strict = validate_one(&chart, ValidationMode::Strict);
    assert!(strict.is_blocking());

    let lenient = validate_one(&chart, ValidationMode::Lenient);
    assert!(!lenient.is_blocking());
    assert!(
        lenient
            .advisory_messages()
            .iter()
            .any(|message| message.contains("content.placeholder"))
    );
}

#[test]
fn every_check_is_reported_passed_or_not() {
    let report = validate_one(&compliant_chart(), ValidationMode::Strict);
    assert!(report.checks.len() >= 8);
    assert!(report.checks.iter().all(|check| check.passed == check.findings.is_empty()));
}
