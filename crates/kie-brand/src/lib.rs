// crates/kie-brand/src/lib.rs
// ============================================================================
// Module: KIE Brand Library
// Description: KDS palette, chart wire format, and the brand validator.
// Purpose: Refuse to certify outputs that violate brand, accessibility, or
// data-integrity rules.
// Dependencies: kie-core, serde, serde_json, thiserror, tracing
// ============================================================================

//! ## Overview
//! `kie-brand` owns the closed KDS color sequence, the chart-configuration
//! wire format, and the rule engine that validates produced charts and data.
//! Rules are pure functions; severity determines blocking. Strict mode (the
//! delivery default) blocks on warnings too; lenient mode blocks only on
//! critical findings.

/// Chart configuration wire format.
pub mod chart;
/// KDS palette, theme colors, and contrast math.
pub mod palette;
/// Validation report and blocking semantics.
pub mod report;
/// The closed validation rule set.
pub mod rules;

pub use chart::AxisOptions;
pub use chart::ChartConfig;
pub use chart::ChartOptions;
pub use chart::ChartType;
pub use chart::Formatter;
pub use chart::FormatterKind;
pub use chart::LegendOptions;
pub use chart::TickStyle;
pub use chart::TooltipOptions;
pub use palette::FONT_FAMILY;
pub use palette::KDS_PALETTE;
pub use palette::THEME_BACKGROUNDS;
pub use palette::THEME_TEXT_COLORS;
pub use palette::contrast_ratio;
pub use palette::is_palette_color;
pub use palette::series_colors;
pub use report::CheckOutcome;
pub use report::ValidationMode;
pub use report::ValidationReport;
pub use report::validate_all;
pub use report::validate_chart;
pub use report::validate_rows;
pub use rules::Finding;
pub use rules::Severity;
