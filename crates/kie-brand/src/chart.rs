// crates/kie-brand/src/chart.rs
// ============================================================================
// Module: Chart Configuration Wire Format
// Description: Render-ready chart JSON consumed by the front end.
// Purpose: Fix the wire contract: camelCase keys, closed type set, KDS colors.
// Dependencies: kie-core, serde, serde_json
// ============================================================================

//! ## Overview
//! A chart configuration is concrete, render-ready JSON: a closed `type`
//! vocabulary, a `data` array, and a `config` object with camelCase keys
//! (`gridLines`, `axisLine`, `tickLine`, `fontFamily`). `gridLines` is always
//! present and false; axes never draw lines or ticks; every color comes from
//! the KDS palette. The front end is a pure consumer.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use kie_core::Theme;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::palette::FONT_FAMILY;
use crate::palette::THEME_BACKGROUNDS;
use crate::palette::THEME_TEXT_COLORS;

// ============================================================================
// SECTION: Chart Type
// ============================================================================

/// Closed chart-type vocabulary of the wire format.
///
/// # Invariants
/// - Variants are stable for serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartType {
    /// Bar chart (vertical, horizontal, or stacked via config).
    Bar,
    /// Line chart.
    Line,
    /// Area chart.
    Area,
    /// Pie chart.
    Pie,
    /// Scatter plot.
    Scatter,
    /// Combined bar and line.
    Combo,
}

impl ChartType {
    /// Returns the canonical wire form of the type.
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

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Axis and Style Blocks
// ============================================================================

/// Tick label style.
///
/// # Invariants
/// - `fill` is a sanctioned text color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickStyle {
    /// Tick label font size in points.
    #[serde(rename = "fontSize")]
    pub font_size: u32,
    /// Tick label color.
    pub fill: String,
}

/// Axis configuration.
///
/// # Invariants
/// - `axis_line` and `tick_line` are always false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisOptions {
    /// Axis line visibility; always false.
    #[serde(rename = "axisLine")]
    pub axis_line: bool,
    /// Tick line visibility; always false.
    #[serde(rename = "tickLine")]
    pub tick_line: bool,
    /// Tick label style.
    pub tick: TickStyle,
    /// Axis title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl AxisOptions {
    /// Creates a compliant axis for the given text color.
    #[must_use]
    pub fn compliant(text_color: &str, title: Option<String>) -> Self {
        Self {
            axis_line: false,
            tick_line: false,
            tick: TickStyle {
                font_size: 12,
                fill: text_color.to_string(),
            },
            title,
        }
    }
}

/// Legend configuration.
///
/// # Invariants
/// - `position` is one of `top`, `bottom`, `left`, `right`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegendOptions {
    /// Legend visibility.
    pub show: bool,
    /// Legend position.
    pub position: String,
}

/// Tooltip configuration.
///
/// # Invariants
/// - Tooltips carry no custom colors; the front end themes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TooltipOptions {
    /// Tooltip visibility.
    pub show: bool,
}

/// Value formatter attached to an axis or series.
///
/// # Invariants
/// - `kind` selects number, currency, or percentage rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Formatter {
    /// Formatter family.
    #[serde(rename = "type")]
    pub kind: FormatterKind,
    /// Axis the formatter applies to (`x` or `y`).
    pub axis: String,
    /// Decimal places.
    pub decimals: u32,
    /// ISO currency code for currency formatters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

/// Formatter families.
///
/// # Invariants
/// - Variants are stable for serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatterKind {
    /// Plain number with thousands separators.
    Number,
    /// Currency amount.
    Currency,
    /// Percentage (value in `[0, 1]` scaled by 100).
    Percentage,
}

// ============================================================================
// SECTION: Chart Options
// ============================================================================

/// The `config` block of a chart configuration.
///
/// # Invariants
/// - `grid_lines` is always present and false.
/// - `font_family` contains "Inter".
/// - `colors` holds only KDS palette entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartOptions {
    /// Gridline visibility; always false.
    #[serde(rename = "gridLines")]
    pub grid_lines: bool,
    /// Chart typeface family.
    #[serde(rename = "fontFamily")]
    pub font_family: String,
    /// X-axis configuration.
    #[serde(rename = "xAxis")]
    pub x_axis: AxisOptions,
    /// Y-axis configuration.
    #[serde(rename = "yAxis")]
    pub y_axis: AxisOptions,
    /// Series colors, drawn from the KDS palette in order.
    pub colors: Vec<String>,
    /// Legend configuration.
    pub legend: LegendOptions,
    /// Tooltip configuration.
    pub tooltip: TooltipOptions,
    /// Chart background color for the active theme.
    pub background: String,
    /// Text color for the active theme.
    #[serde(rename = "textColor")]
    pub text_color: String,
    /// Stacked series rendering.
    #[serde(default)]
    pub stacked: bool,
    /// Horizontal layout for ranking bars.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
    /// Value formatters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatters: Option<Vec<Formatter>>,
}

impl ChartOptions {
    /// Creates compliant options for a theme.
    #[must_use]
    pub fn compliant(theme: Theme, colors: Vec<String>) -> Self {
        let theme_index = usize::from(theme == Theme::Light);
        let background = THEME_BACKGROUNDS[theme_index].to_string();
        let text_color = THEME_TEXT_COLORS[theme_index].to_string();
        Self {
            grid_lines: false,
            font_family: FONT_FAMILY.to_string(),
            x_axis: AxisOptions::compliant(&text_color, None),
            y_axis: AxisOptions::compliant(&text_color, None),
            colors,
            legend: LegendOptions {
                show: true,
                position: "bottom".to_string(),
            },
            tooltip: TooltipOptions {
                show: true,
            },
            background,
            text_color,
            stacked: false,
            layout: None,
            formatters: None,
        }
    }
}

// ============================================================================
// SECTION: Chart Configuration
// ============================================================================

/// Concrete, render-ready chart configuration.
///
/// # Invariants
/// - Pie charts carry two to four data rows.
/// - One file per planned chart; overwritten by rebuilds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    /// Chart type.
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    /// Data rows feeding the chart.
    pub data: Vec<Map<String, Value>>,
    /// Render configuration.
    pub config: ChartOptions,
    /// Chart title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Chart subtitle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
}
