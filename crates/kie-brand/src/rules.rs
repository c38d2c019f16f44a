// crates/kie-brand/src/rules.rs
// ============================================================================
// Module: Brand Validation Rules
// Description: Closed set of pure rule functions over charts and data rows.
// Purpose: Detect brand, accessibility, data-integrity, and content violations.
// Dependencies: crate::{chart, palette}, serde, serde_json
// ============================================================================

//! ## Overview
//! Each rule is a pure function from an artifact to findings. Severity
//! determines the outcome downstream: CRITICAL findings fail the report,
//! WARN findings block only in strict mode, INFO findings never block.
//! Rules never mutate their input and never read the filesystem.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::chart::ChartConfig;
use crate::chart::ChartType;
use crate::palette::contrast_ratio;
use crate::palette::is_palette_color;
use crate::palette::is_theme_background;
use crate::palette::is_theme_text_color;

// ============================================================================
// SECTION: Findings
// ============================================================================

/// Finding severity, ordered least to most severe.
///
/// # Invariants
/// - `Ord` reflects severity: `Info < Warn < Critical`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Advisory readability note.
    Info,
    /// Quality concern; blocks only in strict mode.
    Warn,
    /// Brand, accessibility, or integrity violation; always blocks.
    Critical,
}

impl Severity {
    /// Returns the canonical wire form of the severity.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single rule finding.
///
/// # Invariants
/// - `rule` is a stable identifier; `location` names the artifact checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Stable rule identifier.
    pub rule: String,
    /// Severity of the violation.
    pub severity: Severity,
    /// Human-readable explanation.
    pub message: String,
    /// Artifact (and element) the finding points at.
    pub location: String,
    /// Suggested fix, when one exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_fix: Option<String>,
}

impl Finding {
    /// Creates a finding.
    #[must_use]
    pub fn new(
        rule: &str,
        severity: Severity,
        message: impl Into<String>,
        location: &str,
        suggested_fix: Option<String>,
    ) -> Self {
        Self {
            rule: rule.to_string(),
            severity,
            message: message.into(),
            location: location.to_string(),
            suggested_fix,
        }
    }
}

// ============================================================================
// SECTION: Chart Rules
// ============================================================================

/// Minimum WCAG contrast for chart text at 12 pt and above.
const MIN_CONTRAST: f64 = 4.5;

/// Pie segment bounds.
const PIE_SEGMENTS: std::ops::RangeInclusive<usize> = 2..=4;

/// Regenerate guidance attached to engine-produced artifacts.
const REGENERATE_FIX: &str = "regenerate via `kie build` — configs are engine-produced";

/// Every color in the configuration must come from the KDS palette.
#[must_use]
pub fn check_palette(chart: &ChartConfig, location: &str) -> Vec<Finding> {
    let mut findings = Vec::new();
    for color in &chart.config.colors {
        if !is_palette_color(color) {
            findings.push(Finding::new(
                "brand.palette",
                Severity::Critical,
                format!("series color {color} is not in the KDS palette"),
                location,
                Some(REGENERATE_FIX.to_string()),
            ));
        }
    }
    if !is_theme_background(&chart.config.background) {
        findings.push(Finding::new(
            "brand.palette",
            Severity::Critical,
            format!("background {} is not a sanctioned theme color", chart.config.background),
            location,
            Some(REGENERATE_FIX.to_string()),
        ));
    }
    for (axis, tick_fill) in [
        ("xAxis", &chart.config.x_axis.tick.fill),
        ("yAxis", &chart.config.y_axis.tick.fill),
    ] {
        if !is_theme_text_color(tick_fill) {
            findings.push(Finding::new(
                "brand.palette",
                Severity::Critical,
                format!("{axis} tick color {tick_fill} is not a sanctioned text color"),
                location,
                Some(REGENERATE_FIX.to_string()),
            ));
        }
    }
    findings
}

/// Gridlines are forbidden; axes never draw lines or ticks.
#[must_use]
pub fn check_gridlines(chart: &ChartConfig, location: &str) -> Vec<Finding> {
    let mut findings = Vec::new();
    if chart.config.grid_lines {
        findings.push(Finding::new(
            "brand.gridlines",
            Severity::Critical,
            "gridLines must be false",
            location,
            Some(REGENERATE_FIX.to_string()),
        ));
    }
    for (axis, options) in [("xAxis", &chart.config.x_axis), ("yAxis", &chart.config.y_axis)] {
        if options.axis_line {
            findings.push(Finding::new(
                "brand.gridlines",
                Severity::Critical,
                format!("{axis}.axisLine must be false"),
                location,
                Some(REGENERATE_FIX.to_string()),
            ));
        }
        if options.tick_line {
            findings.push(Finding::new(
                "brand.gridlines",
                Severity::Critical,
                format!("{axis}.tickLine must be false"),
                location,
                Some(REGENERATE_FIX.to_string()),
            ));
        }
    }
    findings
}

/// The typeface family must carry Inter.
#[must_use]
pub fn check_typography(chart: &ChartConfig, location: &str) -> Vec<Finding> {
    if chart.config.font_family.contains("Inter") {
        return Vec::new();
    }
    vec![Finding::new(
        "brand.typography",
        Severity::Critical,
        format!("fontFamily {:?} does not contain \"Inter\"", chart.config.font_family),
        location,
        Some(REGENERATE_FIX.to_string()),
    )]
}

/// Pie charts carry two to four segments.
#[must_use]
pub fn check_pie_segments(chart: &ChartConfig, location: &str) -> Vec<Finding> {
    if chart.chart_type != ChartType::Pie || PIE_SEGMENTS.contains(&chart.data.len()) {
        return Vec::new();
    }
    vec![Finding::new(
        "brand.pie_segments",
        Severity::Critical,
        format!("pie chart has {} segments; 2 to 4 are permitted", chart.data.len()),
        location,
        Some("rerun `kie analyze` so the planner selects a stacked bar".to_string()),
    )]
}

/// Text against background must meet WCAG 4.5:1.
#[must_use]
pub fn check_contrast(chart: &ChartConfig, location: &str) -> Vec<Finding> {
    let Some(ratio) = contrast_ratio(&chart.config.text_color, &chart.config.background) else {
        return vec![Finding::new(
            "accessibility.contrast",
            Severity::Critical,
            "text or background color is unparsable",
            location,
            Some(REGENERATE_FIX.to_string()),
        )];
    };
    if ratio >= MIN_CONTRAST {
        return Vec::new();
    }
    vec![Finding::new(
        "accessibility.contrast",
        Severity::Critical,
        format!("text contrast {ratio:.2}:1 is below the 4.5:1 floor"),
        location,
        Some(REGENERATE_FIX.to_string()),
    )]
}

// ============================================================================
// SECTION: Synthetic Data Rules
// ============================================================================

/// Name fragments that mark an entity value as synthetic.
const SYNTHETIC_NAME_FRAGMENTS: [&str; 8] =
    ["test", "acme", "sample", "demo", "dummy", "example", "lorem", "placeholder"];

/// Detects fabricated-looking data: placeholder names, sequential
/// identifiers, and impossibly round numeric runs.
#[must_use]
pub fn check_synthetic_rows(rows: &[Map<String, Value>], location: &str) -> Vec<Finding> {
    let mut findings = Vec::new();
    findings.extend(synthetic_names(rows, location));
    findings.extend(synthetic_numeric_runs(rows, location));
    findings
}

/// Placeholder entity names ("test", "... Corp", "Acme", …).
fn synthetic_names(rows: &[Map<String, Value>], location: &str) -> Vec<Finding> {
    let mut findings = Vec::new();
    for (index, row) in rows.iter().enumerate() {
        for (key, value) in row {
            let Value::String(text) = value else {
                continue;
            };
            let lowered = text.to_ascii_lowercase();
            let fragment_hit = SYNTHETIC_NAME_FRAGMENTS
                .iter()
                .any(|fragment| lowered.contains(fragment));
            let corp_hit = lowered.ends_with(" corp") || lowered == "corp";
            if fragment_hit || corp_hit {
                findings.push(Finding::new(
                    "integrity.synthetic_data",
                    Severity::Critical,
                    format!("synthetic data suspected: {key}={text:?} in row {index}"),
                    location,
                    Some("replace the dataset with real client data".to_string()),
                ));
            }
        }
    }
    findings
}

/// Arithmetic progressions of round numbers across three or more rows.
fn synthetic_numeric_runs(rows: &[Map<String, Value>], location: &str) -> Vec<Finding> {
    let mut findings = Vec::new();
    let Some(first) = rows.first() else {
        return findings;
    };
    for key in first.keys() {
        let values: Vec<f64> = rows
            .iter()
            .filter_map(|row| row.get(key))
            .filter_map(Value::as_f64)
            .collect();
        if values.len() < 3 || values.len() != rows.len() {
            continue;
        }
        let all_round = values
            .iter()
            .all(|value| value.abs() >= 100.0 && (value % 100.0).abs() < f64::EPSILON);
        if !all_round {
            continue;
        }
        let step = values[1] - values[0];
        if step.abs() < f64::EPSILON {
            continue;
        }
        let progression = values
            .windows(2)
            .all(|pair| ((pair[1] - pair[0]) - step).abs() < f64::EPSILON);
        if progression {
            findings.push(Finding::new(
                "integrity.synthetic_data",
                Severity::Critical,
                format!(
                    "synthetic data suspected: {key} is an arithmetic run of round numbers"
                ),
                location,
                Some("replace the dataset with real client data".to_string()),
            ));
        }
    }
    findings
}

// ============================================================================
// SECTION: Data Quality Rules
// ============================================================================

/// Placeholder strings that mark a cell as unfilled.
const PLACEHOLDER_CELLS: [&str; 6] = ["n/a", "tbd", "todo", "xxx", "null", "nan"];

/// Null-heavy, constant, and placeholder-ridden columns.
#[must_use]
pub fn check_data_quality_rows(rows: &[Map<String, Value>], location: &str) -> Vec<Finding> {
    let mut findings = Vec::new();
    let Some(first) = rows.first() else {
        return findings;
    };
    for key in first.keys() {
        let mut nulls = 0_usize;
        let mut placeholders = 0_usize;
        let mut distinct: Vec<String> = Vec::new();
        for row in rows {
            match row.get(key) {
                None | Some(Value::Null) => nulls += 1,
                Some(Value::String(text)) => {
                    if PLACEHOLDER_CELLS.contains(&text.to_ascii_lowercase().as_str()) {
                        placeholders += 1;
                    }
                    push_distinct(&mut distinct, text.clone());
                }
                Some(other) => push_distinct(&mut distinct, other.to_string()),
            }
        }
        if nulls * 2 > rows.len() {
            findings.push(Finding::new(
                "quality.nulls",
                Severity::Warn,
                format!("{key} is more than 50% null"),
                location,
                Some("review the upstream extract for missing values".to_string()),
            ));
        }
        if placeholders > 0 {
            findings.push(Finding::new(
                "quality.placeholders",
                Severity::Warn,
                format!("{key} holds {placeholders} placeholder cell(s)"),
                location,
                Some("fill or drop placeholder cells".to_string()),
            ));
        }
        if distinct.len() == 1 && rows.len() > 1 {
            findings.push(Finding::new(
                "quality.constant",
                Severity::Warn,
                format!("{key} is constant across all rows"),
                location,
                None,
            ));
        }
    }
    findings
}

/// Tracks up to two distinct renderings (enough to detect constants).
fn push_distinct(distinct: &mut Vec<String>, value: String) {
    if distinct.len() < 2 && !distinct.contains(&value) {
        distinct.push(value);
    }
}

// ============================================================================
// SECTION: Content Rules
// ============================================================================

/// Placeholder fragments forbidden in titles.
const CONTENT_PLACEHOLDERS: [&str; 5] = ["lorem ipsum", "tbd", "todo", "xxx", "placeholder"];

/// Words a client-facing deliverable must not carry.
const BLOCKED_WORDS: [&str; 3] = ["damn", "hell", "crap"];

/// Maximum words per sentence in titles and subtitles.
const MAX_SENTENCE_WORDS: usize = 40;

/// Placeholder strings, profanity, and run-on sentences in chart text.
#[must_use]
pub fn check_content(chart: &ChartConfig, location: &str) -> Vec<Finding> {
    let mut findings = Vec::new();
    for (field, text) in [
        ("title", chart.title.as_deref()),
        ("subtitle", chart.subtitle.as_deref()),
    ] {
        let Some(text) = text else {
            continue;
        };
        let lowered = text.to_ascii_lowercase();
        for placeholder in CONTENT_PLACEHOLDERS {
            if lowered.contains(placeholder) {
                findings.push(Finding::new(
                    "content.placeholder",
                    Severity::Warn,
                    format!("{field} carries the placeholder {placeholder:?}"),
                    location,
                    Some("write a concrete title before delivery".to_string()),
                ));
            }
        }
        for word in BLOCKED_WORDS {
            if lowered.split_whitespace().any(|token| token == word) {
                findings.push(Finding::new(
                    "content.language",
                    Severity::Warn,
                    format!("{field} carries blocked language"),
                    location,
                    None,
                ));
            }
        }
        for sentence in text.split(['.', '!', '?']) {
            if sentence.split_whitespace().count() > MAX_SENTENCE_WORDS {
                findings.push(Finding::new(
                    "content.sentence_length",
                    Severity::Warn,
                    format!("{field} carries a sentence over {MAX_SENTENCE_WORDS} words"),
                    location,
                    Some("split the sentence".to_string()),
                ));
            }
        }
    }
    findings
}

// ============================================================================
// SECTION: Readability Rules
// ============================================================================

/// Label length beyond which readability suffers.
const MAX_LABEL_CHARS: usize = 30;

/// Long labels and missing axis titles.
#[must_use]
pub fn check_readability(chart: &ChartConfig, location: &str) -> Vec<Finding> {
    let mut findings = Vec::new();
    if chart.chart_type != ChartType::Pie {
        if chart.config.x_axis.title.is_none() {
            findings.push(Finding::new(
                "readability.axis_titles",
                Severity::Info,
                "x axis has no title",
                location,
                None,
            ));
        }
        if chart.config.y_axis.title.is_none() {
            findings.push(Finding::new(
                "readability.axis_titles",
                Severity::Info,
                "y axis has no title",
                location,
                None,
            ));
        }
    }
    for row in &chart.data {
        for value in row.values() {
            if let Value::String(text) = value
                && text.chars().count() > MAX_LABEL_CHARS
            {
                findings.push(Finding::new(
                    "readability.labels",
                    Severity::Info,
                    format!("label {:?}… exceeds {MAX_LABEL_CHARS} characters", truncate(text)),
                    location,
                    Some("shorten the label upstream".to_string()),
                ));
            }
        }
    }
    findings
}

/// Truncates a label for display inside a finding.
fn truncate(text: &str) -> String {
    text.chars().take(16).collect()
}
