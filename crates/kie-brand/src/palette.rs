// crates/kie-brand/src/palette.rs
// ============================================================================
// Module: KDS Palette
// Description: The closed ten-color sequence and theme colors.
// Purpose: Make palette membership checkable and series assignment cyclic.
// Dependencies: none
// ============================================================================

//! ## Overview
//! All data visualization draws from the closed KDS sequence: a purple ramp
//! followed by a neutral ramp, ten hex colors total. No other color may
//! appear in a series. Theme backgrounds and text colors are separate,
//! equally closed sets. Membership checks normalize case and accept an
//! optional leading `#`.

// ============================================================================
// SECTION: Palette
// ============================================================================

/// The closed KDS data-visualization sequence.
///
/// # Invariants
/// - Exactly ten colors; ordering is the series assignment order.
/// - Entries are uppercase hex with a leading `#`.
pub const KDS_PALETTE: [&str; 10] = [
    "#7823DC", "#9150E6", "#AA78EB", "#C3A0F0", "#DCC8F5", "#464646", "#6E6E6E", "#969696",
    "#BEBEBE", "#E6E6E6",
];

/// Background colors per theme.
///
/// # Invariants
/// - Index 0 is dark, index 1 is light.
pub const THEME_BACKGROUNDS: [&str; 2] = ["#1E1E1E", "#FFFFFF"];

/// Text colors per theme.
///
/// # Invariants
/// - Index 0 is for dark backgrounds, index 1 for light backgrounds.
pub const THEME_TEXT_COLORS: [&str; 2] = ["#FFFFFF", "#1E1E1E"];

/// The mandated chart typeface family.
pub const FONT_FAMILY: &str = "Inter, sans-serif";

// ============================================================================
// SECTION: Membership
// ============================================================================

/// Normalizes a hex color for comparison (uppercase, leading `#`).
#[must_use]
pub fn normalize_hex(color: &str) -> String {
    let trimmed = color.trim();
    let stripped = trimmed.strip_prefix('#').unwrap_or(trimmed);
    format!("#{}", stripped.to_ascii_uppercase())
}

/// Returns true when the color belongs to the KDS sequence.
#[must_use]
pub fn is_palette_color(color: &str) -> bool {
    let normalized = normalize_hex(color);
    KDS_PALETTE.iter().any(|entry| *entry == normalized)
}

/// Returns true when the color is a sanctioned theme background.
#[must_use]
pub fn is_theme_background(color: &str) -> bool {
    let normalized = normalize_hex(color);
    THEME_BACKGROUNDS.iter().any(|entry| *entry == normalized)
}

/// Returns true when the color is a sanctioned text color.
#[must_use]
pub fn is_theme_text_color(color: &str) -> bool {
    let normalized = normalize_hex(color);
    THEME_TEXT_COLORS.iter().any(|entry| *entry == normalized)
}

/// Returns the first `count` series colors, cycling the sequence.
#[must_use]
pub fn series_colors(count: usize) -> Vec<String> {
    (0..count)
        .map(|index| KDS_PALETTE[index % KDS_PALETTE.len()].to_string())
        .collect()
}

// ============================================================================
// SECTION: Contrast
// ============================================================================

/// Parses a hex color into RGB components.
#[must_use]
pub fn parse_hex(color: &str) -> Option<(u8, u8, u8)> {
    let normalized = normalize_hex(color);
    let hex = normalized.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let red = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let green = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let blue = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((red, green, blue))
}

/// Linearizes one sRGB channel for luminance computation.
fn linearize(channel: u8) -> f64 {
    let scaled = f64::from(channel) / 255.0;
    if scaled <= 0.040_45 {
        scaled / 12.92
    } else {
        ((scaled + 0.055) / 1.055).powf(2.4)
    }
}

/// WCAG relative luminance of a color.
#[must_use]
pub fn relative_luminance(color: &str) -> Option<f64> {
    let (red, green, blue) = parse_hex(color)?;
    Some(0.2126 * linearize(red) + 0.7152 * linearize(green) + 0.0722 * linearize(blue))
}

/// WCAG contrast ratio between two colors (>= 1.0).
#[must_use]
pub fn contrast_ratio(foreground: &str, background: &str) -> Option<f64> {
    let fore = relative_luminance(foreground)?;
    let back = relative_luminance(background)?;
    let (lighter, darker) = if fore > back { (fore, back) } else { (back, fore) };
    Some((lighter + 0.05) / (darker + 0.05))
}
