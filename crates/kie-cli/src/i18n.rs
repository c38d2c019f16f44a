// crates/kie-cli/src/i18n.rs
// ============================================================================
// Module: CLI Internationalization Helpers
// Description: Provides message catalog and translation utilities for the CLI.
// Purpose: Centralize user-facing strings for future localization support.
// Dependencies: Standard library collections and formatting utilities.
// ============================================================================

//! ## Overview
//! The KIE CLI stores user-facing strings in a small translation catalog to
//! enforce consistent messaging and to prepare for future locales. All
//! runtime output should be routed through the [`t!`](crate::t) macro.
//!
//! ## Invariants
//! - The catalog is initialized once and read-only thereafter.
//! - Missing keys fall back to the key itself.
//! - Placeholder substitutions preserve deterministic order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// SECTION: Types
// ============================================================================

/// A formatted message argument captured by the [`macro@crate::t`] macro.
///
/// # Invariants
/// - `key` matches a placeholder name without braces (for example, `path`).
/// - `value` is preformatted and should be safe for display.
#[derive(Clone)]
pub struct MessageArg {
    /// The placeholder name used in message templates (e.g., `"path"`).
    pub key: &'static str,
    /// The formatted string value to substitute for this placeholder.
    pub value: String,
}

impl MessageArg {
    /// Constructs a new [`MessageArg`] from a key and displayable value.
    pub fn new(key: &'static str, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Static English catalog entries loaded into the message bundle.
const CATALOG_EN: &[(&str, &str)] = &[
    ("main.version", "kie {version}"),
    ("outcome.blocked", "BLOCKED: {summary}"),
    ("outcome.failed", "FAILED: {summary}"),
    ("outcome.ok", "OK: {summary}"),
    ("outcome.ok_warn", "OK (with warnings): {summary}"),
    ("outcome.warning", "  warning: {message}"),
    ("outcome.block", "  block: {message}"),
    ("outcome.recovery", "Recovery plan: {path}"),
    ("outcome.run", "Evidence: project_state/evidence_ledger/{run_id}.yaml"),
    ("output.write_failed", "Failed to write to {stream}: {error}"),
    ("status.json_missing", "No trust bundle yet; run a command first."),
];

/// Global message bundle.
static BUNDLE: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();

/// Returns the message bundle, initializing it on first use.
fn bundle() -> &'static HashMap<&'static str, &'static str> {
    BUNDLE.get_or_init(|| CATALOG_EN.iter().copied().collect())
}

/// Formats a catalog message, substituting named placeholders.
#[must_use]
pub fn translate(key: &str, args: Vec<MessageArg>) -> String {
    let template = bundle().get(key).copied().unwrap_or(key);
    if args.is_empty() {
        return template.to_string();
    }
    let mut result = template.to_string();
    for arg in args {
        let placeholder = format!("{{{}}}", arg.key);
        result = result.replace(&placeholder, &arg.value);
    }
    result
}

// ============================================================================
// SECTION: Macro
// ============================================================================

/// Formats a localized message from a key and named arguments.
///
/// # Arguments
///
/// - `$key` must match a catalog entry.
/// - Named arguments are substituted into `{placeholder}` positions.
///
/// # Returns
///
/// A localized [`String`] with placeholders substituted.
#[macro_export]
macro_rules! t {
    ($key:literal $(, $name:ident = $value:expr )* $(,)?) => {{
        let args = ::std::vec![
            $(
                $crate::i18n::MessageArg::new(stringify!($name), $value.to_string()),
            )*
        ];
        $crate::i18n::translate($key, args)
    }};
}
