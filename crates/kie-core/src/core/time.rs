// crates/kie-core/src/core/time.rs
// ============================================================================
// Module: KIE Time Model
// Description: Canonical timestamp representations for evidence and rails records.
// Purpose: Provide deterministic, replayable time values across engine records.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The engine embeds explicit time values in evidence and rails records to
//! keep replay deterministic. Core code never reads wall-clock time directly;
//! the dispatcher supplies timestamps through the
//! [`Clock`](crate::interfaces::Clock) interface.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Time Values
// ============================================================================

/// Canonical timestamp used in engine records.
///
/// # Invariants
/// - Values are explicitly provided by callers; core code never reads wall-clock time.
/// - No validation is performed; monotonicity is a caller responsibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Timestamp {
    /// Unix epoch milliseconds.
    UnixMillis(i64),
    /// Monotonic logical time value, used by deterministic tests.
    Logical(u64),
}

impl Timestamp {
    /// Returns the timestamp as unix milliseconds when available.
    #[must_use]
    pub const fn as_unix_millis(&self) -> Option<i64> {
        match self {
            Self::UnixMillis(value) => Some(*value),
            Self::Logical(_) => None,
        }
    }

    /// Returns the timestamp as logical time when available.
    #[must_use]
    pub const fn as_logical(&self) -> Option<u64> {
        match self {
            Self::UnixMillis(_) => None,
            Self::Logical(value) => Some(*value),
        }
    }
}
