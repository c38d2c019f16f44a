// crates/kie-cli/src/lib.rs
// ============================================================================
// Module: KIE CLI Library
// Description: Shared CLI facilities (message catalog).
// Purpose: Host the i18n catalog and `t!` macro used by the binary.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Library half of the CLI crate: the message catalog and the [`t!`](crate::t)
//! macro. The binary in `main.rs` routes every user-facing string through it.

/// Message catalog and translation utilities.
pub mod i18n;
