// crates/kie-core/src/runtime/rails_store.rs
// ============================================================================
// Module: Rails State Store
// Description: Atomic JSON persistence for the rails state.
// Purpose: Keep the rails snapshot valid at all times; fail closed on corruption.
// Dependencies: crate::core, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The rails state persists as `project_state/rails_state.json`, written with
//! write-temp-then-rename atomicity. Loads fail closed: a present but
//! unparsable file is invariant corruption, surfaced as a block that
//! recommends `kie spec --repair` rather than silently reinitializing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;

use thiserror::Error;

use crate::core::rails::RailsState;
use crate::core::workspace::WorkspaceError;
use crate::core::workspace::WorkspaceLayout;
use crate::core::workspace::atomic_write;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Rails persistence errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum RailsStoreError {
    /// The state file exists but cannot be parsed; state is corrupt.
    #[error("rails state at {path} is corrupt: {detail}")]
    Corrupt {
        /// Path of the corrupt state file.
        path: String,
        /// Parse failure detail.
        detail: String,
    },
    /// A filesystem operation failed.
    #[error("rails store io error at {path}: {source}")]
    Io {
        /// Path involved in the failed operation.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// Serializing the state failed.
    #[error("failed to serialize rails state: {0}")]
    Serialize(String),
    /// Writing the state file failed.
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// Atomic file store for the rails state.
///
/// # Invariants
/// - Only the dispatcher (through the stage handler) writes through this store.
#[derive(Debug, Clone)]
pub struct RailsStore {
    /// Workspace the state lives in.
    layout: WorkspaceLayout,
}

impl RailsStore {
    /// Creates a store over the given workspace.
    #[must_use]
    pub const fn new(layout: WorkspaceLayout) -> Self {
        Self {
            layout,
        }
    }

    /// Loads the rails state, returning `None` when no state exists yet.
    ///
    /// # Errors
    ///
    /// Returns [`RailsStoreError::Corrupt`] when the file exists but cannot
    /// be parsed, and [`RailsStoreError::Io`] on read failures.
    pub fn load(&self) -> Result<Option<RailsState>, RailsStoreError> {
        let path = self.layout.rails_state_path();
        if !path.is_file() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path).map_err(|err| RailsStoreError::Io {
            path: path.display().to_string(),
            source: err,
        })?;
        let state =
            serde_json::from_str(&contents).map_err(|err| RailsStoreError::Corrupt {
                path: path.display().to_string(),
                detail: err.to_string(),
            })?;
        Ok(Some(state))
    }

    /// Persists the rails state atomically.
    ///
    /// # Errors
    ///
    /// Returns [`RailsStoreError`] when serialization or the atomic write
    /// fails.
    pub fn save(&self, state: &RailsState) -> Result<(), RailsStoreError> {
        let json = serde_json::to_vec_pretty(state)
            .map_err(|err| RailsStoreError::Serialize(err.to_string()))?;
        atomic_write(&self.layout.rails_state_path(), &json)?;
        Ok(())
    }
}
