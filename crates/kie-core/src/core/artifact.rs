// crates/kie-core/src/core/artifact.rs
// ============================================================================
// Module: Artifact References
// Description: Content-addressed references to files produced by commands.
// Purpose: Tie every produced file to a workspace-relative path and digest.
// Dependencies: crate::core::hashing, serde
// ============================================================================

//! ## Overview
//! An artifact is a file produced by a command, referenced in the evidence
//! ledger by workspace-relative path and SHA-256. A reference whose digest no
//! longer matches the file on disk signals either tampering or an interrupted
//! run; gates treat both as invariant corruption.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::core::hashing::DEFAULT_HASH_ALGORITHM;
use crate::core::hashing::HashDigest;
use crate::core::hashing::HashError;
use crate::core::hashing::hash_file;

// ============================================================================
// SECTION: Artifact Reference
// ============================================================================

/// Content-addressed reference to a produced file.
///
/// # Invariants
/// - `path` is workspace-relative with forward slashes.
/// - `sha256` matches the file contents at record time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef {
    /// Workspace-relative path of the artifact.
    pub path: String,
    /// Digest of the artifact contents.
    pub sha256: HashDigest,
}

impl ArtifactRef {
    /// Creates an artifact reference from a relative path and digest.
    #[must_use]
    pub fn new(path: impl Into<String>, sha256: HashDigest) -> Self {
        Self {
            path: path.into(),
            sha256,
        }
    }

    /// Hashes the file at `root`/`relative` and produces a reference.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] when the file cannot be read.
    pub fn from_file(root: &Path, relative: &str) -> Result<Self, HashError> {
        let digest = hash_file(DEFAULT_HASH_ALGORITHM, &root.join(relative))?;
        Ok(Self::new(relative, digest))
    }

    /// Returns the absolute path of the artifact under `root`.
    #[must_use]
    pub fn absolute_path(&self, root: &Path) -> PathBuf {
        root.join(&self.path)
    }

    /// Returns true when the file exists and its digest matches this reference.
    #[must_use]
    pub fn matches_disk(&self, root: &Path) -> bool {
        hash_file(DEFAULT_HASH_ALGORITHM, &self.absolute_path(root))
            .map(|digest| digest == self.sha256)
            .unwrap_or(false)
    }
}
