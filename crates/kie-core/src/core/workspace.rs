// crates/kie-core/src/core/workspace.rs
// ============================================================================
// Module: Workspace Layout
// Description: Path schema, marker detection, and atomic state writes.
// Purpose: Centralize the engine-owned filesystem contract.
// Dependencies: serde_json, serde_yaml via callers; std fs
// ============================================================================

//! ## Overview
//! A workspace is a root directory with the engine-owned skeleton
//! (`data/`, `outputs/`, `exports/`, `project_state/`, `.claude/commands/`)
//! and a marker file that distinguishes a workspace from an empty folder.
//! All engine-owned state files are written with write-temp-then-rename
//! atomicity so reads may race freely and always observe valid snapshots.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Marker file distinguishing a workspace from an empty folder.
pub const WORKSPACE_MARKER: &str = ".kie_workspace";

/// Required workspace subdirectories, relative to the root.
pub const REQUIRED_SUBDIRS: [&str; 5] =
    ["data", "outputs", "exports", "project_state", ".claude/commands"];

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Workspace filesystem errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// A filesystem operation failed.
    #[error("workspace io error at {path}: {source}")]
    Io {
        /// Path involved in the failed operation.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl WorkspaceError {
    /// Creates an IO error for the given path.
    #[must_use]
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

// ============================================================================
// SECTION: Layout
// ============================================================================

/// Resolved path schema for a single workspace.
///
/// # Invariants
/// - Exactly one workspace per engine run.
/// - All returned paths are under `root`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceLayout {
    /// Workspace root directory.
    root: PathBuf,
}

impl WorkspaceLayout {
    /// Creates a layout rooted at the given directory.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
        }
    }

    /// Returns the workspace root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the marker file path.
    #[must_use]
    pub fn marker_path(&self) -> PathBuf {
        self.root.join(WORKSPACE_MARKER)
    }

    /// Returns true when the marker file is present.
    #[must_use]
    pub fn is_workspace(&self) -> bool {
        self.marker_path().is_file()
    }

    /// Returns the data directory.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.root.join("data")
    }

    /// Returns the outputs directory.
    #[must_use]
    pub fn outputs_dir(&self) -> PathBuf {
        self.root.join("outputs")
    }

    /// Returns the chart-configuration directory.
    #[must_use]
    pub fn charts_dir(&self) -> PathBuf {
        self.root.join("outputs/charts")
    }

    /// Returns the exports directory.
    #[must_use]
    pub fn exports_dir(&self) -> PathBuf {
        self.root.join("exports")
    }

    /// Returns the export directory for a named build target.
    #[must_use]
    pub fn export_target_dir(&self, target: &str) -> PathBuf {
        self.exports_dir().join(target)
    }

    /// Returns the engine-owned state directory.
    #[must_use]
    pub fn project_state_dir(&self) -> PathBuf {
        self.root.join("project_state")
    }

    /// Returns the spec document path.
    #[must_use]
    pub fn spec_path(&self) -> PathBuf {
        self.root.join("project_state/spec.yaml")
    }

    /// Returns the rails state path.
    #[must_use]
    pub fn rails_state_path(&self) -> PathBuf {
        self.root.join("project_state/rails_state.json")
    }

    /// Returns the human-readable trust bundle path.
    #[must_use]
    pub fn trust_bundle_md_path(&self) -> PathBuf {
        self.root.join("project_state/trust_bundle.md")
    }

    /// Returns the machine-readable trust bundle path.
    #[must_use]
    pub fn trust_bundle_json_path(&self) -> PathBuf {
        self.root.join("project_state/trust_bundle.json")
    }

    /// Returns the recovery plan path.
    #[must_use]
    pub fn recovery_plan_path(&self) -> PathBuf {
        self.root.join("project_state/recovery_plan.md")
    }

    /// Returns the evidence ledger directory.
    #[must_use]
    pub fn ledger_dir(&self) -> PathBuf {
        self.root.join("project_state/evidence_ledger")
    }

    /// Returns the EDA profile JSON path.
    #[must_use]
    pub fn eda_profile_json_path(&self) -> PathBuf {
        self.root.join("outputs/eda_profile.json")
    }

    /// Returns the EDA profile YAML path.
    #[must_use]
    pub fn eda_profile_yaml_path(&self) -> PathBuf {
        self.root.join("outputs/eda_profile.yaml")
    }

    /// Returns the column mapping path.
    #[must_use]
    pub fn column_mapping_path(&self) -> PathBuf {
        self.root.join("outputs/column_mapping.json")
    }

    /// Returns the raw insights path.
    #[must_use]
    pub fn raw_insights_path(&self) -> PathBuf {
        self.root.join("outputs/raw_insights.json")
    }

    /// Returns the visualization plan path.
    #[must_use]
    pub fn visualization_plan_path(&self) -> PathBuf {
        self.root.join("outputs/visualization_plan.json")
    }

    /// Returns the engine configuration path.
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.root.join("kie.toml")
    }

    /// Returns a workspace-relative form of `path`, when it is under the root.
    #[must_use]
    pub fn relative(&self, path: &Path) -> Option<String> {
        path.strip_prefix(&self.root)
            .ok()
            .map(|relative| relative.to_string_lossy().replace('\\', "/"))
    }

    /// Ensures the full workspace skeleton and marker exist.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError`] when a directory or the marker cannot be
    /// created.
    pub fn ensure_skeleton(&self) -> Result<(), WorkspaceError> {
        for subdir in REQUIRED_SUBDIRS {
            let path = self.root.join(subdir);
            fs::create_dir_all(&path).map_err(|err| WorkspaceError::io(&path, err))?;
        }
        let ledger = self.ledger_dir();
        fs::create_dir_all(&ledger).map_err(|err| WorkspaceError::io(&ledger, err))?;
        let charts = self.charts_dir();
        fs::create_dir_all(&charts).map_err(|err| WorkspaceError::io(&charts, err))?;
        let marker = self.marker_path();
        if !marker.is_file() {
            atomic_write(&marker, b"kie workspace\n")?;
        }
        Ok(())
    }

    /// Lists data files present under `data/`, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError`] when the directory cannot be read (a
    /// missing directory yields an empty list).
    pub fn list_data_files(&self) -> Result<Vec<PathBuf>, WorkspaceError> {
        let dir = self.data_dir();
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&dir).map_err(|err| WorkspaceError::io(&dir, err))?;
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| WorkspaceError::io(&dir, err))?;
            let path = entry.path();
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

// ============================================================================
// SECTION: Atomic Writes
// ============================================================================

/// Writes bytes to `path` with write-temp-then-rename atomicity.
///
/// The temporary file lives in the destination directory so the rename never
/// crosses filesystems. Readers racing the write observe either the previous
/// snapshot or the new one, never a partial file.
///
/// # Errors
///
/// Returns [`WorkspaceError`] when the write or rename fails.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> Result<(), WorkspaceError> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|err| WorkspaceError::io(parent, err))?;
    let file_name = path.file_name().map_or_else(
        || ".kie_tmp".to_string(),
        |name| format!(".{}.tmp", name.to_string_lossy()),
    );
    let tmp_path = parent.join(file_name);
    {
        let mut file =
            fs::File::create(&tmp_path).map_err(|err| WorkspaceError::io(&tmp_path, err))?;
        file.write_all(bytes).map_err(|err| WorkspaceError::io(&tmp_path, err))?;
        file.sync_all().map_err(|err| WorkspaceError::io(&tmp_path, err))?;
    }
    fs::rename(&tmp_path, path).map_err(|err| WorkspaceError::io(path, err))
}
