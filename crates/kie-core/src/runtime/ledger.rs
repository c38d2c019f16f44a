// crates/kie-core/src/runtime/ledger.rs
// ============================================================================
// Module: File Evidence Ledger
// Description: Append-only evidence store, one YAML file per run.
// Purpose: Persist audit records durably with atomic writes.
// Dependencies: crate::core, crate::interfaces, serde_yaml
// ============================================================================

//! ## Overview
//! The file ledger stores one YAML document per run under
//! `project_state/evidence_ledger/`. Records are parsed by scanning the
//! directory; there is no in-memory mutation and no rewrite of existing
//! files. Writes are atomic per record (write-temp-then-rename) and happen
//! only after output artifacts are on disk.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::PathBuf;

use crate::core::evidence::EvidenceRecord;
use crate::core::identifiers::RunId;
use crate::core::time::Timestamp;
use crate::core::workspace::WorkspaceLayout;
use crate::core::workspace::atomic_write;
use crate::interfaces::LedgerError;
use crate::interfaces::LedgerStore;

// ============================================================================
// SECTION: File Ledger
// ============================================================================

/// Append-only evidence ledger backed by one file per run.
///
/// # Invariants
/// - Existing record files are never overwritten or mutated.
#[derive(Debug, Clone)]
pub struct FileLedger {
    /// Workspace the ledger lives in.
    layout: WorkspaceLayout,
}

impl FileLedger {
    /// Creates a ledger over the given workspace.
    #[must_use]
    pub const fn new(layout: WorkspaceLayout) -> Self {
        Self {
            layout,
        }
    }

    /// Returns the record path for a run.
    fn record_path(&self, run_id: &RunId) -> PathBuf {
        self.layout.ledger_dir().join(format!("{}.yaml", run_id.as_str()))
    }

    /// Produces a total order over record timestamps for latest() selection.
    fn sort_key(timestamp: Timestamp) -> (u8, i128) {
        match timestamp {
            Timestamp::Logical(value) => (0, i128::from(value)),
            Timestamp::UnixMillis(value) => (1, i128::from(value)),
        }
    }
}

impl LedgerStore for FileLedger {
    fn append(&self, record: &EvidenceRecord) -> Result<(), LedgerError> {
        let path = self.record_path(&record.run_id);
        if path.exists() {
            return Err(LedgerError::AlreadyRecorded(record.run_id.clone()));
        }
        let yaml = serde_yaml::to_string(record).map_err(|err| LedgerError::Corrupt {
            path: path.display().to_string(),
            detail: err.to_string(),
        })?;
        atomic_write(&path, yaml.as_bytes()).map_err(|err| LedgerError::Io {
            path: path.display().to_string(),
            source: std::io::Error::other(err.to_string()),
        })
    }

    fn load(&self, run_id: &RunId) -> Result<EvidenceRecord, LedgerError> {
        let path = self.record_path(run_id);
        if !path.is_file() {
            return Err(LedgerError::NotFound(run_id.clone()));
        }
        let contents = fs::read_to_string(&path).map_err(|err| LedgerError::Io {
            path: path.display().to_string(),
            source: err,
        })?;
        serde_yaml::from_str(&contents).map_err(|err| LedgerError::Corrupt {
            path: path.display().to_string(),
            detail: err.to_string(),
        })
    }

    fn list(&self) -> Result<Vec<RunId>, LedgerError> {
        let dir = self.layout.ledger_dir();
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&dir).map_err(|err| LedgerError::Io {
            path: dir.display().to_string(),
            source: err,
        })?;
        let mut run_ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| LedgerError::Io {
                path: dir.display().to_string(),
                source: err,
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "yaml")
                && let Some(stem) = path.file_stem()
            {
                run_ids.push(RunId::new(stem.to_string_lossy().to_string()));
            }
        }
        run_ids.sort();
        Ok(run_ids)
    }

    fn latest(&self) -> Result<Option<EvidenceRecord>, LedgerError> {
        let mut latest: Option<EvidenceRecord> = None;
        for run_id in self.list()? {
            let record = self.load(&run_id)?;
            let newer = latest.as_ref().is_none_or(|current| {
                Self::sort_key(record.timestamp) >= Self::sort_key(current.timestamp)
            });
            if newer {
                latest = Some(record);
            }
        }
        Ok(latest)
    }
}
