//! State store: last reconciled state per desired-state document.
//!
//! Persists a [`StateRecord`] JSON document at
//! `<home>/.dirsync/state/<document>.json`.
//! Writes go to `<path>.json.tmp` and are renamed into place.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use dirsync_core::document::dirsync_root_at;
use dirsync_core::{DesiredState, EntityId, State};

use crate::error::{io_err, ReconcileError};
use crate::reconcile::ReconciledState;

/// On-disk record for one document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StateRecord {
    pub id: EntityId,
    pub state: State,
    /// Reconciled logical fields, write-only values included.
    pub fields: DesiredState,
    /// Where the applied document was read from.
    pub document_path: PathBuf,
    /// SHA-256 hex digest of the document text that was applied.
    pub document_digest: String,
    pub applied_at: DateTime<Utc>,
    /// The primary write landed but the secondary fields were not
    /// confirmed. The next apply updates `id` instead of creating.
    #[serde(default)]
    pub secondary_pending: bool,
}

impl StateRecord {
    pub fn new(
        reconciled: &ReconciledState,
        document_path: &Path,
        document: &[u8],
        applied_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: reconciled.id.clone(),
            state: reconciled.state,
            fields: reconciled.fields.clone(),
            document_path: document_path.to_path_buf(),
            document_digest: digest(document),
            applied_at,
            secondary_pending: false,
        }
    }

    /// Record an entity whose secondary write failed. `fields` are the
    /// desired fields as sent, since no read-back was merged.
    pub fn pending(
        id: &EntityId,
        state: State,
        fields: &DesiredState,
        document_path: &Path,
        document: &[u8],
        applied_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.clone(),
            state,
            fields: fields.clone(),
            document_path: document_path.to_path_buf(),
            document_digest: digest(document),
            applied_at,
            secondary_pending: true,
        }
    }
}

/// SHA-256 of `bytes` with CRLF normalised to LF, hex encoded.
pub fn digest(bytes: &[u8]) -> String {
    let normalized = String::from_utf8_lossy(bytes).replace("\r\n", "\n");
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    hex::encode(hasher.finalize())
}

/// `<home>/.dirsync/state/`
pub fn state_dir_at(home: &Path) -> PathBuf {
    dirsync_root_at(home).join("state")
}

/// `<home>/.dirsync/state/<document>.json`
pub fn store_path_at(home: &Path, document: &str) -> PathBuf {
    state_dir_at(home).join(format!("{document}.json"))
}

/// Load the record for `document`; `None` if it was never applied.
pub fn load_at(home: &Path, document: &str) -> Result<Option<StateRecord>, ReconcileError> {
    let path = store_path_at(home, document);
    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(io_err(&path, err)),
    };
    Ok(Some(serde_json::from_str(&contents)?))
}

/// Save the record for `document` atomically.
pub fn save_at(home: &Path, document: &str, record: &StateRecord) -> Result<(), ReconcileError> {
    let path = store_path_at(home, document);
    let dir = state_dir_at(home);
    std::fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;

    let json = serde_json::to_string_pretty(record)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
    std::fs::rename(&tmp, &path).map_err(|e| io_err(&path, e))?;
    tracing::debug!("saved state for {document} to {}", path.display());
    Ok(())
}

/// Remove the record for `document`. Returns whether one existed.
pub fn remove_at(home: &Path, document: &str) -> Result<bool, ReconcileError> {
    let path = store_path_at(home, document);
    match std::fs::remove_file(&path) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
        Err(err) => Err(io_err(&path, err)),
    }
}

/// Names of every document with a stored record, sorted.
pub fn list_at(home: &Path) -> Result<Vec<String>, ReconcileError> {
    let dir = state_dir_at(home);
    let entries = match std::fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(io_err(&dir, err)),
    };
    let mut names = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| io_err(&dir, e))?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            names.push(stem.to_owned());
        }
    }
    names.sort();
    Ok(names)
}
