//! Desired-state documents.
//!
//! # Storage layout
//!
//! ```text
//! <anywhere>/<name>.yaml     desired-state document (caller-owned)
//! ~/.dirsync/
//!   config.yaml              CLI configuration
//!   state/<name>.json        last reconciled state per document
//! ```
//!
//! # API pattern
//!
//! Functions touching the home directory come in two forms:
//! - `fn_at(home: &Path, …)`: explicit home; used in tests with `TempDir`
//! - `fn(…)`: derives home from `dirs::home_dir()`, delegates to `_at`

use std::path::{Path, PathBuf};

use crate::error::DocumentError;
use crate::types::DesiredState;

/// `<home>/.dirsync/`: pure, no I/O.
pub fn dirsync_root_at(home: &Path) -> PathBuf {
    home.join(".dirsync")
}

/// `<home>/.dirsync/` (convenience, uses `dirs::home_dir()`).
pub fn dirsync_root() -> Result<PathBuf, DocumentError> {
    Ok(dirsync_root_at(&home()?))
}

/// Document name used as the state-store key: the file stem.
pub fn document_name(path: &Path) -> String {
    path.file_stem()
        .unwrap_or_else(|| path.as_os_str())
        .to_string_lossy()
        .into_owned()
}

/// Load a desired-state document.
///
/// Returns `DocumentError::NotFound` if absent and `DocumentError::Parse`
/// (with path + line context) for malformed YAML or a non-mapping root.
pub fn load(path: &Path) -> Result<DesiredState, DocumentError> {
    let contents = read(path)?;
    parse(path, &contents)
}

/// Read the raw document text; the bytes feed the staleness digest.
pub fn read(path: &Path) -> Result<String, DocumentError> {
    if !path.exists() {
        return Err(DocumentError::NotFound {
            path: path.to_path_buf(),
        });
    }
    Ok(std::fs::read_to_string(path)?)
}

/// Parse document text already read from `path`.
pub fn parse(path: &Path, contents: &str) -> Result<DesiredState, DocumentError> {
    serde_yaml::from_str(contents).map_err(|e| DocumentError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Resolve the home directory.
pub fn home() -> Result<PathBuf, DocumentError> {
    dirs::home_dir().ok_or(DocumentError::HomeNotFound)
}
