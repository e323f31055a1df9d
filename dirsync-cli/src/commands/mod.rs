pub mod apply;
pub mod delete;
pub mod plan;
pub mod show;
pub mod status;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use dirsync_core::{document, DesiredState, EntityId};
use dirsync_reconcile::{state_store, HttpTransport};

use crate::config::Config;

/// A desired-state document as read from disk.
pub struct Document {
    pub name: String,
    /// Absolute where possible, so `status` works from any directory.
    pub path: PathBuf,
    pub contents: String,
    pub desired: DesiredState,
}

impl Document {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = document::read(path)
            .with_context(|| format!("cannot read document {}", path.display()))?;
        let desired = document::parse(path, &contents)?;
        let path = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        Ok(Self {
            name: document::document_name(&path),
            path,
            contents,
            desired,
        })
    }
}

pub fn home() -> Result<PathBuf> {
    dirs::home_dir().context("could not determine home directory")
}

/// Entity id remembered from the last apply of `name`, if any.
pub fn known_id(home: &Path, name: &str) -> Result<Option<EntityId>> {
    let record = state_store::load_at(home, name)
        .with_context(|| format!("failed to load state for '{name}'"))?;
    Ok(record.map(|record| record.id))
}

pub fn transport(home: &Path) -> Result<HttpTransport> {
    let config = Config::load_at(home)?;
    tracing::debug!(base_url = %config.base_url, "using directory API");
    Ok(HttpTransport::new(config.http()?))
}
