//! `dirsync delete <doc.yaml>`: delete the entity the document was applied
//! to, then forget its local state.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use dirsync_core::document;
use dirsync_reconcile::{delete, state_store, DeleteOutcome};

use super::{home, known_id, transport};

/// Arguments for `dirsync delete`.
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Desired-state document that was applied. It does not need to exist.
    pub document: PathBuf,
}

impl DeleteArgs {
    pub fn run(self) -> Result<()> {
        let home = home()?;
        // The document itself may already be gone; only its name is needed.
        let name = document::document_name(&self.document);
        let id = known_id(&home, &name)?
            .with_context(|| format!("no state recorded for '{name}'; nothing to delete"))?;
        let transport = transport(&home)?;

        let outcome =
            delete(&transport, &id).with_context(|| format!("failed to delete {id}"))?;
        state_store::remove_at(&home, &name)
            .with_context(|| format!("failed to remove state for '{name}'"))?;

        match outcome {
            DeleteOutcome::Deleted { disabled } if disabled.is_empty() => {
                println!("{} deleted {id}", "✓".green());
            }
            DeleteOutcome::Deleted { disabled } => {
                println!(
                    "{} deleted {id} (disabled first: {})",
                    "✓".green(),
                    disabled.join(", ")
                );
            }
            DeleteOutcome::AlreadyAbsent => {
                println!("{} {id} was already gone", "✓".green());
            }
        }
        Ok(())
    }
}
