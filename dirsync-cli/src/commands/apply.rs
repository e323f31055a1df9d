//! `dirsync apply <doc.yaml> [--dry-run]`: reconcile one entity and persist
//! the merged state.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use colored::Colorize;

use dirsync_compiler::SystemClock;
use dirsync_reconcile::{executor, pipeline, state_store, ReconcileError, StateRecord};

use super::plan::{build, print_plan};
use super::{home, known_id, transport, Document};

/// Arguments for `dirsync apply`.
#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Desired-state document.
    pub document: PathBuf,

    /// Show what would be sent without writing anything.
    #[arg(long)]
    pub dry_run: bool,
}

impl ApplyArgs {
    pub fn run(self) -> Result<()> {
        let home = home()?;
        let doc = Document::load(&self.document)?;
        let clock = SystemClock;

        if self.dry_run {
            let plan = build(&home, &doc)?;
            print!("[dry-run] ");
            return print_plan(&doc, &plan, &clock);
        }

        let transport = transport(&home)?;
        let current = match known_id(&home, &doc.name)? {
            Some(id) => executor::read(&transport, &id)
                .with_context(|| format!("failed to read {id}"))?,
            None => None,
        };
        let plan = pipeline::plan(&doc.desired, current.as_ref(), &clock)
            .with_context(|| format!("'{}' is not a valid desired state", doc.name))?;

        let reconciled = match pipeline::apply(&transport, &plan, &clock) {
            Ok(outcome) => outcome.reconciled,
            Err(ReconcileError::SecondaryWrite { id, source }) => {
                // Remember the entity before retrying, so a failed retry
                // leaves an update to finish rather than a second create.
                let pending = StateRecord::pending(
                    &id,
                    plan.target_state(),
                    &doc.desired,
                    &doc.path,
                    doc.contents.as_bytes(),
                    Utc::now(),
                );
                state_store::save_at(&home, &doc.name, &pending)
                    .with_context(|| format!("failed to save state for '{}'", doc.name))?;

                tracing::warn!(%id, error = %source, "secondary write failed; retrying once");
                pipeline::retry_secondary(&transport, &id, &plan.compiled.secondary)
                    .with_context(|| {
                        format!(
                            "{id} was written but its secondary fields were not; \
                             re-run apply to finish"
                        )
                    })?;
                pipeline::refresh(&transport, &id, &doc.desired, &clock)?
                    .with_context(|| format!("{id} disappeared right after apply"))?
            }
            Err(err) => {
                return Err(err).with_context(|| format!("apply failed for '{}'", doc.name))
            }
        };

        let record = StateRecord::new(&reconciled, &doc.path, doc.contents.as_bytes(), Utc::now());
        state_store::save_at(&home, &doc.name, &record)
            .with_context(|| format!("failed to save state for '{}'", doc.name))?;

        println!(
            "{} '{}' applied: {} is {}",
            "✓".green(),
            doc.name,
            reconciled.id,
            reconciled.state
        );
        Ok(())
    }
}
