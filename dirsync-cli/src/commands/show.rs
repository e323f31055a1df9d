//! `dirsync show <doc.yaml> [--json]`: refresh from the server and print the
//! reconciled state. Nothing is written.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use dirsync_compiler::SystemClock;
use dirsync_core::DesiredState;
use dirsync_reconcile::{pipeline, policy::policy_for, MergePolicy};

use super::plan::render;
use super::{home, known_id, transport, Document};

/// Arguments for `dirsync show`.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Desired-state document.
    pub document: PathBuf,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct ShowJson<'a> {
    document: &'a str,
    id: String,
    state: String,
    fields: &'a DesiredState,
}

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "field")]
    field: String,
    #[tabled(rename = "value")]
    value: String,
    #[tabled(rename = "merge")]
    merge: &'static str,
}

impl ShowArgs {
    pub fn run(self) -> Result<()> {
        let home = home()?;
        let doc = Document::load(&self.document)?;
        let id = known_id(&home, &doc.name)?.with_context(|| {
            format!(
                "'{}' has never been applied; run `dirsync apply {}` first",
                doc.name,
                self.document.display()
            )
        })?;
        let transport = transport(&home)?;

        let Some(reconciled) = pipeline::refresh(&transport, &id, &doc.desired, &SystemClock)
            .with_context(|| format!("failed to refresh {id}"))?
        else {
            println!("{id} no longer exists on the server.");
            return Ok(());
        };

        if self.json {
            let payload = ShowJson {
                document: &doc.name,
                id: reconciled.id.to_string(),
                state: reconciled.state.to_string(),
                fields: &reconciled.fields,
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).context("failed to serialize JSON")?
            );
            return Ok(());
        }

        println!(
            "{} ({}) {}",
            doc.name.bold(),
            reconciled.id,
            reconciled.state.to_string().cyan()
        );
        let rows: Vec<FieldRow> = reconciled
            .fields
            .iter()
            .map(|(name, value)| FieldRow {
                field: name.clone(),
                value: render(value),
                merge: policy_label(policy_for(name)),
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        Ok(())
    }
}

fn policy_label(policy: Option<MergePolicy>) -> &'static str {
    match policy {
        Some(MergePolicy::PreferRemote) => "server",
        Some(MergePolicy::PreferLocal) => "local",
        Some(MergePolicy::PinIfSet) => "pinned",
        None => "",
    }
}
