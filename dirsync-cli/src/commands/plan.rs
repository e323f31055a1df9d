//! `dirsync plan <doc.yaml>`: validate, compile and show drift. Never writes.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use dirsync_compiler::{Clock, SystemClock};
use dirsync_core::FieldValue;
use dirsync_reconcile::{executor, pipeline, Action, FieldChange, Plan};

use super::{home, known_id, transport, Document};

/// Arguments for `dirsync plan`.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Desired-state document.
    pub document: PathBuf,
}

impl PlanArgs {
    pub fn run(self) -> Result<()> {
        let home = home()?;
        let doc = Document::load(&self.document)?;
        let plan = build(&home, &doc)?;
        print_plan(&doc, &plan, &SystemClock)
    }
}

/// Read the current entity (when one is known) and plan against it.
/// A never-applied document plans a create without touching the network.
pub(crate) fn build(home: &Path, doc: &Document) -> Result<Plan> {
    let current = match known_id(home, &doc.name)? {
        Some(id) => {
            let transport = transport(home)?;
            executor::read(&transport, &id).with_context(|| format!("failed to read {id}"))?
        }
        None => None,
    };
    let plan = pipeline::plan(&doc.desired, current.as_ref(), &SystemClock)
        .with_context(|| format!("'{}' is not a valid desired state", doc.name))?;
    Ok(plan)
}

pub(crate) fn print_plan(doc: &Document, plan: &Plan, clock: &dyn Clock) -> Result<()> {
    let action = match &plan.action {
        Action::Create => "create".green().bold().to_string(),
        Action::Update { id, from } => format!("{} {id} from {from}", "update".yellow().bold()),
    };
    println!(
        "{} '{}': {action} (target state {})",
        "plan".bold(),
        doc.name,
        plan.target_state(),
    );

    let drift = plan.drift(clock).context("failed to compute drift")?;
    if drift.is_empty() {
        println!("No differences for '{}'.", doc.name);
    } else {
        for change in &drift.changes {
            print_change(change);
        }
        println!();
        print!("{}", drift.unified_diff);
        if !drift.unified_diff.ends_with('\n') {
            println!();
        }
    }

    for field in &plan.compiled.write_only {
        println!(
            "{} {field} is write-only and is always sent; reads never echo it",
            "note:".bright_black()
        );
    }
    Ok(())
}

fn print_change(change: &FieldChange) {
    match change {
        FieldChange::Added { name, value } => {
            println!("  {} {name}: {}", "+".green(), render(value))
        }
        FieldChange::Removed { name, value } => {
            println!("  {} {name}: {}", "-".red(), render(value))
        }
        FieldChange::Changed { name, from, to } => println!(
            "  {} {name}: {} -> {}",
            "~".yellow(),
            render(from),
            render(to)
        ),
    }
}

pub(crate) fn render(value: &FieldValue) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("{value:?}"))
}
