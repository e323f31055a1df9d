//! `dirsync status`: staleness of every applied document.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use dirsync_reconcile::{
    staleness::{check_recorded, format_datetime_age},
    state_store, StalenessSignal,
};

use super::home;

/// Arguments for `dirsync status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let home = home()?;
        let report = build_report(&home)?;
        if self.json {
            return print_json(report);
        }
        print_table(report);
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct DocumentStatus {
    document: String,
    entity: String,
    state: String,
    signal: StalenessSignal,
    applied_age: String,
    applied_at: Option<String>,
}

#[derive(Serialize)]
struct StatusReportJson {
    summary: StatusSummaryJson,
    documents: Vec<DocumentStatusJson>,
}

#[derive(Serialize)]
struct StatusSummaryJson {
    documents: usize,
    stale: usize,
}

#[derive(Serialize)]
struct DocumentStatusJson {
    document: String,
    entity: String,
    state: String,
    status: String,
    detail: String,
    applied_age: String,
    applied_at: Option<String>,
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "document")]
    document: String,
    #[tabled(rename = "entity")]
    entity: String,
    #[tabled(rename = "state")]
    state: String,
    #[tabled(rename = "status")]
    status: String,
    #[tabled(rename = "detail")]
    detail: String,
    #[tabled(rename = "applied")]
    applied: String,
}

fn build_report(home: &Path) -> Result<Vec<DocumentStatus>> {
    let names = state_store::list_at(home).context("failed to list state records")?;
    let mut rows = Vec::with_capacity(names.len());
    for name in names {
        let Some(record) = state_store::load_at(home, &name)
            .with_context(|| format!("failed to load state for '{name}'"))?
        else {
            continue;
        };
        let signal = check_recorded(home, &name)
            .with_context(|| format!("status check failed for '{name}'"))?;
        rows.push(DocumentStatus {
            document: name,
            entity: record.id.to_string(),
            state: record.state.to_string(),
            signal,
            applied_age: format_datetime_age(record.applied_at),
            applied_at: Some(record.applied_at.to_rfc3339()),
        });
    }
    Ok(rows)
}

fn stale_count(rows: &[DocumentStatus]) -> usize {
    rows.iter()
        .filter(|r| matches!(r.signal, StalenessSignal::Stale { .. }))
        .count()
}

fn print_json(rows: Vec<DocumentStatus>) -> Result<()> {
    let payload = StatusReportJson {
        summary: StatusSummaryJson {
            documents: rows.len(),
            stale: stale_count(&rows),
        },
        documents: rows
            .into_iter()
            .map(|row| DocumentStatusJson {
                status: signal_key(&row.signal).to_string(),
                detail: signal_detail(&row.signal),
                document: row.document,
                entity: row.entity,
                state: row.state,
                applied_age: row.applied_age,
                applied_at: row.applied_at,
            })
            .collect(),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize status JSON")?
    );
    Ok(())
}

fn print_table(rows: Vec<DocumentStatus>) {
    let stale = stale_count(&rows);
    println!(
        "dirsync v{} | {} documents | {} stale",
        env!("CARGO_PKG_VERSION"),
        rows.len(),
        stale,
    );

    if rows.is_empty() {
        println!("No documents applied.");
        return;
    }

    let table_rows: Vec<StatusTableRow> = rows
        .into_iter()
        .map(|row| StatusTableRow {
            status: format!("{} {}", signal_indicator(&row.signal), signal_label(&row.signal)),
            detail: signal_detail(&row.signal),
            document: row.document,
            entity: row.entity,
            state: row.state,
            applied: format!("{} ago", row.applied_age),
        })
        .collect();
    let mut table = Table::new(table_rows);
    table.with(Style::rounded());
    println!("{table}");

    if stale > 0 {
        println!("Run 'dirsync apply <doc.yaml>' to push edited documents.");
    }
}

fn signal_key(signal: &StalenessSignal) -> &'static str {
    match signal {
        StalenessSignal::NeverApplied => "never_applied",
        StalenessSignal::Current => "current",
        StalenessSignal::Stale { .. } => "stale",
    }
}

fn signal_label(signal: &StalenessSignal) -> &'static str {
    match signal {
        StalenessSignal::NeverApplied => "NEVER APPLIED",
        StalenessSignal::Current => "CURRENT",
        StalenessSignal::Stale { .. } => "STALE",
    }
}

fn signal_indicator(signal: &StalenessSignal) -> String {
    match signal {
        StalenessSignal::NeverApplied => "■".bright_black().bold().to_string(),
        StalenessSignal::Current => "■".green().bold().to_string(),
        StalenessSignal::Stale { .. } => "■".yellow().bold().to_string(),
    }
}

fn signal_detail(signal: &StalenessSignal) -> String {
    match signal {
        StalenessSignal::NeverApplied => "no state record".to_string(),
        StalenessSignal::Current => "up to date".to_string(),
        StalenessSignal::Stale { reason } => reason.clone(),
    }
}
