//! dirsync: reconcile directory user entities against YAML documents.
//!
//! # Usage
//!
//! ```text
//! dirsync plan <doc.yaml>
//! dirsync apply <doc.yaml> [--dry-run]
//! dirsync show <doc.yaml> [--json]
//! dirsync delete <doc.yaml>
//! dirsync status [--json]
//! ```
//!
//! Network commands need `DIRSYNC_API_KEY`; see [`config`].

mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    apply::ApplyArgs, delete::DeleteArgs, plan::PlanArgs, show::ShowArgs, status::StatusArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "dirsync",
    version,
    about = "Reconcile directory user accounts against desired-state documents",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a document and show what apply would change.
    Plan(PlanArgs),

    /// Create or update the entity described by a document.
    Apply(ApplyArgs),

    /// Print the server's view of an applied document.
    Show(ShowArgs),

    /// Delete the entity an applied document created.
    Delete(DeleteArgs),

    /// Show staleness of every applied document.
    Status(StatusArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Plan(args) => args.run(),
        Commands::Apply(args) => args.run(),
        Commands::Show(args) => args.run(),
        Commands::Delete(args) => args.run(),
        Commands::Status(args) => args.run(),
    }
}

/// Logs go to stderr so `--json` output stays parseable. `RUST_LOG`
/// overrides the default level; library `log` records are bridged in.
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
