//! Lineage CLI
//!
//! Thin host around `lineage-core`: opens the libsql node database, runs one
//! lookup and prints the result as JSON.
//!
//! # Usage
//!
//! ```bash
//! # Load the Greek gods sample tree
//! lineage seed
//!
//! # Every ancestor of the deity known as Death
//! lineage ancestors --field knownAs --value Death
//!
//! # Descendants of one node, rendered as a tree
//! lineage descendants --id <NODE_ID> --max-depth 3 --shape nested
//! ```
//!
//! # Environment Variables
//!
//! - `LINEAGE_DB_PATH`: Database file (default: `~/.lineage/lineage.db`)
//! - `LINEAGE_MAX_DEPTH`, `LINEAGE_SHARD_SIZE`, `LINEAGE_TIMEOUT_MS`: traversal tuning
//! - `RUST_LOG`: Logging level (e.g., "info", "debug", "trace")

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "lineage")]
#[command(about = "Lineage - ancestor and descendant lookups over parent-referenced nodes", long_about = None)]
struct Cli {
    /// Database file (overrides LINEAGE_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Load the Greek gods sample tree
    Seed(commands::SeedArgs),
    /// Resolve every ancestor of the matching nodes
    Ancestors(commands::LookupArgs),
    /// Resolve every descendant of the matching nodes
    Descendants(commands::LookupArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let db_path = commands::resolve_db_path(cli.db)?;

    match cli.command {
        Commands::Seed(args) => commands::seed(db_path, args).await,
        Commands::Ancestors(args) => {
            commands::lookup(db_path, lineage_core::Direction::Ancestors, args).await
        }
        Commands::Descendants(args) => {
            commands::lookup(db_path, lineage_core::Direction::Descendants, args).await
        }
    }
}
