//! snapvault CLI
//!
//! Command-line interface for creating, reading and expiring dashboard
//! snapshots. Results are printed to stdout as JSON.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;

use crate::config::{Overrides, SnapvaultConfig};

#[derive(Debug, Parser)]
#[command(name = "snapvault")]
#[command(about = "snapvault - Dashboard snapshot storage", long_about = None)]
struct Cli {
    /// TOML config file (defaults to ./snapvault.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database path
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Logging profile: development, production or test
    #[arg(long, global = true)]
    log_profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create a snapshot
    Create(commands::snapshot::CreateArgs),
    /// Fetch a snapshot by its key
    Get(commands::snapshot::GetArgs),
    /// Delete a snapshot by its delete key
    Delete(commands::snapshot::DeleteArgs),
    /// Delete every expired snapshot
    DeleteExpired(commands::snapshot::DeleteExpiredArgs),
    /// List an organization's snapshots, newest first
    List(commands::snapshot::ListArgs),
    /// Search snapshot names within an organization
    Search(commands::search::SearchArgs),
    /// Apply pending schema migrations
    Migrate,
}

fn main() {
    // A missing .env is not an error
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let overrides = Overrides {
        db_path: cli.db,
        log_profile: cli.log_profile,
    };
    let config = SnapvaultConfig::load(cli.config.as_deref(), &overrides)?;
    snapvault_core::logging_facility::init(config.profile()?);
    tracing::debug!(config = ?config, "Loaded configuration");

    match cli.command {
        Commands::Create(args) => commands::snapshot::create(&config, args),
        Commands::Get(args) => commands::snapshot::get(&config, args),
        Commands::Delete(args) => commands::snapshot::delete(&config, args),
        Commands::DeleteExpired(args) => commands::snapshot::delete_expired(&config, args),
        Commands::List(args) => commands::snapshot::list(&config, args),
        Commands::Search(args) => commands::search::execute(&config, args),
        Commands::Migrate => commands::migrate::execute(&config),
    }
}
