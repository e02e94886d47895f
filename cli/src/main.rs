// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Hybrid Swarm CLI
//!
//! The `hybrid-swarm` binary hosts a coordination engine for one command at
//! a time. State lives wherever `storage` in the configuration points; with
//! the default in-memory backend every invocation starts empty, so set
//! `HYBRID_SWARM_DATA_DIR` (or `storage.backend: filesystem`) to keep it.
//!
//! ## Commands
//!
//! - `hybrid-swarm coordinate` - Pick a specialist and approach for a task
//! - `hybrid-swarm report` - Record an execution outcome
//! - `hybrid-swarm stats|prune|discover|evolve|seed` - Catalog maintenance
//! - `hybrid-swarm config show|validate|generate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use hybrid_swarm::commands::{
    self, ConfigCommand, CoordinateArgs, MaintenanceCommand, ReportArgs,
};

/// Hybrid swarm coordination engine
#[derive(Parser)]
#[command(name = "hybrid-swarm")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "HYBRID_SWARM_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "HYBRID_SWARM_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Choose a specialist and an approach for a task
    Coordinate(CoordinateArgs),

    /// Record the outcome of an executed task
    Report(ReportArgs),

    #[command(flatten)]
    Maintenance(MaintenanceCommand),

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level)?;

    match cli.command {
        Some(Commands::Coordinate(args)) => commands::coordinate::execute(args, cli.config).await,
        Some(Commands::Report(args)) => commands::report::execute(args, cli.config).await,
        Some(Commands::Maintenance(command)) => {
            commands::maintenance::handle_command(command, cli.config).await
        }
        Some(Commands::Config { command }) => commands::config::handle_command(command, cli.config).await,
        None => {
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_env("HYBRID_SWARM_LOG")
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}
