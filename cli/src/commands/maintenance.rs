// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Catalog maintenance and inspection commands
//!
//! Commands: stats, prune, discover, evolve, seed

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use super::start_runtime;
use crate::engine::{CoordinationEngine, SystemStats};

#[derive(Subcommand)]
pub enum MaintenanceCommand {
    /// Show registry, signal, catalog and ledger statistics
    Stats {
        #[arg(long)]
        json: bool,
    },

    /// Deactivate underperforming approaches
    Prune {
        /// Only list what would be pruned
        #[arg(long)]
        dry_run: bool,
    },

    /// Run pattern discovery now and create approaches from novel clusters
    Discover,

    /// Evolve an approach from its recent history
    Evolve {
        #[arg(value_name = "APPROACH_ID")]
        approach_id: String,
    },

    /// Add the built-in legacy approaches to the catalog
    Seed,
}

pub async fn handle_command(command: MaintenanceCommand, config_override: Option<PathBuf>) -> Result<()> {
    let runtime = start_runtime(config_override).await?;
    let result = run(&runtime.engine, command).await;
    runtime.shutdown().await?;
    result
}

async fn run(engine: &CoordinationEngine, command: MaintenanceCommand) -> Result<()> {
    match command {
        MaintenanceCommand::Stats { json } => {
            let stats = engine.stats().await.context("Failed to collect statistics")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_stats(&stats);
            }
        }
        MaintenanceCommand::Prune { dry_run } => {
            let candidates = engine
                .prune_approaches(dry_run)
                .await
                .context("Pruning failed")?;
            if candidates.is_empty() {
                println!("{}", "No approaches to prune".green());
            }
            let verb = if dry_run { "Would prune" } else { "Pruned" };
            for candidate in candidates {
                println!(
                    "{} {} ({}): {}",
                    verb.yellow(),
                    candidate.approach_id,
                    candidate.name,
                    candidate.reason
                );
            }
        }
        MaintenanceCommand::Discover => {
            let outcome = engine.discover_now().await?;
            println!("Clusters found: {}", outcome.cluster_count);
            for id in &outcome.created {
                println!("  {} {}", "✓ Created".green(), id);
            }
        }
        MaintenanceCommand::Evolve { approach_id } => {
            match engine
                .evolve_approach(&approach_id)
                .await
                .context("Evolution failed")?
            {
                Some(child) => println!(
                    "{} {} → {} (generation {})",
                    "✓ Evolved".green(),
                    approach_id,
                    child.id,
                    child.generation
                ),
                None => println!("{}", "Evolution criteria not met".dimmed()),
            }
        }
        MaintenanceCommand::Seed => {
            let added = engine
                .seed_legacy_approaches()
                .await
                .context("Seeding failed")?;
            println!("{}", format!("✓ Seeded {added} legacy approaches").green());
        }
    }
    Ok(())
}

fn print_stats(stats: &SystemStats) {
    println!("{}", "Specialists:".bold());
    println!("  Count: {}", stats.specialist_count);
    for specialist in &stats.specialists {
        println!(
            "  {} executions {} success {:.0}% quality {:.2}",
            specialist.id,
            specialist.executions,
            specialist.success_rate * 100.0,
            specialist.avg_quality
        );
    }
    println!();

    println!("{}", "Signals:".bold());
    println!(
        "  {} signals over {} tasks",
        stats.signals.signal_count, stats.signals.task_count
    );
    println!();

    println!("{}", "Approaches:".bold());
    println!(
        "  {} total, {} active, {} inactive",
        stats.approaches.total_approaches,
        stats.approaches.active_approaches,
        stats.approaches.inactive_approaches
    );
    println!(
        "  {} used, {} executions, avg quality {:.2}",
        stats.approaches.approaches_with_usage,
        stats.approaches.total_usage,
        stats.approaches.avg_quality
    );
    println!();

    println!("{}", "Execution ledger:".bold());
    println!(
        "  {} records in {} partitions",
        stats.ledger.total_records, stats.ledger.total_partitions
    );
}
