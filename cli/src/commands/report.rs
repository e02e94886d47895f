// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `report`: feed an execution outcome back into the engine.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use super::{read_json_file, start_runtime};
use crate::engine::ExecutionReport;

#[derive(Args)]
pub struct ReportArgs {
    #[arg(long)]
    pub specialist: String,

    #[arg(long)]
    pub approach: String,

    #[arg(long = "task-id")]
    pub task_id: String,

    /// Observed quality in [0, 1]
    #[arg(long)]
    pub quality: f64,

    /// Mark the execution as failed
    #[arg(long)]
    pub failed: bool,

    /// Task descriptor JSON; required for the execution to reach the ledger
    #[arg(long, value_name = "FILE")]
    pub task: Option<PathBuf>,

    /// Content features JSON
    #[arg(long, value_name = "FILE")]
    pub features: Option<PathBuf>,

    #[arg(long)]
    pub quality_target: Option<f64>,

    #[arg(long, default_value_t = 0)]
    pub execution_time_ms: u64,
}

impl ReportArgs {
    pub fn report(&self) -> Result<ExecutionReport> {
        if !(0.0..=1.0).contains(&self.quality) {
            anyhow::bail!("--quality must be within [0, 1] (got {})", self.quality);
        }
        let mut report = ExecutionReport::new(
            self.specialist.clone(),
            self.approach.clone(),
            self.task_id.clone(),
            self.quality,
            !self.failed,
        )
        .with_execution_time_ms(self.execution_time_ms);
        if let Some(path) = &self.task {
            report = report.with_task(read_json_file(path)?);
        }
        if let Some(path) = &self.features {
            report = report.with_content_features(read_json_file(path)?);
        }
        if let Some(target) = self.quality_target {
            report = report.with_quality_target(target);
        }
        Ok(report)
    }
}

pub async fn execute(args: ReportArgs, config_override: Option<PathBuf>) -> Result<()> {
    let report = args.report()?;
    let runtime = start_runtime(config_override).await?;
    let outcome = runtime.engine.record_result(report).await;
    runtime.shutdown().await?;
    let outcome = outcome.context("Failed to record result")?;

    let mark = |updated: bool| if updated { "✓".green() } else { "-".dimmed() };
    println!("{}", "Result recorded".bold());
    println!("  {} specialist", mark(outcome.specialist_updated));
    println!("  {} signal", mark(outcome.signal_deposited));
    println!("  {} approach metrics", mark(outcome.approach_updated));
    println!("  {} execution ledger", mark(outcome.ledger_appended));
    if outcome.discovery_triggered {
        println!("  {} pattern discovery started", "…".yellow());
    }
    Ok(())
}
