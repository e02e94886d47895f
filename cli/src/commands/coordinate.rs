// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `coordinate`: ask the engine for a specialist and an approach.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use hybrid_swarm_core::TaskDescriptor;
use std::path::PathBuf;
use uuid::Uuid;

use super::{read_json_file, start_runtime};
use crate::engine::CoordinationDecision;

#[derive(Args)]
pub struct CoordinateArgs {
    /// Task descriptor as a JSON file (other task flags are ignored)
    #[arg(long, value_name = "FILE")]
    pub task: Option<PathBuf>,

    /// Task id (default: generated)
    #[arg(long)]
    pub id: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    /// Domain weight, repeatable
    #[arg(long = "domain", value_name = "NAME=WEIGHT", value_parser = parse_domain)]
    pub domains: Vec<(String, f64)>,

    #[arg(long, default_value_t = 0.5)]
    pub complexity: f64,

    /// Comma-separated keywords
    #[arg(long, value_delimiter = ',')]
    pub keywords: Vec<String>,

    #[arg(long, default_value = "explanation")]
    pub output_type: String,

    #[arg(long, default_value_t = 1.0)]
    pub duration: f64,

    /// Print the decision as JSON
    #[arg(long)]
    pub json: bool,
}

impl CoordinateArgs {
    pub fn task(&self) -> Result<TaskDescriptor> {
        if let Some(path) = &self.task {
            return read_json_file(path);
        }

        let id = self
            .id
            .clone()
            .unwrap_or_else(|| format!("task_{}", Uuid::new_v4().simple()));
        let mut task = TaskDescriptor::new(id, self.output_type.clone())
            .with_complexity(self.complexity)
            .with_keywords(self.keywords.iter().cloned())
            .with_estimated_duration(self.duration);
        if let Some(description) = &self.description {
            task = task.with_description(description.clone());
        }
        for (domain, weight) in &self.domains {
            task = task.with_domain(domain.clone(), *weight);
        }
        Ok(task)
    }
}

fn parse_domain(value: &str) -> Result<(String, f64), String> {
    let (name, weight) = value
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=WEIGHT, got '{value}'"))?;
    let weight: f64 = weight
        .trim()
        .parse()
        .map_err(|_| format!("invalid weight in '{value}'"))?;
    if name.trim().is_empty() {
        return Err(format!("empty domain name in '{value}'"));
    }
    Ok((name.trim().to_string(), weight))
}

pub async fn execute(args: CoordinateArgs, config_override: Option<PathBuf>) -> Result<()> {
    let task = args.task()?;
    let runtime = start_runtime(config_override).await?;
    let decision = runtime.engine.get_coordination(&task).await;
    runtime.shutdown().await?;
    let decision = decision.context("Coordination failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&decision)?);
    } else {
        print_decision(&decision);
    }
    Ok(())
}

fn print_decision(decision: &CoordinationDecision) {
    println!("{}", "Coordination decision".bold());
    println!("  Task:       {}", decision.task_id);
    let marker = if decision.specialist_created { " (new)" } else { "" };
    println!(
        "  Specialist: {}{} resonance {:.3}",
        decision.specialist_id, marker, decision.resonance
    );
    println!(
        "  Approach:   {} via {:?}",
        decision.approach_id.green(),
        decision.selection
    );
    println!("  Target:     {:.2}", decision.quality_target);
    if let Some(metadata) = &decision.approach_metadata {
        println!("  Name:       {}", metadata.name);
        println!(
            "  Style:      {} / {} / {}",
            metadata.style.structure.as_str(),
            metadata.style.tone,
            metadata.style.depth.as_str()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_domain() {
        assert_eq!(parse_domain("coding=0.7").unwrap(), ("coding".to_string(), 0.7));
        assert!(parse_domain("coding").is_err());
        assert!(parse_domain("=0.3").is_err());
        assert!(parse_domain("coding=high").is_err());
    }
}
