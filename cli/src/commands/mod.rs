// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the hybrid-swarm CLI

pub mod config;
pub mod coordinate;
pub mod maintenance;
pub mod report;

pub use self::config::ConfigCommand;
pub use self::coordinate::CoordinateArgs;
pub use self::maintenance::MaintenanceCommand;
pub use self::report::ReportArgs;

use anyhow::{Context, Result};
use hybrid_swarm_core::CoordinationConfig;
use std::path::{Path, PathBuf};

use crate::bootstrap::CoordinationRuntime;

/// Load configuration (explicit path, discovered path or defaults) and start
/// a runtime over it.
pub(crate) async fn start_runtime(config_override: Option<PathBuf>) -> Result<CoordinationRuntime> {
    let config =
        CoordinationConfig::load_or_default(config_override).context("Failed to load configuration")?;
    CoordinationRuntime::start(&config).await
}

pub(crate) fn read_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}
