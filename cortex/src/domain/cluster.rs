// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::execution::ExecutionRecord;

/// Quality standard deviation below which a cluster counts as consistent.
pub const CONSISTENCY_STD_DEV: f64 = 0.15;

/// Transient group of similar executions found by the pattern miner.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternCluster {
    pub cluster_id: String,
    pub records: Vec<ExecutionRecord>,
    pub centroid: BTreeMap<String, f64>,
    pub avg_quality: f64,
    pub quality_std_dev: f64,
    pub is_consistent: bool,
}

impl PatternCluster {
    pub fn size(&self) -> usize {
        self.records.len()
    }

    pub fn summary(&self) -> ClusterSummary {
        ClusterSummary {
            cluster_id: self.cluster_id.clone(),
            size: self.size(),
            avg_quality: self.avg_quality,
            quality_std_dev: self.quality_std_dev,
            is_consistent: self.is_consistent,
            centroid: self.centroid.clone(),
            record_ids: self.records.iter().map(|r| r.record_id.clone()).collect(),
        }
    }
}

/// Persisted view of a cluster in the discovery report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub cluster_id: String,
    pub size: usize,
    pub avg_quality: f64,
    pub quality_std_dev: f64,
    pub is_consistent: bool,
    pub centroid: BTreeMap<String, f64>,
    pub record_ids: Vec<String>,
}
