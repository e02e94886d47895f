// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Execution Records
//!
//! Immutable log entries appended to the execution ledger, and the index
//! that lets the ledger find a date range without touching every partition.
//!
//! Partitions are one per calendar day (UTC), named
//! `YYYY-MM/records_YYYYMMDD.jsonl`.

use chrono::{DateTime, NaiveDate, Utc};
use hybrid_swarm_core::{ContentFeatures, TaskDescriptor};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub const LEDGER_INDEX_VERSION: &str = "1.0";

/// One recorded execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub record_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "task_context")]
    pub task: TaskDescriptor,
    pub specialist_id: String,
    pub approach_id: String,
    pub quality_target: f64,
    pub actual_quality: f64,
    pub success: bool,
    #[serde(default)]
    pub execution_time_ms: u64,
    #[serde(default)]
    pub content_features: Option<ContentFeatures>,
}

impl ExecutionRecord {
    pub fn new(
        task: TaskDescriptor,
        specialist_id: impl Into<String>,
        approach_id: impl Into<String>,
        quality_target: f64,
        actual_quality: f64,
        success: bool,
    ) -> Self {
        let timestamp = Utc::now();
        Self {
            record_id: format!("exec_{}_{}", task.id, timestamp.timestamp_millis()),
            timestamp,
            task,
            specialist_id: specialist_id.into(),
            approach_id: approach_id.into(),
            quality_target: quality_target.clamp(0.0, 1.0),
            actual_quality: actual_quality.clamp(0.0, 1.0),
            success,
            execution_time_ms: 0,
            content_features: None,
        }
    }

    pub fn with_execution_time_ms(mut self, ms: u64) -> Self {
        self.execution_time_ms = ms;
        self
    }

    pub fn with_content_features(mut self, features: Option<ContentFeatures>) -> Self {
        self.content_features = features;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Calendar day (UTC) of the partition this record lands in.
    pub fn partition_day(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }
}

/// Span of days seen within one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub min: NaiveDate,
    pub max: NaiveDate,
    pub count: u64,
}

/// Ledger index persisted next to the partitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerIndex {
    pub version: String,
    pub created_at: DateTime<Utc>,
    pub total_records: u64,
    /// Keyed by `YYYY-MM`
    pub date_ranges: BTreeMap<String, DateRange>,
    /// Partition names, which sort chronologically
    pub files: BTreeSet<String>,
}

impl Default for LedgerIndex {
    fn default() -> Self {
        Self {
            version: LEDGER_INDEX_VERSION.to_string(),
            created_at: Utc::now(),
            total_records: 0,
            date_ranges: BTreeMap::new(),
            files: BTreeSet::new(),
        }
    }
}

impl LedgerIndex {
    pub fn month_key(day: NaiveDate) -> String {
        day.format("%Y-%m").to_string()
    }

    pub fn partition_name(day: NaiveDate) -> String {
        format!("{}/records_{}.jsonl", Self::month_key(day), day.format("%Y%m%d"))
    }

    /// Inverse of [`partition_name`](Self::partition_name).
    pub fn partition_day(name: &str) -> Option<NaiveDate> {
        let file = name.rsplit('/').next()?;
        let stamp = file.strip_prefix("records_")?.strip_suffix(".jsonl")?;
        NaiveDate::parse_from_str(stamp, "%Y%m%d").ok()
    }

    /// Account for one record appended to the partition for `day`.
    pub fn record(&mut self, day: NaiveDate) {
        self.total_records += 1;
        let range = self
            .date_ranges
            .entry(Self::month_key(day))
            .or_insert(DateRange {
                min: day,
                max: day,
                count: 0,
            });
        range.count += 1;
        range.min = range.min.min(day);
        range.max = range.max.max(day);
        self.files.insert(Self::partition_name(day));
    }

    /// Days with a partition, ascending.
    pub fn partition_days(&self) -> Vec<NaiveDate> {
        self.files
            .iter()
            .filter_map(|f| Self::partition_day(f))
            .collect()
    }

    pub fn statistics(&self) -> LedgerStatistics {
        LedgerStatistics {
            total_records: self.total_records,
            total_partitions: self.files.len(),
            month_count: self.date_ranges.len(),
            oldest_record: self.date_ranges.values().map(|r| r.min).min(),
            newest_record: self.date_ranges.values().map(|r| r.max).max(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerStatistics {
    pub total_records: u64,
    pub total_partitions: usize,
    pub month_count: usize,
    pub oldest_record: Option<NaiveDate>,
    pub newest_record: Option<NaiveDate>,
}
