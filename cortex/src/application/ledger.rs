// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Execution Ledger - append-only history of coordination outcomes
//!
//! Queries consult the ledger index first and only read partitions whose
//! day overlaps the requested window, oldest first, so results come back in
//! append order.

use chrono::{DateTime, Duration, Utc};
use hybrid_swarm_core::RepositoryError;
use std::sync::Arc;
use tracing::debug;

use crate::domain::{ExecutionRecord, ExecutionRecordStore, LedgerStatistics};

/// Window used when a query gives no start.
pub const DEFAULT_LOOKBACK_DAYS: i64 = 365;

/// Filters for [`ExecutionLedger::query`]. Unset fields do not filter.
#[derive(Debug, Clone, Default)]
pub struct LedgerQuery {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub min_quality: Option<f64>,
    pub approach_id: Option<String>,
    pub limit: Option<usize>,
}

impl LedgerQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn since(mut self, start: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self
    }

    pub fn until(mut self, end: DateTime<Utc>) -> Self {
        self.end = Some(end);
        self
    }

    pub fn min_quality(mut self, quality: f64) -> Self {
        self.min_quality = Some(quality);
        self
    }

    pub fn approach(mut self, approach_id: impl Into<String>) -> Self {
        self.approach_id = Some(approach_id.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    fn accepts(&self, record: &ExecutionRecord, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        if record.timestamp < start || record.timestamp > end {
            return false;
        }
        if let Some(min) = self.min_quality {
            if record.actual_quality < min {
                return false;
            }
        }
        match &self.approach_id {
            Some(id) => &record.approach_id == id,
            None => true,
        }
    }
}

pub struct ExecutionLedger {
    store: Arc<dyn ExecutionRecordStore>,
}

impl ExecutionLedger {
    pub fn new(store: Arc<dyn ExecutionRecordStore>) -> Self {
        Self { store }
    }

    pub async fn append(&self, record: &ExecutionRecord) -> Result<(), RepositoryError> {
        self.store.append(record).await?;
        metrics::counter!("hybrid_swarm_executions_recorded_total").increment(1);
        debug!(
            record_id = %record.record_id,
            approach_id = %record.approach_id,
            quality = record.actual_quality,
            "Appended execution record"
        );
        Ok(())
    }

    pub async fn query(&self, query: &LedgerQuery) -> Result<Vec<ExecutionRecord>, RepositoryError> {
        let now = Utc::now();
        let end = query.end.unwrap_or(now);
        let start = query
            .start
            .unwrap_or(now - Duration::days(DEFAULT_LOOKBACK_DAYS));
        if start > end || query.limit == Some(0) {
            return Ok(Vec::new());
        }

        let (first_day, last_day) = (start.date_naive(), end.date_naive());
        let days = self.store.index().await?.partition_days();

        let mut records = Vec::new();
        for day in days.into_iter().filter(|d| *d >= first_day && *d <= last_day) {
            for record in self.store.read_partition(day).await? {
                if !query.accepts(&record, start, end) {
                    continue;
                }
                records.push(record);
                if query.limit.is_some_and(|limit| records.len() >= limit) {
                    return Ok(records);
                }
            }
        }
        Ok(records)
    }

    pub async fn recent_records(
        &self,
        days: i64,
        min_quality: Option<f64>,
    ) -> Result<Vec<ExecutionRecord>, RepositoryError> {
        let mut query = LedgerQuery::new().since(Utc::now() - Duration::days(days));
        query.min_quality = min_quality;
        self.query(&query).await
    }

    /// Records that used `approach_id`, over the last `days` (default window
    /// when `None`).
    pub async fn approach_history(
        &self,
        approach_id: &str,
        days: Option<i64>,
    ) -> Result<Vec<ExecutionRecord>, RepositoryError> {
        let mut query = LedgerQuery::new().approach(approach_id);
        if let Some(days) = days {
            query = query.since(Utc::now() - Duration::days(days));
        }
        self.query(&query).await
    }

    pub async fn statistics(&self) -> Result<LedgerStatistics, RepositoryError> {
        Ok(self.store.index().await?.statistics())
    }

    pub async fn total_records(&self) -> Result<u64, RepositoryError> {
        Ok(self.store.index().await?.total_records)
    }
}
