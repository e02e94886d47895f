// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Repository interfaces for the cortex bounded context
//! Defines the contracts for approach and execution record storage

use async_trait::async_trait;
use chrono::NaiveDate;
use hybrid_swarm_core::RepositoryError;

use super::approach::ApproachPattern;
use super::execution::{ExecutionRecord, LedgerIndex};

/// Storage for approach patterns, keyed by id
#[async_trait]
pub trait ApproachRepository: Send + Sync {
    /// Insert or replace an approach
    async fn save(&self, approach: &ApproachPattern) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<ApproachPattern>, RepositoryError>;

    /// Every stored approach, active or not
    async fn list_all(&self) -> Result<Vec<ApproachPattern>, RepositoryError>;
}

/// Append-only storage for execution records, partitioned by day
#[async_trait]
pub trait ExecutionRecordStore: Send + Sync {
    /// Append to the partition of the record's day and update the index
    async fn append(&self, record: &ExecutionRecord) -> Result<(), RepositoryError>;

    /// Records of one day's partition in append order; empty when absent
    async fn read_partition(&self, day: NaiveDate) -> Result<Vec<ExecutionRecord>, RepositoryError>;

    async fn index(&self) -> Result<LedgerIndex, RepositoryError>;
}
