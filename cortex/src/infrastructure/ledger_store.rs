// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Execution record stores
//!
//! - **InMemoryExecutionRecordStore** - day-keyed vectors, for tests and ephemeral runs
//! - **FileExecutionRecordStore** - JSON-lines partitions plus an atomically
//!   rewritten `index.json`

use async_trait::async_trait;
use chrono::NaiveDate;
use hybrid_swarm_core::infrastructure::json_store::{
    append_json_line, read_json, read_json_lines, write_json_atomic,
};
use hybrid_swarm_core::RepositoryError;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::warn;

use crate::domain::{ExecutionRecord, ExecutionRecordStore, LedgerIndex};

pub const INDEX_FILE: &str = "index.json";

#[derive(Default)]
struct MemoryLedger {
    partitions: BTreeMap<NaiveDate, Vec<ExecutionRecord>>,
    index: LedgerIndex,
}

#[derive(Clone, Default)]
pub struct InMemoryExecutionRecordStore {
    inner: Arc<RwLock<MemoryLedger>>,
}

impl InMemoryExecutionRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExecutionRecordStore for InMemoryExecutionRecordStore {
    async fn append(&self, record: &ExecutionRecord) -> Result<(), RepositoryError> {
        let day = record.partition_day();
        let mut inner = self.inner.write();
        inner.partitions.entry(day).or_default().push(record.clone());
        inner.index.record(day);
        Ok(())
    }

    async fn read_partition(&self, day: NaiveDate) -> Result<Vec<ExecutionRecord>, RepositoryError> {
        Ok(self
            .inner
            .read()
            .partitions
            .get(&day)
            .cloned()
            .unwrap_or_default())
    }

    async fn index(&self) -> Result<LedgerIndex, RepositoryError> {
        Ok(self.inner.read().index.clone())
    }
}

pub struct FileExecutionRecordStore {
    dir: PathBuf,
    index: Mutex<Option<LedgerIndex>>,
}

impl FileExecutionRecordStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            index: Mutex::new(None),
        }
    }

    async fn load_index(&self) -> Result<LedgerIndex, RepositoryError> {
        let path = self.dir.join(INDEX_FILE);
        match read_json(&path).await {
            Ok(index) => Ok(index.unwrap_or_default()),
            Err(RepositoryError::Serialization(e)) => {
                warn!(path = %path.display(), error = %e, "Corrupt ledger index, rebuilding from partitions");
                let index = self.rebuild_index().await?;
                write_json_atomic(&path, &index).await?;
                Ok(index)
            }
            Err(e) => Err(e),
        }
    }

    /// Recount every `YYYY-MM/records_YYYYMMDD.jsonl` partition on disk.
    async fn rebuild_index(&self) -> Result<LedgerIndex, RepositoryError> {
        let mut index = LedgerIndex::default();
        let mut months = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(index),
            Err(e) => return Err(e.into()),
        };

        let mut partitions = Vec::new();
        while let Some(month) = months.next_entry().await? {
            if !month.file_type().await?.is_dir() {
                continue;
            }
            let month_name = month.file_name().to_string_lossy().into_owned();
            let mut files = tokio::fs::read_dir(month.path()).await?;
            while let Some(file) = files.next_entry().await? {
                let name = format!("{}/{}", month_name, file.file_name().to_string_lossy());
                if let Some(day) = LedgerIndex::partition_day(&name) {
                    if LedgerIndex::partition_name(day) == name {
                        partitions.push((day, file.path()));
                    }
                }
            }
        }
        partitions.sort();

        for (day, path) in partitions {
            let records: Vec<ExecutionRecord> = read_json_lines(&path).await?;
            for _ in &records {
                index.record(day);
            }
        }
        Ok(index)
    }
}

#[async_trait]
impl ExecutionRecordStore for FileExecutionRecordStore {
    async fn append(&self, record: &ExecutionRecord) -> Result<(), RepositoryError> {
        let day = record.partition_day();
        let mut guard = self.index.lock().await;
        let mut index = match guard.take() {
            Some(index) => index,
            None => self.load_index().await?,
        };

        let partition = self.dir.join(LedgerIndex::partition_name(day));
        if let Err(e) = append_json_line(&partition, record).await {
            *guard = Some(index);
            return Err(e);
        }

        index.record(day);
        let written = write_json_atomic(&self.dir.join(INDEX_FILE), &index).await;
        *guard = Some(index);
        written
    }

    async fn read_partition(&self, day: NaiveDate) -> Result<Vec<ExecutionRecord>, RepositoryError> {
        read_json_lines(&self.dir.join(LedgerIndex::partition_name(day))).await
    }

    async fn index(&self) -> Result<LedgerIndex, RepositoryError> {
        let mut guard = self.index.lock().await;
        if let Some(index) = guard.as_ref() {
            return Ok(index.clone());
        }
        let index = self.load_index().await?;
        *guard = Some(index.clone());
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use hybrid_swarm_core::TaskDescriptor;

    fn record(task_id: &str, quality: f64, day: u32) -> ExecutionRecord {
        ExecutionRecord::new(
            TaskDescriptor::new(task_id, "summary").with_domain("writing", 1.0),
            "specialist_a",
            "approach_C",
            0.8,
            quality,
            quality >= 0.7,
        )
        .with_timestamp(Utc.with_ymd_and_hms(2026, 5, day, 12, 0, 0).unwrap())
    }

    #[tokio::test]
    async fn test_file_store_partitions_by_day() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileExecutionRecordStore::new(dir.path());
        store.append(&record("t1", 0.9, 3)).await.unwrap();
        store.append(&record("t2", 0.4, 3)).await.unwrap();
        store.append(&record("t3", 0.8, 4)).await.unwrap();

        assert!(dir.path().join("2026-05/records_20260503.jsonl").exists());
        let day3 = NaiveDate::from_ymd_opt(2026, 5, 3).unwrap();
        let records = store.read_partition(day3).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].task.id, "t1");

        let index = store.index().await.unwrap();
        assert_eq!(index.total_records, 3);
        assert_eq!(index.files.len(), 2);
    }

    #[tokio::test]
    async fn test_file_store_reloads_index_and_skips_corrupt_lines() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FileExecutionRecordStore::new(dir.path());
            store.append(&record("t1", 0.9, 3)).await.unwrap();
        }
        let partition = dir.path().join("2026-05/records_20260503.jsonl");
        let mut content = tokio::fs::read_to_string(&partition).await.unwrap();
        content.push_str("{not json\n");
        tokio::fs::write(&partition, content).await.unwrap();

        let store = FileExecutionRecordStore::new(dir.path());
        store.append(&record("t2", 0.7, 3)).await.unwrap();
        assert_eq!(store.index().await.unwrap().total_records, 2);

        let day3 = NaiveDate::from_ymd_opt(2026, 5, 3).unwrap();
        let records = store.read_partition(day3).await.unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn test_corrupt_index_is_rebuilt_from_partitions() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FileExecutionRecordStore::new(dir.path());
            store.append(&record("t1", 0.9, 3)).await.unwrap();
            store.append(&record("t2", 0.8, 4)).await.unwrap();
        }
        tokio::fs::write(dir.path().join(INDEX_FILE), "{trunc").await.unwrap();

        let store = FileExecutionRecordStore::new(dir.path());
        store.append(&record("t3", 0.7, 4)).await.unwrap();
        store.append(&record("t4", 0.6, 5)).await.unwrap();

        let index = store.index().await.unwrap();
        assert_eq!(index.total_records, 4);
        assert_eq!(index.files.len(), 3);
        let day4 = NaiveDate::from_ymd_opt(2026, 5, 4).unwrap();
        assert_eq!(store.read_partition(day4).await.unwrap().len(), 2);

        // The rewritten index is readable by a fresh store.
        let reopened = FileExecutionRecordStore::new(dir.path());
        assert_eq!(reopened.index().await.unwrap().total_records, 4);
    }

    #[tokio::test]
    async fn test_in_memory_store_missing_partition_is_empty() {
        let store = InMemoryExecutionRecordStore::new();
        store.append(&record("t1", 0.9, 3)).await.unwrap();
        let day9 = NaiveDate::from_ymd_opt(2026, 5, 9).unwrap();
        assert!(store.read_partition(day9).await.unwrap().is_empty());
        assert_eq!(store.index().await.unwrap().partition_days().len(), 1);
    }
}
