// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Repository Implementations
//!
//! ## In-Memory Repositories
//!
//! - **InMemorySpecialistRepository** - map-backed profile storage
//! - **InMemorySignalRepository** - map-backed per-task signal storage
//!
//! ## File Repositories
//!
//! - **FileSpecialistRepository** - one JSON document per specialist
//! - **FileSignalRepository** - one JSON document per task holding its signals
//!
//! Ids become file stems only after passing through the injected
//! [`IdentifierSanitizer`], suffixed with a digest of the raw id so that
//! ids which sanitize alike still get their own file.

use async_trait::async_trait;
use hybrid_swarm_core::infrastructure::json_store::{
    document_file_name, load_json_dir, read_json, remove_file_if_exists, write_json_atomic,
};
use hybrid_swarm_core::{IdentifierSanitizer, RepositoryError};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::domain::{Signal, SignalRepository, SpecialistProfile, SpecialistRepository};

#[derive(Clone, Default)]
pub struct InMemorySpecialistRepository {
    profiles: Arc<RwLock<BTreeMap<String, SpecialistProfile>>>,
}

impl InMemorySpecialistRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SpecialistRepository for InMemorySpecialistRepository {
    async fn save(&self, profile: &SpecialistProfile) -> Result<(), RepositoryError> {
        self.profiles.write().insert(profile.id.clone(), profile.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<SpecialistProfile>, RepositoryError> {
        Ok(self.profiles.read().get(id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<SpecialistProfile>, RepositoryError> {
        Ok(self.profiles.read().values().cloned().collect())
    }

    async fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        self.profiles.write().remove(id);
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct InMemorySignalRepository {
    signals: Arc<RwLock<BTreeMap<String, Vec<Signal>>>>,
}

impl InMemorySignalRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SignalRepository for InMemorySignalRepository {
    async fn save_task(&self, task_id: &str, signals: &[Signal]) -> Result<(), RepositoryError> {
        let mut map = self.signals.write();
        if signals.is_empty() {
            map.remove(task_id);
        } else {
            map.insert(task_id.to_string(), signals.to_vec());
        }
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<Signal>, RepositoryError> {
        Ok(self.signals.read().values().flatten().cloned().collect())
    }
}

fn document_path(
    dir: &Path,
    sanitizer: &dyn IdentifierSanitizer,
    id: &str,
) -> Result<PathBuf, RepositoryError> {
    Ok(dir.join(document_file_name(sanitizer, id)?))
}

pub struct FileSpecialistRepository {
    dir: PathBuf,
    sanitizer: Arc<dyn IdentifierSanitizer>,
}

impl FileSpecialistRepository {
    pub fn new(dir: impl Into<PathBuf>, sanitizer: Arc<dyn IdentifierSanitizer>) -> Self {
        Self {
            dir: dir.into(),
            sanitizer,
        }
    }
}

#[async_trait]
impl SpecialistRepository for FileSpecialistRepository {
    async fn save(&self, profile: &SpecialistProfile) -> Result<(), RepositoryError> {
        let path = document_path(&self.dir, self.sanitizer.as_ref(), &profile.id)?;
        write_json_atomic(&path, profile).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<SpecialistProfile>, RepositoryError> {
        let path = document_path(&self.dir, self.sanitizer.as_ref(), id)?;
        read_json(&path).await
    }

    async fn list_all(&self) -> Result<Vec<SpecialistProfile>, RepositoryError> {
        load_json_dir(&self.dir, &[]).await
    }

    async fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        let path = document_path(&self.dir, self.sanitizer.as_ref(), id)?;
        remove_file_if_exists(&path).await
    }
}

pub struct FileSignalRepository {
    dir: PathBuf,
    sanitizer: Arc<dyn IdentifierSanitizer>,
}

impl FileSignalRepository {
    pub fn new(dir: impl Into<PathBuf>, sanitizer: Arc<dyn IdentifierSanitizer>) -> Self {
        Self {
            dir: dir.into(),
            sanitizer,
        }
    }
}

#[async_trait]
impl SignalRepository for FileSignalRepository {
    async fn save_task(&self, task_id: &str, signals: &[Signal]) -> Result<(), RepositoryError> {
        let path = document_path(&self.dir, self.sanitizer.as_ref(), task_id)?;
        if signals.is_empty() {
            remove_file_if_exists(&path).await
        } else {
            write_json_atomic(&path, signals).await
        }
    }

    async fn load_all(&self) -> Result<Vec<Signal>, RepositoryError> {
        let groups: Vec<Vec<Signal>> = load_json_dir(&self.dir, &[]).await?;
        Ok(groups.into_iter().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TaskSignature;
    use hybrid_swarm_core::StrictIdentifierSanitizer;

    fn profile(id: &str) -> SpecialistProfile {
        SpecialistProfile::new(
            id,
            TaskSignature {
                domain: "research".into(),
                complexity: 0.5,
                input_type: "text".into(),
                output_type: "report".into(),
                keywords: vec![],
                estimated_duration: 1.0,
            },
        )
    }

    #[tokio::test]
    async fn test_in_memory_specialist_crud() {
        let repo = InMemorySpecialistRepository::new();
        repo.save(&profile("specialist_a")).await.unwrap();
        assert!(repo.find_by_id("specialist_a").await.unwrap().is_some());
        assert_eq!(repo.list_all().await.unwrap().len(), 1);
        repo.delete("specialist_a").await.unwrap();
        assert!(repo.find_by_id("specialist_a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_specialist_roundtrip_and_corrupt_skip() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileSpecialistRepository::new(dir.path(), Arc::new(StrictIdentifierSanitizer::new()));
        let p = profile("specialist_a");
        repo.save(&p).await.unwrap();
        repo.save(&profile("specialist_b")).await.unwrap();
        tokio::fs::write(dir.path().join("broken.json"), b"[1,2").await.unwrap();

        assert_eq!(repo.find_by_id("specialist_a").await.unwrap(), Some(p));
        assert_eq!(repo.list_all().await.unwrap().len(), 2);

        repo.delete("specialist_b").await.unwrap();
        repo.delete("specialist_b").await.unwrap();
        assert_eq!(repo.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_file_repository_rejects_unsanitizable_id() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileSpecialistRepository::new(dir.path(), Arc::new(StrictIdentifierSanitizer::new()));
        let result = repo.find_by_id("../..").await;
        assert!(matches!(result, Err(RepositoryError::InvalidIdentifier(_))));
    }

    #[tokio::test]
    async fn test_file_signal_repository_replaces_and_removes() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileSignalRepository::new(dir.path(), Arc::new(StrictIdentifierSanitizer::new()));
        let signals = vec![
            Signal::new("task_1", "approach_A", 40.0, "s1", 0.4),
            Signal::new("task_1", "approach_B", 20.0, "s1", 0.2),
        ];
        repo.save_task("task_1", &signals).await.unwrap();
        repo.save_task("task_2", &[Signal::new("task_2", "approach_A", 10.0, "s2", 0.1)])
            .await
            .unwrap();
        assert_eq!(repo.load_all().await.unwrap().len(), 3);

        repo.save_task("task_1", &[]).await.unwrap();
        let remaining = repo.load_all().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].task_id, "task_2");
    }

    #[tokio::test]
    async fn test_task_ids_that_sanitize_alike_keep_separate_signals() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileSignalRepository::new(dir.path(), Arc::new(StrictIdentifierSanitizer::new()));
        repo.save_task("task.1", &[Signal::new("task.1", "approach_A", 40.0, "s1", 0.4)])
            .await
            .unwrap();
        repo.save_task("task1", &[Signal::new("task1", "approach_B", 30.0, "s1", 0.3)])
            .await
            .unwrap();
        repo.save_task("a/1", &[Signal::new("a/1", "approach_A", 20.0, "s2", 0.2)])
            .await
            .unwrap();
        repo.save_task("b/1", &[Signal::new("b/1", "approach_C", 10.0, "s2", 0.1)])
            .await
            .unwrap();

        let mut task_ids: Vec<String> = repo
            .load_all()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.task_id)
            .collect();
        task_ids.sort();
        assert_eq!(task_ids, vec!["a/1", "b/1", "task.1", "task1"]);

        repo.save_task("task1", &[]).await.unwrap();
        let remaining = repo.load_all().await.unwrap();
        assert_eq!(remaining.len(), 3);
        assert!(remaining.iter().any(|s| s.task_id == "task.1"));
    }
}
