// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Approach repository implementations
//!
//! The file-backed repository keeps one JSON document per approach plus a
//! `manifest.json` summarizing every stored approach. Both are written
//! atomically (temp file then rename).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hybrid_swarm_core::infrastructure::json_store::{
    document_file_name, load_json_dir, read_json, write_json_atomic,
};
use hybrid_swarm_core::{IdentifierSanitizer, RepositoryError};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::domain::{ApproachPattern, ApproachRepository};

pub const MANIFEST_FILE: &str = "manifest.json";
const MANIFEST_VERSION: &str = "1.0";

#[derive(Clone, Default)]
pub struct InMemoryApproachRepository {
    approaches: Arc<RwLock<BTreeMap<String, ApproachPattern>>>,
}

impl InMemoryApproachRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ApproachRepository for InMemoryApproachRepository {
    async fn save(&self, approach: &ApproachPattern) -> Result<(), RepositoryError> {
        self.approaches
            .write()
            .insert(approach.id.clone(), approach.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<ApproachPattern>, RepositoryError> {
        Ok(self.approaches.read().get(id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<ApproachPattern>, RepositoryError> {
        Ok(self.approaches.read().values().cloned().collect())
    }
}

/// One line of the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub id: String,
    pub name: String,
    pub file: String,
    pub active: bool,
    pub usage_count: u64,
    pub avg_quality: f64,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApproachManifest {
    pub version: String,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub total_approaches: usize,
    pub active_approaches: usize,
    pub inactive_approaches: usize,
    pub approaches: Vec<ManifestEntry>,
}

impl Default for ApproachManifest {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            version: MANIFEST_VERSION.to_string(),
            created_at: now,
            last_updated: now,
            total_approaches: 0,
            active_approaches: 0,
            inactive_approaches: 0,
            approaches: Vec::new(),
        }
    }
}

impl ManifestEntry {
    fn new(approach: &ApproachPattern, file: String) -> Self {
        Self {
            id: approach.id.clone(),
            name: approach.name.clone(),
            file,
            active: approach.is_active(),
            usage_count: approach.metrics.usage_count,
            avg_quality: approach.metrics.avg_quality,
            last_updated: approach.last_updated,
        }
    }
}

impl ApproachManifest {
    fn upsert(&mut self, entry: ManifestEntry) {
        match self.approaches.iter_mut().find(|e| e.id == entry.id) {
            Some(existing) => *existing = entry,
            None => self.approaches.push(entry),
        }
        self.total_approaches = self.approaches.len();
        self.active_approaches = self.approaches.iter().filter(|e| e.active).count();
        self.inactive_approaches = self.total_approaches - self.active_approaches;
        self.last_updated = Utc::now();
    }
}

pub struct FileApproachRepository {
    dir: PathBuf,
    sanitizer: Arc<dyn IdentifierSanitizer>,
    manifest: Mutex<Option<ApproachManifest>>,
}

impl FileApproachRepository {
    pub fn new(dir: impl Into<PathBuf>, sanitizer: Arc<dyn IdentifierSanitizer>) -> Self {
        Self {
            dir: dir.into(),
            sanitizer,
            manifest: Mutex::new(None),
        }
    }

    fn file_name(&self, id: &str) -> Result<String, RepositoryError> {
        document_file_name(self.sanitizer.as_ref(), id)
    }

    /// Current manifest; a fresh one when none was written yet.
    pub async fn manifest(&self) -> Result<ApproachManifest, RepositoryError> {
        let mut guard = self.manifest.lock().await;
        if guard.is_none() {
            *guard = Some(self.load_manifest().await?);
        }
        Ok(guard.clone().unwrap_or_default())
    }

    async fn load_manifest(&self) -> Result<ApproachManifest, RepositoryError> {
        let path = self.dir.join(MANIFEST_FILE);
        match read_json(&path).await {
            Ok(manifest) => Ok(manifest.unwrap_or_default()),
            Err(RepositoryError::Serialization(e)) => {
                warn!(path = %path.display(), error = %e, "Corrupt approach manifest, rebuilding from documents");
                let manifest = self.rebuild_manifest().await?;
                write_json_atomic(&path, &manifest).await?;
                Ok(manifest)
            }
            Err(e) => Err(e),
        }
    }

    async fn rebuild_manifest(&self) -> Result<ApproachManifest, RepositoryError> {
        let approaches: Vec<ApproachPattern> = load_json_dir(&self.dir, &[MANIFEST_FILE]).await?;
        let mut manifest = ApproachManifest::default();
        for approach in &approaches {
            let file = self.file_name(&approach.id)?;
            manifest.upsert(ManifestEntry::new(approach, file));
        }
        Ok(manifest)
    }
}

#[async_trait]
impl ApproachRepository for FileApproachRepository {
    async fn save(&self, approach: &ApproachPattern) -> Result<(), RepositoryError> {
        let file = self.file_name(&approach.id)?;
        let mut guard = self.manifest.lock().await;

        write_json_atomic(&self.dir.join(&file), approach).await?;

        let mut manifest = match guard.take() {
            Some(m) => m,
            None => self.load_manifest().await?,
        };
        manifest.upsert(ManifestEntry::new(approach, file));
        let written = write_json_atomic(&self.dir.join(MANIFEST_FILE), &manifest).await;
        *guard = Some(manifest);
        written?;
        debug!(approach_id = %approach.id, "Saved approach");
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<ApproachPattern>, RepositoryError> {
        let file = self.file_name(id)?;
        read_json(&self.dir.join(file)).await
    }

    async fn list_all(&self) -> Result<Vec<ApproachPattern>, RepositoryError> {
        load_json_dir(&self.dir, &[MANIFEST_FILE]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ApproachStatus, PatternSignature, StyleCharacteristics};
    use hybrid_swarm_core::{StrictIdentifierSanitizer, WeightMap};

    fn approach(id: &str) -> ApproachPattern {
        ApproachPattern::new(
            id,
            format!("Approach {id}"),
            PatternSignature {
                domain_weights: [("writing", 1.0)].into_iter().collect(),
                complexity_min: 0.2,
                complexity_max: 0.6,
                keyword_patterns: vec![],
                keyword_weights: WeightMap::new(),
                output_types: vec!["summary".into()],
                requires_code: false,
                requires_examples: false,
                requires_theory: false,
            },
            StyleCharacteristics::default(),
        )
    }

    #[tokio::test]
    async fn test_file_repository_writes_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let repo =
            FileApproachRepository::new(dir.path(), Arc::new(StrictIdentifierSanitizer::new()));

        repo.save(&approach("approach_a")).await.unwrap();
        let mut b = approach("approach_b");
        repo.save(&b).await.unwrap();
        b.status = ApproachStatus::Inactive {
            deactivated_at: Utc::now(),
            reason: "test".into(),
        };
        repo.save(&b).await.unwrap();

        let manifest: ApproachManifest = read_json(&dir.path().join(MANIFEST_FILE))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(manifest.total_approaches, 2);
        assert_eq!(manifest.active_approaches, 1);
        assert_eq!(manifest.inactive_approaches, 1);
        assert!(manifest.approaches[0].file.starts_with("approach_a_"));

        let all = repo.list_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(!repo.find_by_id("approach_b").await.unwrap().unwrap().is_active());
    }

    #[tokio::test]
    async fn test_file_repository_reopens_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let sanitizer = Arc::new(StrictIdentifierSanitizer::new());
        FileApproachRepository::new(dir.path(), sanitizer.clone())
            .save(&approach("approach_a"))
            .await
            .unwrap();

        let reopened = FileApproachRepository::new(dir.path(), sanitizer);
        reopened.save(&approach("approach_b")).await.unwrap();
        assert_eq!(reopened.manifest().await.unwrap().total_approaches, 2);
    }

    #[tokio::test]
    async fn test_corrupt_manifest_is_rebuilt_on_save() {
        let dir = tempfile::tempdir().unwrap();
        let sanitizer = Arc::new(StrictIdentifierSanitizer::new());
        {
            let repo = FileApproachRepository::new(dir.path(), sanitizer.clone());
            repo.save(&approach("approach_a")).await.unwrap();
            repo.save(&approach("approach_b")).await.unwrap();
        }
        tokio::fs::write(dir.path().join(MANIFEST_FILE), "{\"version\": ").await.unwrap();

        let repo = FileApproachRepository::new(dir.path(), sanitizer.clone());
        repo.save(&approach("approach_c")).await.unwrap();

        let manifest = repo.manifest().await.unwrap();
        let mut ids: Vec<&str> = manifest.approaches.iter().map(|e| e.id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["approach_a", "approach_b", "approach_c"]);
        assert_eq!(manifest.total_approaches, 3);

        let on_disk: ApproachManifest = read_json(&dir.path().join(MANIFEST_FILE))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(on_disk.total_approaches, 3);
    }

    #[tokio::test]
    async fn test_ids_that_sanitize_alike_keep_separate_documents() {
        let dir = tempfile::tempdir().unwrap();
        let repo =
            FileApproachRepository::new(dir.path(), Arc::new(StrictIdentifierSanitizer::new()));
        repo.save(&approach("approach.x")).await.unwrap();
        repo.save(&approach("approachx")).await.unwrap();

        assert_eq!(repo.list_all().await.unwrap().len(), 2);
        assert_eq!(
            repo.find_by_id("approach.x").await.unwrap().unwrap().id,
            "approach.x"
        );
        assert_eq!(repo.manifest().await.unwrap().total_approaches, 2);
    }

    #[tokio::test]
    async fn test_in_memory_repository_replaces() {
        let repo = InMemoryApproachRepository::new();
        let mut a = approach("approach_a");
        repo.save(&a).await.unwrap();
        a.version = 2;
        repo.save(&a).await.unwrap();
        assert_eq!(repo.list_all().await.unwrap().len(), 1);
        assert_eq!(repo.find_by_id("approach_a").await.unwrap().unwrap().version, 2);
    }
}
