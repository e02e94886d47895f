// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Approach Catalog - lifecycle and matching of approach patterns
//!
//! Loaded approaches are cached in memory. Reads take the cache lock only
//! long enough to clone; writes are serialized by an async lock, persisted
//! first, and only then published to the cache.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Create/get/update/soft-delete, task matching, execution recording

use chrono::Utc;
use hybrid_swarm_core::{RepositoryError, TaskDescriptor};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::legacy::legacy_approaches;
use crate::domain::{
    match_score, ApproachPattern, ApproachPerformance, ApproachRepository, ApproachStatus,
    ApproachValidationError,
};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Approach already exists: {0}")]
    AlreadyExists(String),

    #[error("Approach not found: {0}")]
    NotFound(String),

    #[error("Invalid approach {id}: {source}")]
    Invalid {
        id: String,
        #[source]
        source: ApproachValidationError,
    },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Aggregate view of the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogStatistics {
    pub total_approaches: usize,
    pub active_approaches: usize,
    pub inactive_approaches: usize,
    pub approaches_with_usage: usize,
    pub total_usage: u64,
    /// Mean average quality over approaches that have been used
    pub avg_quality: f64,
}

pub struct ApproachCatalog {
    repository: Arc<dyn ApproachRepository>,
    cache: RwLock<BTreeMap<String, ApproachPattern>>,
    write_lock: Mutex<()>,
}

impl ApproachCatalog {
    pub fn new(repository: Arc<dyn ApproachRepository>) -> Self {
        Self {
            repository,
            cache: RwLock::new(BTreeMap::new()),
            write_lock: Mutex::new(()),
        }
    }

    /// Catalog populated from `repository`.
    pub async fn load(repository: Arc<dyn ApproachRepository>) -> Result<Self, RepositoryError> {
        let stored = repository.list_all().await?;
        info!(count = stored.len(), "Loaded approaches");
        let catalog = Self::new(repository);
        {
            let mut cache = catalog.cache.write();
            for approach in stored {
                cache.insert(approach.id.clone(), approach);
            }
        }
        Ok(catalog)
    }

    fn validate(approach: &ApproachPattern) -> Result<(), CatalogError> {
        approach.validate().map_err(|source| CatalogError::Invalid {
            id: approach.id.clone(),
            source,
        })
    }

    async fn persist(&self, approach: ApproachPattern) -> Result<(), CatalogError> {
        self.repository.save(&approach).await?;
        self.cache.write().insert(approach.id.clone(), approach);
        Ok(())
    }

    /// Register a new approach. Ids are unique: an existing id is an error.
    pub async fn create(&self, approach: ApproachPattern) -> Result<(), CatalogError> {
        Self::validate(&approach)?;
        let _guard = self.write_lock.lock().await;
        if self.cache.read().contains_key(&approach.id) {
            return Err(CatalogError::AlreadyExists(approach.id));
        }
        info!(approach_id = %approach.id, name = %approach.name, "Created approach");
        self.persist(approach).await
    }

    pub fn get(&self, id: &str) -> Option<ApproachPattern> {
        self.cache.read().get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.cache.read().contains_key(id)
    }

    /// Replace a stored approach.
    pub async fn update(&self, approach: ApproachPattern) -> Result<(), CatalogError> {
        Self::validate(&approach)?;
        let _guard = self.write_lock.lock().await;
        if !self.cache.read().contains_key(&approach.id) {
            return Err(CatalogError::NotFound(approach.id));
        }
        self.persist(approach).await
    }

    /// Soft-delete. Returns `false` when the approach was already inactive.
    pub async fn deactivate(&self, id: &str, reason: &str) -> Result<bool, CatalogError> {
        let _guard = self.write_lock.lock().await;
        let mut approach = self
            .get(id)
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;
        if !approach.is_active() {
            return Ok(false);
        }
        let now = Utc::now();
        approach.status = ApproachStatus::Inactive {
            deactivated_at: now,
            reason: reason.to_string(),
        };
        approach.last_updated = now;
        self.persist(approach).await?;
        info!(approach_id = %id, reason, "Deactivated approach");
        Ok(true)
    }

    /// Approaches in id order.
    pub fn list(&self, active_only: bool, min_quality: f64) -> Vec<ApproachPattern> {
        self.cache
            .read()
            .values()
            .filter(|a| !active_only || a.is_active())
            .filter(|a| a.metrics.avg_quality >= min_quality)
            .cloned()
            .collect()
    }

    /// Active approaches scoring at least `threshold`, best first, at most
    /// `limit`. Equal scores keep id order.
    pub fn match_approaches(
        &self,
        task: &TaskDescriptor,
        threshold: f64,
        limit: usize,
    ) -> Vec<(ApproachPattern, f64)> {
        let mut candidates: Vec<(ApproachPattern, f64)> = self
            .list(true, 0.0)
            .into_iter()
            .filter_map(|a| {
                let score = match_score(task, &a.signature);
                (score >= threshold).then_some((a, score))
            })
            .collect();
        candidates.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.id.cmp(&b.0.id)));
        candidates.truncate(limit);
        debug!(task_id = %task.id, matches = candidates.len(), "Matched approaches");
        candidates
    }

    /// Fold an execution into the approach's metrics.
    ///
    /// Unknown ids are logged and reported as `false`. Only the usage
    /// timestamps move; `last_updated` tracks definition changes.
    pub async fn record_execution(
        &self,
        id: &str,
        quality: f64,
        success: bool,
    ) -> Result<bool, CatalogError> {
        let _guard = self.write_lock.lock().await;
        let Some(mut approach) = self.get(id) else {
            warn!(approach_id = %id, "Execution recorded for unknown approach");
            return Ok(false);
        };
        approach.metrics.record(quality, success, Utc::now());
        self.persist(approach).await?;
        Ok(true)
    }

    pub fn statistics(&self) -> CatalogStatistics {
        let cache = self.cache.read();
        let total = cache.len();
        let active = cache.values().filter(|a| a.is_active()).count();
        let used: Vec<&ApproachPattern> =
            cache.values().filter(|a| a.metrics.usage_count > 0).collect();
        let avg_quality = if used.is_empty() {
            0.0
        } else {
            used.iter().map(|a| a.metrics.avg_quality).sum::<f64>() / used.len() as f64
        };
        CatalogStatistics {
            total_approaches: total,
            active_approaches: active,
            inactive_approaches: total - active,
            approaches_with_usage: used.len(),
            total_usage: cache.values().map(|a| a.metrics.usage_count).sum(),
            avg_quality,
        }
    }

    pub fn performance(&self, id: &str) -> Option<ApproachPerformance> {
        self.cache.read().get(id).map(ApproachPattern::performance)
    }

    /// Insert the built-in approaches that are not present yet.
    /// Returns how many were added.
    pub async fn seed_legacy_approaches(&self) -> Result<usize, CatalogError> {
        let mut added = 0;
        for approach in legacy_approaches() {
            if self.contains(&approach.id) {
                continue;
            }
            match self.create(approach).await {
                Ok(()) => added += 1,
                Err(CatalogError::AlreadyExists(_)) => {}
                Err(e) => return Err(e),
            }
        }
        if added > 0 {
            info!(added, "Seeded legacy approaches");
        }
        Ok(added)
    }

    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }
}
