// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Specialist Registry - adaptive resonance matching
//!
//! Routes each task to the specialist whose accumulated experience resonates
//! with it most strongly. When nothing reaches the vigilance threshold a new
//! specialist is registered and, if the registry is over capacity, the
//! weakest specialists are removed.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Match-or-create, outcome recording and capacity pruning for specialists

use chrono::Utc;
use hybrid_swarm_core::domain::config::ResonanceConfig;
use hybrid_swarm_core::domain::similarity::stable_hash_hex;
use hybrid_swarm_core::infrastructure::EventBus;
use hybrid_swarm_core::{CoordinationEvent, RepositoryError, TaskDescriptor};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::domain::{SpecialistProfile, SpecialistRepository, SpecialistStats, TaskSignature};

/// Outcome of [`SpecialistRegistry::match_or_create`].
#[derive(Debug, Clone, PartialEq)]
pub struct SpecialistMatch {
    pub specialist_id: String,
    /// Resonance of the chosen specialist; for a new specialist, the best
    /// resonance any existing specialist reached
    pub resonance: f64,
    pub created: bool,
    /// Specialists removed by capacity pruning during this call
    pub pruned: Vec<String>,
}

pub struct SpecialistRegistry {
    config: ResonanceConfig,
    repository: Arc<dyn SpecialistRepository>,
    event_bus: EventBus,
    specialists: Mutex<BTreeMap<String, SpecialistProfile>>,
}

impl SpecialistRegistry {
    /// Empty registry.
    pub fn new(
        config: ResonanceConfig,
        repository: Arc<dyn SpecialistRepository>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            config,
            repository,
            event_bus,
            specialists: Mutex::new(BTreeMap::new()),
        }
    }

    /// Registry populated from `repository`.
    pub async fn load(
        config: ResonanceConfig,
        repository: Arc<dyn SpecialistRepository>,
        event_bus: EventBus,
    ) -> Result<Self, RepositoryError> {
        let profiles = repository.list_all().await?;
        info!(count = profiles.len(), "Loaded specialist profiles");
        let registry = Self::new(config, repository, event_bus);
        {
            let mut specialists = registry.specialists.lock().await;
            for profile in profiles {
                specialists.insert(profile.id.clone(), profile);
            }
        }
        Ok(registry)
    }

    pub fn extract_signature(task: &TaskDescriptor) -> TaskSignature {
        TaskSignature::from_task(task)
    }

    /// Resonance of one specialist with `task`; `None` for an unknown id.
    pub async fn resonance(&self, specialist_id: &str, task: &TaskDescriptor) -> Option<f64> {
        let signature = Self::extract_signature(task);
        let specialists = self.specialists.lock().await;
        specialists.get(specialist_id).map(|p| p.resonance(&signature))
    }

    /// Reuse the best-resonating specialist or register a new one.
    pub async fn match_or_create(
        &self,
        task: &TaskDescriptor,
    ) -> Result<SpecialistMatch, RepositoryError> {
        let signature = Self::extract_signature(task);
        let mut specialists = self.specialists.lock().await;

        // BTreeMap iteration is ordered by id; the first strictly-better wins.
        let mut best: Option<&str> = None;
        let mut best_resonance = 0.0;
        for (id, profile) in specialists.iter() {
            let resonance = profile.resonance(&signature);
            if resonance > best_resonance {
                best = Some(id.as_str());
                best_resonance = resonance;
            }
        }

        debug!(
            task_id = %task.id,
            best = ?best,
            resonance = best_resonance,
            vigilance = self.config.vigilance_threshold,
            "Specialist resonance evaluated"
        );

        if let Some(id) = best.map(str::to_string) {
            if best_resonance >= self.config.vigilance_threshold {
                if let Some(profile) = specialists.get_mut(&id) {
                    profile.absorb(signature, self.config.window_size);
                    self.repository.save(profile).await?;
                }
                self.event_bus.publish(CoordinationEvent::SpecialistMatched {
                    specialist_id: id.clone(),
                    resonance: best_resonance,
                    timestamp: Utc::now(),
                });
                return Ok(SpecialistMatch {
                    specialist_id: id,
                    resonance: best_resonance,
                    created: false,
                    pruned: Vec::new(),
                });
            }
        }

        let id = derive_specialist_id(&signature, |candidate| specialists.contains_key(candidate));
        let domain = signature.domain.clone();
        let profile = SpecialistProfile::new(id.clone(), signature);
        self.repository.save(&profile).await?;
        specialists.insert(id.clone(), profile);
        metrics::counter!("hybrid_swarm_specialists_created_total").increment(1);
        info!(specialist_id = %id, domain = %domain, "Created specialist");

        self.event_bus.publish(CoordinationEvent::SpecialistCreated {
            specialist_id: id.clone(),
            domain,
            timestamp: Utc::now(),
        });

        let pruned = self.prune_locked(&mut specialists, &id).await?;

        Ok(SpecialistMatch {
            specialist_id: id,
            resonance: best_resonance,
            created: true,
            pruned,
        })
    }

    /// Remove the lowest `quality * success_rate` specialists until the
    /// registry is within capacity. `keep` is never removed.
    async fn prune_locked(
        &self,
        specialists: &mut BTreeMap<String, SpecialistProfile>,
        keep: &str,
    ) -> Result<Vec<String>, RepositoryError> {
        let excess = specialists.len().saturating_sub(self.config.max_specialists);
        if excess == 0 {
            return Ok(Vec::new());
        }

        let mut ranked: Vec<&SpecialistProfile> =
            specialists.values().filter(|p| p.id != keep).collect();
        ranked.sort_by(|a, b| {
            a.retention_score()
                .total_cmp(&b.retention_score())
                .then_with(|| a.last_used.cmp(&b.last_used))
                .then_with(|| a.id.cmp(&b.id))
        });
        let doomed: Vec<String> = ranked.iter().take(excess).map(|p| p.id.clone()).collect();

        for id in &doomed {
            specialists.remove(id);
            self.repository.delete(id).await?;
        }

        if !doomed.is_empty() {
            info!(removed = doomed.len(), "Pruned specialists over capacity");
            self.event_bus.publish(CoordinationEvent::SpecialistsPruned {
                specialist_ids: doomed.clone(),
                timestamp: Utc::now(),
            });
        }
        Ok(doomed)
    }

    /// Record an outcome. Returns `false` (and logs) for an unknown id.
    pub async fn record_execution(
        &self,
        specialist_id: &str,
        success: bool,
        quality: f64,
    ) -> Result<bool, RepositoryError> {
        let mut specialists = self.specialists.lock().await;
        let Some(profile) = specialists.get_mut(specialist_id) else {
            warn!(specialist_id = %specialist_id, "Execution recorded for unknown specialist");
            return Ok(false);
        };
        profile.record_execution(success, quality, self.config.learning_rate);
        self.repository.save(profile).await?;
        Ok(true)
    }

    pub async fn get(&self, specialist_id: &str) -> Option<SpecialistProfile> {
        self.specialists.lock().await.get(specialist_id).cloned()
    }

    pub async fn list(&self) -> Vec<SpecialistProfile> {
        self.specialists.lock().await.values().cloned().collect()
    }

    pub async fn stats(&self) -> Vec<SpecialistStats> {
        self.specialists
            .lock()
            .await
            .values()
            .map(SpecialistProfile::stats)
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.specialists.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// `specialist_<8 hex of sha256(domain_input_output)>`, suffixed `_1`, `_2`, …
/// while `taken` reports a collision.
fn derive_specialist_id(signature: &TaskSignature, taken: impl Fn(&str) -> bool) -> String {
    let key = format!(
        "{}_{}_{}",
        signature.domain, signature.input_type, signature.output_type
    );
    let digest = stable_hash_hex(&key);
    let base = format!("specialist_{}", &digest[..8]);
    if !taken(&base) {
        return base;
    }
    let mut n = 1;
    loop {
        let candidate = format!("{base}_{n}");
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
