// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Approach Evolver - creation, evolution and pruning of approaches
//!
//! - **Create**: a novel discovered cluster becomes a new version-1 approach.
//! - **Evolve**: an approach whose recent executions clearly beat its
//!   average spawns a refined child `{id}_v{n}`. The parent stays as is.
//! - **Prune**: approaches without traction, with poor results, or
//!   superseded by a similar and clearly better approach are soft-deleted.
//!
//! Unmet criteria are `None` or an empty list, never errors.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Lifecycle decisions over the approach catalog

use chrono::{Duration, Utc};
use hybrid_swarm_core::domain::config::{EvolutionConfig, PruningConfig};
use hybrid_swarm_core::infrastructure::EventBus;
use hybrid_swarm_core::{CoordinationEvent, WeightMap};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::catalog::{ApproachCatalog, CatalogError};
use super::miner::is_novel;
use crate::domain::{
    ApproachPattern, ApproachStatus, ExecutionRecord, PatternCluster, PatternSignature,
    PerformanceMetrics, StyleCharacteristics,
};

/// Weight kept by existing domain weights when refining a signature.
const DOMAIN_RETENTION: f64 = 0.8;
/// Domains above this weight become tags.
const TAG_DOMAIN_WEIGHT: f64 = 0.3;

/// Why an approach was selected for pruning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PruneReason {
    NoTraction { usage_count: u64, age_days: i64 },
    LowQuality { avg_quality: f64, threshold: f64 },
    LowSuccessRate { success_rate: f64, threshold: f64 },
    Superseded { by: String },
}

impl fmt::Display for PruneReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PruneReason::NoTraction {
                usage_count,
                age_days,
            } => write!(f, "no traction ({usage_count} uses in {age_days} days)"),
            PruneReason::LowQuality {
                avg_quality,
                threshold,
            } => write!(f, "low quality ({avg_quality:.2} < {threshold})"),
            PruneReason::LowSuccessRate {
                success_rate,
                threshold,
            } => write!(
                f,
                "low success rate ({:.1}% < {:.1}%)",
                success_rate * 100.0,
                threshold * 100.0
            ),
            PruneReason::Superseded { by } => write!(f, "superseded by {by}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PruneCandidate {
    pub approach_id: String,
    pub name: String,
    pub reason: PruneReason,
}

pub struct ApproachEvolver {
    catalog: Arc<ApproachCatalog>,
    event_bus: EventBus,
    evolution: EvolutionConfig,
    novelty_threshold: f64,
}

impl ApproachEvolver {
    pub fn new(
        catalog: Arc<ApproachCatalog>,
        event_bus: EventBus,
        evolution: EvolutionConfig,
        novelty_threshold: f64,
    ) -> Self {
        Self {
            catalog,
            event_bus,
            evolution,
            novelty_threshold,
        }
    }

    /// Turn a discovered cluster into a new approach.
    ///
    /// `None` when the signature is too close to an active approach or the
    /// assembled approach fails validation.
    pub async fn create_from_cluster(
        &self,
        cluster: &PatternCluster,
        signature: PatternSignature,
        style: StyleCharacteristics,
    ) -> Result<Option<ApproachPattern>, CatalogError> {
        let active = self.catalog.list(true, 0.0);
        if !is_novel(&signature, &active, self.novelty_threshold) {
            debug!(cluster_id = %cluster.cluster_id, "Cluster is not novel, skipping");
            return Ok(None);
        }

        let base_id = approach_id(&signature, &style);
        let mut id = base_id.clone();
        let mut suffix = 1;
        while self.catalog.contains(&id) {
            id = format!("{base_id}_{suffix}");
            suffix += 1;
        }

        let name = approach_name(&signature, &style);
        let tags = approach_tags(&signature, &style);
        let mut approach = ApproachPattern::new(id, name, signature, style);
        approach.tags = tags;
        approach.metrics = PerformanceMetrics::with_expected_quality(cluster.avg_quality);

        if let Err(e) = approach.validate() {
            warn!(cluster_id = %cluster.cluster_id, error = %e, "Generated approach is invalid");
            return Ok(None);
        }

        self.catalog.create(approach.clone()).await?;
        metrics::counter!("hybrid_swarm_approaches_created_total").increment(1);
        self.event_bus.publish(CoordinationEvent::ApproachCreated {
            approach_id: approach.id.clone(),
            cluster_id: cluster.cluster_id.clone(),
            timestamp: Utc::now(),
        });
        info!(
            approach_id = %approach.id,
            cluster_id = %cluster.cluster_id,
            records = cluster.size(),
            "Created approach from cluster"
        );
        Ok(Some(approach))
    }

    /// Evolve with the configured thresholds.
    pub async fn evolve(
        &self,
        approach_id: &str,
        recent: &[ExecutionRecord],
    ) -> Result<Option<ApproachPattern>, CatalogError> {
        self.evolve_with(
            approach_id,
            recent,
            self.evolution.min_executions,
            self.evolution.min_quality_improvement,
        )
        .await
    }

    /// Create a refined child of `approach_id` when, in order: there are at
    /// least `min_executions` recent executions, their average beats the
    /// approach average by more than `min_quality_improvement`, and the
    /// approach was last updated long enough ago.
    pub async fn evolve_with(
        &self,
        approach_id: &str,
        recent: &[ExecutionRecord],
        min_executions: usize,
        min_quality_improvement: f64,
    ) -> Result<Option<ApproachPattern>, CatalogError> {
        let Some(parent) = self.catalog.get(approach_id) else {
            warn!(approach_id, "Cannot evolve unknown approach");
            return Ok(None);
        };

        if recent.len() < min_executions {
            debug!(approach_id, executions = recent.len(), min_executions, "Not enough executions to evolve");
            return Ok(None);
        }

        let recent_avg = recent.iter().map(|r| r.actual_quality).sum::<f64>() / recent.len() as f64;
        if recent_avg <= parent.metrics.avg_quality + min_quality_improvement {
            debug!(
                approach_id,
                recent_avg,
                avg_quality = parent.metrics.avg_quality,
                "Quality did not improve enough to evolve"
            );
            return Ok(None);
        }

        let now = Utc::now();
        if now - parent.last_updated < Duration::days(self.evolution.min_days_between_updates) {
            debug!(approach_id, "Approach updated too recently to evolve");
            return Ok(None);
        }

        let high_quality: Vec<&ExecutionRecord> = recent
            .iter()
            .filter(|r| r.actual_quality >= self.evolution.high_quality_threshold)
            .collect();

        let mut child = parent.clone();
        child.version = parent.version + 1;
        child.generation = parent.generation + 1;
        child.id = format!("{}_v{}", parent.id, child.version);
        child.parent_id = Some(parent.id.clone());
        child.created_at = now;
        child.last_updated = now;
        child.status = ApproachStatus::Active;
        child.metrics.avg_quality = recent_avg;
        if !high_quality.is_empty() {
            refine_signature(&mut child.signature, &high_quality);
            refine_style(&mut child.style, &high_quality);
        }

        match self.catalog.create(child.clone()).await {
            Ok(()) => {}
            Err(CatalogError::AlreadyExists(id)) => {
                warn!(approach_id = %id, "Evolved approach already exists");
                return Ok(None);
            }
            Err(e) => return Err(e),
        }

        metrics::counter!("hybrid_swarm_approaches_evolved_total").increment(1);
        self.event_bus.publish(CoordinationEvent::ApproachEvolved {
            parent_id: parent.id.clone(),
            approach_id: child.id.clone(),
            generation: child.generation,
            timestamp: now,
        });
        info!(
            parent_id = %parent.id,
            approach_id = %child.id,
            recent_avg,
            "Evolved approach"
        );
        Ok(Some(child))
    }

    /// Select underperforming active approaches; when `dry_run` is false
    /// each one is soft-deleted.
    pub async fn prune(
        &self,
        criteria: &PruningConfig,
        dry_run: bool,
    ) -> Result<Vec<PruneCandidate>, CatalogError> {
        let active = self.catalog.list(true, 0.0);
        let now = Utc::now();

        let mut candidates = Vec::new();
        for approach in &active {
            if let Some(reason) = prune_reason(approach, &active, criteria, now) {
                candidates.push(PruneCandidate {
                    approach_id: approach.id.clone(),
                    name: approach.name.clone(),
                    reason,
                });
            }
        }

        for candidate in &candidates {
            if dry_run {
                info!(approach_id = %candidate.approach_id, reason = %candidate.reason, "Would prune approach");
                continue;
            }
            let reason = candidate.reason.to_string();
            if self.catalog.deactivate(&candidate.approach_id, &reason).await? {
                metrics::counter!("hybrid_swarm_approaches_pruned_total").increment(1);
                self.event_bus.publish(CoordinationEvent::ApproachPruned {
                    approach_id: candidate.approach_id.clone(),
                    reason: reason.clone(),
                    timestamp: Utc::now(),
                });
                info!(approach_id = %candidate.approach_id, reason = %reason, "Pruned approach");
            }
        }
        Ok(candidates)
    }
}

fn prune_reason(
    approach: &ApproachPattern,
    active: &[ApproachPattern],
    criteria: &PruningConfig,
    now: chrono::DateTime<Utc>,
) -> Option<PruneReason> {
    let metrics = &approach.metrics;
    let age_days = (now - approach.created_at).num_days();

    if age_days > criteria.max_age_no_traction_days && metrics.usage_count < criteria.traction_usage {
        return Some(PruneReason::NoTraction {
            usage_count: metrics.usage_count,
            age_days,
        });
    }
    if metrics.usage_count < criteria.min_usage_for_evaluation {
        return None;
    }
    if metrics.avg_quality < criteria.min_quality_threshold {
        return Some(PruneReason::LowQuality {
            avg_quality: metrics.avg_quality,
            threshold: criteria.min_quality_threshold,
        });
    }
    if metrics.success_rate < criteria.min_success_rate {
        return Some(PruneReason::LowSuccessRate {
            success_rate: metrics.success_rate,
            threshold: criteria.min_success_rate,
        });
    }

    active
        .iter()
        .filter(|other| other.id != approach.id)
        .filter(|other| other.metrics.usage_count >= criteria.min_usage_for_evaluation)
        .filter(|other| approach.signature.similarity(&other.signature) >= criteria.supersede_similarity)
        .find(|other| {
            other.metrics.avg_quality - metrics.avg_quality > criteria.supersede_quality_margin
                && other.metrics.usage_count.saturating_sub(metrics.usage_count)
                    > criteria.supersede_usage_margin
        })
        .map(|other| PruneReason::Superseded {
            by: other.name.clone(),
        })
}

fn refine_signature(signature: &mut PatternSignature, executions: &[&ExecutionRecord]) {
    let mut observed = WeightMap::new();
    for record in executions {
        for (domain, weight) in record.task.domain_weights.iter() {
            observed.accumulate(domain, weight * record.actual_quality);
        }
    }
    if observed.total() > 0.0 {
        signature.domain_weights = signature
            .domain_weights
            .blend_existing(&observed.normalized(), DOMAIN_RETENTION);
    }

    for record in executions {
        signature.complexity_min = signature.complexity_min.min(record.task.complexity);
        signature.complexity_max = signature.complexity_max.max(record.task.complexity);
    }
}

fn refine_style(style: &mut StyleCharacteristics, executions: &[&ExecutionRecord]) {
    for features in executions.iter().filter_map(|r| r.content_features.as_ref()) {
        style.section_count.0 = style.section_count.0.min(features.section_count);
        style.section_count.1 = style.section_count.1.max(features.section_count);
    }
}

fn clean(label: &str) -> String {
    label
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// `approach_<domain>_<keyword>_<structure>`, lowercase alphanumerics only.
pub fn approach_id(signature: &PatternSignature, style: &StyleCharacteristics) -> String {
    let keyword = signature
        .keyword_patterns
        .first()
        .map(String::as_str)
        .unwrap_or("content");
    format!(
        "approach_{}_{}_{}",
        clean(signature.primary_domain()),
        clean(keyword),
        clean(style.structure_type.as_str())
    )
}

/// `<Tone> <Structure> <Output> (<Domain>)`
pub fn approach_name(signature: &PatternSignature, style: &StyleCharacteristics) -> String {
    let output = signature
        .output_types
        .first()
        .map(|o| capitalize(o))
        .unwrap_or_else(|| "Content".to_string());
    format!(
        "{} {} {} ({})",
        capitalize(&style.tone),
        style.structure_type.display_name(),
        output,
        capitalize(signature.primary_domain())
    )
}

pub fn approach_tags(signature: &PatternSignature, style: &StyleCharacteristics) -> Vec<String> {
    let mut tags: Vec<String> = signature
        .domain_weights
        .top(2)
        .into_iter()
        .filter(|(_, w)| *w > TAG_DOMAIN_WEIGHT)
        .map(|(d, _)| d)
        .collect();
    tags.push(style.tone.clone());
    tags.push(style.structure_type.as_str().to_string());
    if signature.requires_code {
        tags.push("code".to_string());
    }
    if signature.requires_examples {
        tags.push("examples".to_string());
    }
    if signature.requires_theory {
        tags.push("theory".to_string());
    }
    tags.push(style.depth_level.as_str().to_string());
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::legacy::{legacy_approaches, LEGACY_TUTORIAL_ID};
    use crate::application::miner::tests::tutorial_record;
    use crate::application::miner::{cluster, extract_signature, extract_style};
    use crate::infrastructure::InMemoryApproachRepository;

    fn evolver() -> (ApproachEvolver, Arc<ApproachCatalog>, EventBus) {
        let catalog = Arc::new(ApproachCatalog::new(Arc::new(InMemoryApproachRepository::new())));
        let bus = EventBus::new(64);
        let evolver = ApproachEvolver::new(catalog.clone(), bus.clone(), EvolutionConfig::default(), 0.85);
        (evolver, catalog, bus)
    }

    fn tutorial_cluster() -> PatternCluster {
        let records: Vec<ExecutionRecord> = (0..10).map(|n| tutorial_record(n, 0.9)).collect();
        cluster(records, 0.65, 10).remove(0)
    }

    fn aged(mut approach: ApproachPattern, days: i64) -> ApproachPattern {
        approach.created_at = Utc::now() - Duration::days(days);
        approach.last_updated = approach.created_at;
        approach
    }

    #[test]
    fn test_generated_id_name_tags() {
        let c = tutorial_cluster();
        let sig = extract_signature(&c);
        let style = extract_style(&c);
        assert_eq!(approach_id(&sig, &style), "approach_coding_python_sequentialsteps");
        assert_eq!(
            approach_name(&sig, &style),
            "Educational Step-by-Step Tutorial (Coding)"
        );
        assert_eq!(
            approach_tags(&sig, &style),
            vec!["coding", "writing", "educational", "sequential_steps", "code", "examples", "moderate"]
        );
    }

    #[tokio::test]
    async fn test_create_from_cluster_then_reject_duplicate() {
        let (evolver, catalog, bus) = evolver();
        let mut rx = bus.subscribe();
        let c = tutorial_cluster();

        let created = evolver
            .create_from_cluster(&c, extract_signature(&c), extract_style(&c))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(created.version, 1);
        assert_eq!(created.generation, 0);
        assert!((created.metrics.avg_quality - 0.9).abs() < 1e-9);
        assert!(catalog.get(&created.id).is_some());
        assert!(matches!(
            rx.recv().await.unwrap(),
            CoordinationEvent::ApproachCreated { .. }
        ));

        let again = evolver
            .create_from_cluster(&c, extract_signature(&c), extract_style(&c))
            .await
            .unwrap();
        assert!(again.is_none());
        assert_eq!(catalog.len(), 1);
    }

    #[tokio::test]
    async fn test_id_collision_gets_suffix() {
        let (evolver, catalog, _) = evolver();
        let c = tutorial_cluster();
        let sig = extract_signature(&c);
        let style = extract_style(&c);
        // Same id, dissimilar signature, and inactive so novelty ignores it
        let mut taken = ApproachPattern::new(
            approach_id(&sig, &style),
            "Taken",
            legacy_approaches()[0].signature.clone(),
            StyleCharacteristics::default(),
        );
        taken.status = ApproachStatus::Inactive {
            deactivated_at: Utc::now(),
            reason: "test".into(),
        };
        catalog.create(taken).await.unwrap();

        let created = evolver.create_from_cluster(&c, sig, style).await.unwrap().unwrap();
        assert_eq!(created.id, "approach_coding_python_sequentialsteps_1");
    }

    #[tokio::test]
    async fn test_evolve_criteria_in_order() {
        let (evolver, catalog, _) = evolver();
        let mut parent = aged(legacy_approaches().remove(1), 10);
        parent.metrics.avg_quality = 0.7;
        catalog.create(parent).await.unwrap();

        let few: Vec<ExecutionRecord> = (0..5).map(|n| tutorial_record(n, 0.95)).collect();
        assert!(evolver.evolve(LEGACY_TUTORIAL_ID, &few).await.unwrap().is_none());

        let flat: Vec<ExecutionRecord> = (0..25).map(|n| tutorial_record(n, 0.72)).collect();
        assert!(evolver.evolve(LEGACY_TUTORIAL_ID, &flat).await.unwrap().is_none());

        assert!(evolver.evolve("missing", &flat).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_evolve_too_recent_is_none() {
        let (evolver, catalog, _) = evolver();
        let mut parent = aged(legacy_approaches().remove(1), 3);
        parent.metrics.avg_quality = 0.6;
        catalog.create(parent).await.unwrap();
        let good: Vec<ExecutionRecord> = (0..25).map(|n| tutorial_record(n, 0.95)).collect();
        assert!(evolver.evolve(LEGACY_TUTORIAL_ID, &good).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_evolve_creates_child_and_leaves_parent() {
        let (evolver, catalog, _) = evolver();
        let mut parent = aged(legacy_approaches().remove(1), 10);
        parent.metrics.avg_quality = 0.6;
        catalog.create(parent).await.unwrap();
        let before = catalog.get(LEGACY_TUTORIAL_ID).unwrap();

        let good: Vec<ExecutionRecord> = (0..25).map(|n| tutorial_record(n, 0.95)).collect();
        let child = evolver
            .evolve(LEGACY_TUTORIAL_ID, &good)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(child.id, format!("{LEGACY_TUTORIAL_ID}_v2"));
        assert_eq!(child.version, 2);
        assert_eq!(child.generation, 1);
        assert_eq!(child.parent_id.as_deref(), Some(LEGACY_TUTORIAL_ID));
        assert!((child.metrics.avg_quality - 0.95).abs() < 1e-9);
        // writing/coding/research blended toward observed coding/writing
        assert!(child.signature.domain_weights.get("research") < 0.3);
        assert!(!child.signature.domain_weights.contains("analysis"));
        assert_eq!(child.style.section_count, (3, 7));

        assert_eq!(catalog.get(LEGACY_TUTORIAL_ID).unwrap(), before);
        assert!(evolver.evolve(LEGACY_TUTORIAL_ID, &good).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_prune_no_traction_after_31_days() {
        let (evolver, catalog, _) = evolver();
        let now = Utc::now();

        let mut stale = aged(legacy_approaches().remove(2), 31);
        stale.metrics.record(0.7, true, now);
        stale.metrics.record(0.7, true, now);
        let id = stale.id.clone();
        catalog.create(stale).await.unwrap();

        // Five uses is enough traction, even when just as old.
        let mut established = aged(legacy_approaches().remove(1), 31);
        for _ in 0..5 {
            established.metrics.record(0.8, true, now);
        }
        catalog.create(established).await.unwrap();
        catalog.create(aged(legacy_approaches().remove(0), 2)).await.unwrap();

        let before = catalog.list(false, 0.0);
        let candidates = evolver.prune(&PruningConfig::default(), true).await.unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].approach_id, id);
        assert_eq!(
            candidates[0].reason,
            PruneReason::NoTraction {
                usage_count: 2,
                age_days: 31
            }
        );
        assert_eq!(catalog.list(false, 0.0), before);

        let pruned = evolver.prune(&PruningConfig::default(), false).await.unwrap();
        assert_eq!(pruned.len(), 1);
        assert!(!catalog.get(&id).unwrap().is_active());
        assert!(catalog.get(LEGACY_TUTORIAL_ID).unwrap().is_active());
        assert!(evolver.prune(&PruningConfig::default(), true).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_prune_low_quality_and_superseded() {
        let (evolver, catalog, _) = evolver();
        let now = Utc::now();

        let mut weak = aged(legacy_approaches().remove(1), 5);
        for _ in 0..25 {
            weak.metrics.record(0.4, false, now);
        }
        catalog.create(weak).await.unwrap();

        let mut older = aged(legacy_approaches().remove(0), 5);
        for _ in 0..20 {
            older.metrics.record(0.65, true, now);
        }
        let mut better = older.clone();
        better.id = "research_v2".into();
        better.name = "Better Research".into();
        better.metrics = PerformanceMetrics::default();
        for _ in 0..100 {
            better.metrics.record(0.95, true, now);
        }
        catalog.create(older).await.unwrap();
        catalog.create(better).await.unwrap();

        let candidates = evolver.prune(&PruningConfig::default(), true).await.unwrap();
        assert_eq!(candidates.len(), 2);
        let by_id = |id: &str| candidates.iter().find(|c| c.approach_id == id).unwrap();
        assert!(matches!(by_id(LEGACY_TUTORIAL_ID).reason, PruneReason::LowQuality { .. }));
        assert_eq!(
            by_id("legacy_approach_A_comprehensive").reason,
            PruneReason::Superseded {
                by: "Better Research".into()
            }
        );
    }

    #[test]
    fn test_prune_reason_display() {
        let reason = PruneReason::NoTraction {
            usage_count: 2,
            age_days: 40,
        };
        assert_eq!(reason.to_string(), "no traction (2 uses in 40 days)");
    }
}
