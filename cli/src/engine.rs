// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Coordination Engine - the hybrid swarm facade
//!
//! Composes the specialist registry, the signal board, the approach catalog,
//! the execution ledger and the discovery/evolution loop behind two calls:
//!
//! - [`CoordinationEngine::get_coordination`] picks a specialist and an
//!   approach for a task. It is a pure decision; nothing is generated here.
//! - [`CoordinationEngine::record_result`] feeds an outcome back into every
//!   learning component and periodically kicks off pattern discovery.
//!
//! # Selection
//!
//! Catalog candidates (score ≥ threshold, at most `limit`) are blended with
//! the live signal strength for the task: `match_weight * score +
//! signal_weight * strength / 100`. Without candidates the engine falls back
//! to signal-weighted random selection, or to a uniform pick over the legacy
//! approach labels when no signal is live.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Orchestrates coordination decisions and outcome recording

use chrono::Utc;
use hybrid_swarm_core::domain::config::{CoordinationSpec, MatchingConfig, PruningConfig};
use hybrid_swarm_core::infrastructure::EventBus;
use hybrid_swarm_core::{
    ContentAnalyzer, ContentFeatures, CoordinationEvent, DescriptorExtractor, RepositoryError,
    TaskDescriptor,
};
use hybrid_swarm_cortex::application::{
    ApproachCatalog, ApproachEvolver, CatalogError, CatalogStatistics, ExecutionLedger,
    PatternMiner, PruneCandidate,
};
use hybrid_swarm_cortex::{
    ApproachMetadata, ApproachPattern, ApproachPerformance, ExecutionRecord, LedgerStatistics,
};
use hybrid_swarm_swarm::application::{SignalBoard, SpecialistRegistry};
use hybrid_swarm_swarm::{BoardState, SignalReading, SpecialistStats};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::discovery::{DiscoveryJob, DiscoveryOutcome};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Invalid task: {0}")]
    InvalidTask(String),

    #[error("No approach available for task {0}")]
    NoApproach(String),

    #[error("No {0} configured")]
    MissingCollaborator(&'static str),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Pattern discovery failed: {0:#}")]
    Discovery(anyhow::Error),
}

/// Where the chosen approach came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionSource {
    /// Best blended catalog match
    Catalog,
    /// Signal-weighted pick among live signals
    Signal,
    /// Uniform pick over the legacy approaches
    Exploration,
}

/// Answer to [`CoordinationEngine::get_coordination`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinationDecision {
    pub task_id: String,
    pub specialist_id: String,
    pub specialist_created: bool,
    pub resonance: f64,
    pub approach_id: String,
    pub quality_target: f64,
    pub selection: SelectionSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approach_metadata: Option<ApproachMetadata>,
}

/// Outcome of executing a coordination decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub specialist_id: String,
    pub approach_id: String,
    pub task_id: String,
    pub actual_quality: f64,
    pub success: bool,
    /// Required for the execution to reach the ledger
    #[serde(default)]
    pub task_context: Option<TaskDescriptor>,
    #[serde(default)]
    pub content_features: Option<ContentFeatures>,
    /// Generated text, analyzed when no features are given
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub quality_target: Option<f64>,
    #[serde(default)]
    pub execution_time_ms: u64,
}

impl ExecutionReport {
    pub fn new(
        specialist_id: impl Into<String>,
        approach_id: impl Into<String>,
        task_id: impl Into<String>,
        actual_quality: f64,
        success: bool,
    ) -> Self {
        Self {
            specialist_id: specialist_id.into(),
            approach_id: approach_id.into(),
            task_id: task_id.into(),
            actual_quality,
            success,
            task_context: None,
            content_features: None,
            content: None,
            quality_target: None,
            execution_time_ms: 0,
        }
    }

    pub fn with_task(mut self, task: TaskDescriptor) -> Self {
        self.task_context = Some(task);
        self
    }

    pub fn with_content_features(mut self, features: ContentFeatures) -> Self {
        self.content_features = Some(features);
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_quality_target(mut self, target: f64) -> Self {
        self.quality_target = Some(target);
        self
    }

    pub fn with_execution_time_ms(mut self, ms: u64) -> Self {
        self.execution_time_ms = ms;
        self
    }
}

/// Which parts of the system [`CoordinationEngine::record_result`] touched.
/// Unknown specialist or approach ids show up as `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordOutcome {
    pub specialist_updated: bool,
    pub signal_deposited: bool,
    pub approach_updated: bool,
    pub ledger_appended: bool,
    pub discovery_triggered: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemStats {
    pub specialist_count: usize,
    pub specialists: Vec<SpecialistStats>,
    pub signals: BoardState,
    pub approaches: CatalogStatistics,
    pub ledger: LedgerStatistics,
    /// Ledger appends since this engine started
    pub executions_recorded: u64,
    pub discovery_running: bool,
}

/// Services the engine is assembled from.
pub struct EngineParts {
    pub registry: Arc<SpecialistRegistry>,
    pub board: Arc<SignalBoard>,
    pub catalog: Arc<ApproachCatalog>,
    pub ledger: Arc<ExecutionLedger>,
    pub miner: Arc<PatternMiner>,
    pub evolver: Arc<ApproachEvolver>,
    pub event_bus: EventBus,
}

pub struct CoordinationEngine {
    registry: Arc<SpecialistRegistry>,
    board: Arc<SignalBoard>,
    catalog: Arc<ApproachCatalog>,
    ledger: Arc<ExecutionLedger>,
    evolver: Arc<ApproachEvolver>,
    discovery: Arc<DiscoveryJob>,
    event_bus: EventBus,
    matching: MatchingConfig,
    pruning: PruningConfig,
    discovery_enabled: bool,
    discovery_interval: u64,
    history_days: i64,
    descriptor_extractor: Option<Arc<dyn DescriptorExtractor>>,
    content_analyzer: Option<Arc<dyn ContentAnalyzer>>,
    executions_recorded: AtomicU64,
    rng: Mutex<StdRng>,
}

impl CoordinationEngine {
    pub fn new(parts: EngineParts, spec: &CoordinationSpec) -> Self {
        let rng = match spec.matching.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let discovery = Arc::new(DiscoveryJob::new(
            parts.miner,
            parts.evolver.clone(),
            parts.event_bus.clone(),
        ));
        Self {
            registry: parts.registry,
            board: parts.board,
            catalog: parts.catalog,
            ledger: parts.ledger,
            evolver: parts.evolver,
            discovery,
            event_bus: parts.event_bus,
            matching: spec.matching.clone(),
            pruning: spec.pruning.clone(),
            discovery_enabled: spec.discovery.enabled,
            discovery_interval: spec.discovery.interval_executions.max(1),
            history_days: spec.evolution.history_days,
            descriptor_extractor: None,
            content_analyzer: None,
            executions_recorded: AtomicU64::new(0),
            rng: Mutex::new(rng),
        }
    }

    pub fn with_descriptor_extractor(mut self, extractor: Arc<dyn DescriptorExtractor>) -> Self {
        self.descriptor_extractor = Some(extractor);
        self
    }

    pub fn with_content_analyzer(mut self, analyzer: Arc<dyn ContentAnalyzer>) -> Self {
        self.content_analyzer = Some(analyzer);
        self
    }

    pub fn registry(&self) -> &Arc<SpecialistRegistry> {
        &self.registry
    }

    pub fn board(&self) -> &Arc<SignalBoard> {
        &self.board
    }

    pub fn catalog(&self) -> &Arc<ApproachCatalog> {
        &self.catalog
    }

    pub fn ledger(&self) -> &Arc<ExecutionLedger> {
        &self.ledger
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Pick a specialist and an approach for `task`.
    pub async fn get_coordination(
        &self,
        task: &TaskDescriptor,
    ) -> Result<CoordinationDecision, EngineError> {
        if task.id.trim().is_empty() {
            return Err(EngineError::InvalidTask("task id cannot be empty".to_string()));
        }

        let specialist = self.registry.match_or_create(task).await?;
        let candidates = self
            .catalog
            .match_approaches(task, self.matching.threshold, self.matching.limit);
        let readings = self.board.read(&task.id, &specialist.specialist_id);

        let blended = select_candidate(
            &candidates,
            &readings,
            self.matching.match_weight,
            self.matching.signal_weight,
        );

        let (approach_id, quality_target, score, selection, approach_metadata) = match blended {
            Some((index, score)) => {
                let approach = &candidates[index].0;
                let quality_target = if approach.metrics.avg_quality > 0.0 {
                    approach.metrics.avg_quality
                } else {
                    self.matching.default_quality_target
                };
                let mut metadata = approach.metadata();
                metadata.expected_quality = quality_target;
                (
                    approach.id.clone(),
                    quality_target,
                    score,
                    SelectionSource::Catalog,
                    Some(metadata),
                )
            }
            None => {
                let (approach_id, selection) = self.fallback_selection(&task.id, &readings)?;
                let quality_target = readings
                    .first()
                    .map(|r| r.strength / 100.0)
                    .unwrap_or(self.matching.legacy_quality_target)
                    .min(1.0);
                (approach_id, quality_target, quality_target, selection, None)
            }
        };

        metrics::counter!("hybrid_swarm_coordinations_total").increment(1);
        self.event_bus.publish(CoordinationEvent::ApproachSelected {
            task_id: task.id.clone(),
            approach_id: approach_id.clone(),
            score,
            from_catalog: selection == SelectionSource::Catalog,
            timestamp: Utc::now(),
        });
        info!(
            task_id = %task.id,
            specialist_id = %specialist.specialist_id,
            approach_id = %approach_id,
            selection = ?selection,
            quality_target,
            "Coordination decided"
        );

        Ok(CoordinationDecision {
            task_id: task.id.clone(),
            specialist_id: specialist.specialist_id,
            specialist_created: specialist.created,
            resonance: specialist.resonance,
            approach_id,
            quality_target,
            selection,
            approach_metadata,
        })
    }

    /// Extract a descriptor from a raw prompt, then coordinate it.
    pub async fn coordinate_prompt(
        &self,
        task_id: &str,
        prompt: &str,
    ) -> Result<CoordinationDecision, EngineError> {
        let extractor = self
            .descriptor_extractor
            .as_ref()
            .ok_or(EngineError::MissingCollaborator("descriptor extractor"))?;
        let task = extractor.extract(task_id, prompt);
        self.get_coordination(&task).await
    }

    fn fallback_selection(
        &self,
        task_id: &str,
        readings: &[SignalReading],
    ) -> Result<(String, SelectionSource), EngineError> {
        let mut rng = self.rng.lock();
        if !readings.is_empty() {
            let total: f64 = readings.iter().map(|r| r.strength).sum();
            if total > 0.0 {
                let draw = rng.random_range(0.0..total);
                let mut cumulative = 0.0;
                for reading in readings {
                    cumulative += reading.strength;
                    if draw < cumulative {
                        return Ok((reading.approach_id.clone(), SelectionSource::Signal));
                    }
                }
            }
            // Float rounding can leave the draw past the last bucket.
            return Ok((readings[0].approach_id.clone(), SelectionSource::Signal));
        }

        let legacy = &self.matching.legacy_approaches;
        if legacy.is_empty() {
            return Err(EngineError::NoApproach(task_id.to_string()));
        }
        let index = rng.random_range(0..legacy.len());
        debug!(task_id, approach_id = %legacy[index], "No live signals, exploring");
        Ok((legacy[index].clone(), SelectionSource::Exploration))
    }

    /// Feed an execution outcome back into every learning component.
    ///
    /// Storage failures are returned; unknown ids are not errors. When the
    /// outcome reaches the ledger and the append count hits the discovery
    /// interval, discovery starts in the background and is not awaited.
    pub async fn record_result(&self, report: ExecutionReport) -> Result<RecordOutcome, EngineError> {
        let ExecutionReport {
            specialist_id,
            approach_id,
            task_id,
            actual_quality,
            success,
            task_context,
            content_features,
            content,
            quality_target,
            execution_time_ms,
        } = report;
        let quality = actual_quality.clamp(0.0, 1.0);
        let mut outcome = RecordOutcome::default();

        outcome.specialist_updated = self
            .registry
            .record_execution(&specialist_id, success, quality)
            .await?;
        if outcome.specialist_updated {
            self.board
                .deposit(&task_id, &approach_id, quality, &specialist_id)
                .await?;
            outcome.signal_deposited = true;
        }

        outcome.approach_updated = self
            .catalog
            .record_execution(&approach_id, quality, success)
            .await?;

        if let Some(mut task) = task_context {
            if task.id.trim().is_empty() {
                task.id = task_id.clone();
            }
            let features = content_features.or_else(|| {
                match (&self.content_analyzer, content.as_deref()) {
                    (Some(analyzer), Some(text)) => Some(analyzer.analyze(text)),
                    _ => None,
                }
            });
            let record = ExecutionRecord::new(
                task,
                specialist_id.as_str(),
                approach_id.as_str(),
                quality_target.unwrap_or(self.matching.default_quality_target),
                quality,
                success,
            )
            .with_execution_time_ms(execution_time_ms)
            .with_content_features(features);
            self.ledger.append(&record).await?;
            outcome.ledger_appended = true;

            let appended = self.executions_recorded.fetch_add(1, Ordering::AcqRel) + 1;
            if self.discovery_enabled && appended % self.discovery_interval == 0 {
                info!(executions = appended, "Triggering pattern discovery");
                outcome.discovery_triggered = self.discovery.trigger().is_some();
            }
        }

        if !outcome.specialist_updated || !outcome.approach_updated {
            warn!(
                task_id = %task_id,
                specialist_id = %specialist_id,
                approach_id = %approach_id,
                specialist_updated = outcome.specialist_updated,
                approach_updated = outcome.approach_updated,
                "Result recorded against unknown ids"
            );
        }

        self.event_bus.publish(CoordinationEvent::ExecutionRecorded {
            task_id,
            specialist_id,
            approach_id,
            quality,
            success,
            timestamp: Utc::now(),
        });
        Ok(outcome)
    }

    pub async fn stats(&self) -> Result<SystemStats, EngineError> {
        let specialists = self.registry.stats().await;
        Ok(SystemStats {
            specialist_count: specialists.len(),
            specialists,
            signals: self.board.state(),
            approaches: self.catalog.statistics(),
            ledger: self.ledger.statistics().await?,
            executions_recorded: self.executions_recorded.load(Ordering::Acquire),
            discovery_running: self.discovery.is_running(),
        })
    }

    pub fn approach_performance(&self, approach_id: &str) -> Option<ApproachPerformance> {
        self.catalog.performance(approach_id)
    }

    /// Run one discovery cycle inline and wait for it.
    pub async fn discover_now(&self) -> Result<DiscoveryOutcome, EngineError> {
        self.discovery.run_cycle().await.map_err(EngineError::Discovery)
    }

    pub async fn prune_approaches(&self, dry_run: bool) -> Result<Vec<PruneCandidate>, EngineError> {
        Ok(self.evolver.prune(&self.pruning, dry_run).await?)
    }

    /// Try to evolve `approach_id` from its recent ledger history.
    pub async fn evolve_approach(
        &self,
        approach_id: &str,
    ) -> Result<Option<ApproachPattern>, EngineError> {
        let history = self
            .ledger
            .approach_history(approach_id, Some(self.history_days))
            .await?;
        Ok(self.evolver.evolve(approach_id, &history).await?)
    }

    pub async fn seed_legacy_approaches(&self) -> Result<usize, EngineError> {
        Ok(self.catalog.seed_legacy_approaches().await?)
    }

    /// Stop accepting discovery triggers and abandon a running cycle.
    pub fn shutdown(&self) {
        self.discovery.shutdown_token().cancel();
    }
}

/// Index and blended score of the best candidate; the first wins ties.
pub fn select_candidate(
    candidates: &[(ApproachPattern, f64)],
    readings: &[SignalReading],
    match_weight: f64,
    signal_weight: f64,
) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (index, (approach, score)) in candidates.iter().enumerate() {
        let strength = readings
            .iter()
            .find(|r| r.approach_id == approach.id)
            .map(|r| r.strength)
            .unwrap_or(0.0);
        let combined = match_weight * score + signal_weight * (strength / 100.0);
        if best.is_none_or(|(_, top)| combined > top) {
            best = Some((index, combined));
        }
    }
    best
}
