// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Engine assembly from configuration.
//!
//! Selects the storage backend, loads persisted state, wires every service
//! to one event bus and owns the background signal sweeper.
//!
//! Filesystem layout under `storage.data_dir`:
//!
//! ```text
//! specialists/        one JSON document per specialist
//! signals/            one JSON document per task
//! approaches/         one JSON document per approach + manifest.json
//! execution_history/  YYYY-MM/records_YYYYMMDD.jsonl + index.json
//! discovered_patterns.json
//! ```

use anyhow::{Context, Result};
use hybrid_swarm_core::infrastructure::EventBus;
use hybrid_swarm_core::{
    CoordinationConfig, IdentifierSanitizer, StorageBackend, StrictIdentifierSanitizer,
};
use hybrid_swarm_cortex::application::{ApproachCatalog, ApproachEvolver, ExecutionLedger, PatternMiner};
use hybrid_swarm_cortex::infrastructure::{
    FileApproachRepository, FileExecutionRecordStore, InMemoryApproachRepository,
    InMemoryExecutionRecordStore,
};
use hybrid_swarm_cortex::{ApproachRepository, ExecutionRecordStore};
use hybrid_swarm_swarm::application::{
    SignalBoard, SignalSweeper, SignalSweeperConfig, SpecialistRegistry,
};
use hybrid_swarm_swarm::infrastructure::{
    FileSignalRepository, FileSpecialistRepository, InMemorySignalRepository,
    InMemorySpecialistRepository,
};
use hybrid_swarm_swarm::{SignalRepository, SpecialistRepository};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::engine::{CoordinationEngine, EngineParts};

struct Stores {
    specialists: Arc<dyn SpecialistRepository>,
    signals: Arc<dyn SignalRepository>,
    approaches: Arc<dyn ApproachRepository>,
    ledger: Arc<dyn ExecutionRecordStore>,
}

fn stores(backend: &StorageBackend) -> Stores {
    match backend {
        StorageBackend::InMemory => Stores {
            specialists: Arc::new(InMemorySpecialistRepository::new()),
            signals: Arc::new(InMemorySignalRepository::new()),
            approaches: Arc::new(InMemoryApproachRepository::new()),
            ledger: Arc::new(InMemoryExecutionRecordStore::new()),
        },
        StorageBackend::FileSystem(fs) => {
            let sanitizer: Arc<dyn IdentifierSanitizer> = Arc::new(StrictIdentifierSanitizer::new());
            Stores {
                specialists: Arc::new(FileSpecialistRepository::new(
                    fs.data_dir.join("specialists"),
                    sanitizer.clone(),
                )),
                signals: Arc::new(FileSignalRepository::new(
                    fs.data_dir.join("signals"),
                    sanitizer.clone(),
                )),
                approaches: Arc::new(FileApproachRepository::new(
                    fs.data_dir.join("approaches"),
                    sanitizer,
                )),
                ledger: Arc::new(FileExecutionRecordStore::new(
                    fs.data_dir.join("execution_history"),
                )),
            }
        }
    }
}

/// Build an engine over the configured backend, loading persisted state.
pub async fn build_engine(config: &CoordinationConfig, event_bus: EventBus) -> Result<CoordinationEngine> {
    let spec = &config.spec;
    let backend = spec.storage.backend();
    let stores = stores(&backend);

    let registry = SpecialistRegistry::load(spec.resonance.clone(), stores.specialists, event_bus.clone())
        .await
        .context("Failed to load specialists")?;
    let board = SignalBoard::load(spec.signals.clone(), stores.signals, event_bus.clone())
        .await
        .context("Failed to load signals")?;
    let catalog = Arc::new(
        ApproachCatalog::load(stores.approaches)
            .await
            .context("Failed to load approaches")?,
    );
    let ledger = Arc::new(ExecutionLedger::new(stores.ledger));

    let mut miner = PatternMiner::new(ledger.clone(), spec.discovery.clone());
    if let StorageBackend::FileSystem(fs) = &backend {
        miner = miner.with_report_dir(fs.data_dir.clone());
    }
    let evolver = ApproachEvolver::new(
        catalog.clone(),
        event_bus.clone(),
        spec.evolution.clone(),
        spec.discovery.novelty_threshold,
    );

    info!(backend = ?backend, approaches = catalog.len(), "Coordination engine assembled");
    Ok(CoordinationEngine::new(
        EngineParts {
            registry: Arc::new(registry),
            board: Arc::new(board),
            catalog,
            ledger,
            miner: Arc::new(miner),
            evolver: Arc::new(evolver),
            event_bus,
        },
        spec,
    ))
}

/// A running engine plus its background sweeper.
pub struct CoordinationRuntime {
    pub engine: Arc<CoordinationEngine>,
    sweeper: Arc<SignalSweeper>,
    sweeper_handle: JoinHandle<()>,
}

impl CoordinationRuntime {
    /// Validate `config`, build the engine and start sweeping signals.
    pub async fn start(config: &CoordinationConfig) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;

        let event_bus = EventBus::with_default_capacity();
        let engine = Arc::new(build_engine(config, event_bus.clone()).await?);

        let sweeper = Arc::new(SignalSweeper::new(
            engine.board().clone(),
            event_bus,
            SignalSweeperConfig::from(&config.spec.signals),
        ));
        let sweeper_handle = sweeper.clone().start();

        Ok(Self {
            engine,
            sweeper,
            sweeper_handle,
        })
    }

    /// Stop background work and wait for the sweeper to exit.
    pub async fn shutdown(self) -> Result<()> {
        self.engine.shutdown();
        self.sweeper.shutdown_token().cancel();
        self.sweeper_handle
            .await
            .context("Signal sweeper task panicked")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hybrid_swarm_core::domain::config::StorageKind;
    use hybrid_swarm_core::TaskDescriptor;

    use crate::engine::ExecutionReport;

    fn filesystem_config(dir: &std::path::Path) -> CoordinationConfig {
        let mut config = CoordinationConfig::default();
        config.spec.storage.backend = StorageKind::Filesystem;
        config.spec.storage.data_dir = dir.to_path_buf();
        config.spec.matching.rng_seed = Some(1);
        config
    }

    #[tokio::test]
    async fn test_filesystem_state_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let config = filesystem_config(dir.path());
        let task = TaskDescriptor::new("t1", "tutorial")
            .with_domain("writing", 0.9)
            .with_keywords(["tutorial"]);

        let specialist_id = {
            let runtime = CoordinationRuntime::start(&config).await.unwrap();
            runtime.engine.seed_legacy_approaches().await.unwrap();
            let decision = runtime.engine.get_coordination(&task).await.unwrap();
            runtime
                .engine
                .record_result(
                    ExecutionReport::new(&decision.specialist_id, &decision.approach_id, "t1", 0.9, true)
                        .with_task(task.clone()),
                )
                .await
                .unwrap();
            runtime.shutdown().await.unwrap();
            decision.specialist_id
        };

        assert!(dir.path().join("approaches").join("manifest.json").exists());
        assert!(dir.path().join("execution_history").join("index.json").exists());

        let runtime = CoordinationRuntime::start(&config).await.unwrap();
        let stats = runtime.engine.stats().await.unwrap();
        assert_eq!(stats.specialist_count, 1);
        assert_eq!(stats.approaches.total_approaches, 3);
        assert_eq!(stats.ledger.total_records, 1);
        assert_eq!(stats.signals.signal_count, 1);

        let again = runtime.engine.get_coordination(&task).await.unwrap();
        assert_eq!(again.specialist_id, specialist_id);
        runtime.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let mut config = CoordinationConfig::default();
        config.spec.matching.limit = 0;
        assert!(CoordinationRuntime::start(&config).await.is_err());
    }
}
