// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Pattern Discovery Job - best-effort background discovery
//!
//! Mines the execution ledger for clusters and turns each novel one into an
//! approach. Triggered from the request path but never awaited by it; a
//! failed cycle is logged and dropped. At most one cycle runs at a time and
//! in-flight cycles stop when the shutdown token fires.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Owns the lifecycle of discovery-then-creation cycles

use anyhow::Result;
use chrono::Utc;
use hybrid_swarm_core::infrastructure::EventBus;
use hybrid_swarm_core::CoordinationEvent;
use hybrid_swarm_cortex::application::{extract_signature, extract_style, ApproachEvolver, PatternMiner};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Result of one discovery cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryOutcome {
    pub cluster_count: usize,
    /// Ids of the approaches created from novel clusters
    pub created: Vec<String>,
}

/// Holds the single-cycle slot; releases it on drop, including when the
/// cycle panics.
struct RunningGuard(Arc<DiscoveryJob>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.running.store(false, Ordering::Release);
    }
}

pub struct DiscoveryJob {
    miner: Arc<PatternMiner>,
    evolver: Arc<ApproachEvolver>,
    event_bus: EventBus,
    running: AtomicBool,
    shutdown_token: CancellationToken,
}

impl DiscoveryJob {
    pub fn new(miner: Arc<PatternMiner>, evolver: Arc<ApproachEvolver>, event_bus: EventBus) -> Self {
        Self {
            miner,
            evolver,
            event_bus,
            running: AtomicBool::new(false),
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Get a handle to trigger shutdown
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Spawn one cycle in the background. Returns `None` when a cycle is
    /// already running or the job was shut down.
    pub fn trigger(self: &Arc<Self>) -> Option<tokio::task::JoinHandle<()>> {
        if self.shutdown_token.is_cancelled() {
            return None;
        }
        let Some(guard) = self.claim() else {
            debug!("Pattern discovery already running, skipping trigger");
            return None;
        };

        Some(tokio::spawn(async move {
            let job = &guard.0;
            tokio::select! {
                result = job.run_cycle() => match result {
                    Ok(outcome) => debug!(
                        clusters = outcome.cluster_count,
                        created = outcome.created.len(),
                        "Background discovery cycle completed"
                    ),
                    Err(e) => warn!("Background discovery cycle failed: {:#}", e),
                },
                _ = job.shutdown_token.cancelled() => {
                    info!("Shutdown signal received, abandoning discovery cycle");
                }
            }
        }))
    }

    fn claim(self: &Arc<Self>) -> Option<RunningGuard> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunningGuard(Arc::clone(self)))
    }

    /// Execute a single discovery cycle inline.
    pub async fn run_cycle(&self) -> Result<DiscoveryOutcome> {
        let clusters = self.miner.discover().await?;

        let mut created = Vec::new();
        for cluster in &clusters {
            let signature = extract_signature(cluster);
            let style = extract_style(cluster);
            if let Some(approach) = self.evolver.create_from_cluster(cluster, signature, style).await? {
                created.push(approach.id);
            }
        }

        if !clusters.is_empty() {
            info!(
                clusters = clusters.len(),
                created = created.len(),
                "Pattern discovery created approaches"
            );
        }
        self.event_bus.publish(CoordinationEvent::PatternsDiscovered {
            cluster_count: clusters.len(),
            approaches_created: created.len(),
            timestamp: Utc::now(),
        });

        Ok(DiscoveryOutcome {
            cluster_count: clusters.len(),
            created,
        })
    }
}
