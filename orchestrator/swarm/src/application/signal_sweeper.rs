// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Signal Sweeper - background garbage collection for the signal board
//!
//! Periodically drops signals whose decayed strength has fallen below the
//! floor. Runs on its own task, independent of request handling, and stops
//! when its cancellation token fires.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Owns the lifecycle of the periodic sweep

use anyhow::Result;
use chrono::Utc;
use hybrid_swarm_core::domain::config::SignalConfig;
use hybrid_swarm_core::infrastructure::EventBus;
use hybrid_swarm_core::CoordinationEvent;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::signal_board::SignalBoard;

/// Configuration for the signal sweeper
#[derive(Debug, Clone)]
pub struct SignalSweeperConfig {
    /// How often to sweep (in seconds)
    pub interval_seconds: u64,

    /// Whether sweeping is enabled
    pub enabled: bool,
}

impl Default for SignalSweeperConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 600,
            enabled: true,
        }
    }
}

impl From<&SignalConfig> for SignalSweeperConfig {
    fn from(config: &SignalConfig) -> Self {
        Self {
            interval_seconds: config.sweep_interval_secs,
            enabled: config.sweep_enabled,
        }
    }
}

pub struct SignalSweeper {
    board: Arc<SignalBoard>,
    event_bus: EventBus,
    config: SignalSweeperConfig,
    shutdown_token: CancellationToken,
}

impl SignalSweeper {
    pub fn new(board: Arc<SignalBoard>, event_bus: EventBus, config: SignalSweeperConfig) -> Self {
        Self {
            board,
            event_bus,
            config,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Get a handle to trigger shutdown
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Start the sweeper background task
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(&self) {
        if !self.config.enabled {
            info!("Signal sweeper is disabled");
            return;
        }

        info!(
            interval_seconds = self.config.interval_seconds,
            "Starting signal sweeper background task"
        );

        let mut tick = interval(Duration::from_secs(self.config.interval_seconds.max(1)));

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    debug!("Running signal sweep cycle");
                    match self.sweep_cycle().await {
                        Ok(removed) => debug!(removed, "Signal sweep cycle completed"),
                        Err(e) => warn!("Signal sweep cycle failed: {}", e),
                    }
                }
                _ = self.shutdown_token.cancelled() => {
                    info!("Shutdown signal received, stopping signal sweeper");
                    break;
                }
            }
        }

        info!("Signal sweeper background task stopped");
    }

    /// Execute a single sweep
    pub async fn sweep_cycle(&self) -> Result<usize> {
        let removed = self.board.sweep().await?;
        metrics::counter!("hybrid_swarm_signals_swept_total").increment(removed as u64);

        self.event_bus.publish(CoordinationEvent::SignalsSwept {
            removed,
            timestamp: Utc::now(),
        });

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::InMemorySignalRepository;

    fn board(bus: &EventBus) -> Arc<SignalBoard> {
        Arc::new(SignalBoard::new(
            SignalConfig::default(),
            Arc::new(InMemorySignalRepository::new()),
            bus.clone(),
        ))
    }

    #[test]
    fn test_sweeper_configuration() {
        let config = SignalSweeperConfig::default();
        assert_eq!(config.interval_seconds, 600);
        assert!(config.enabled);

        let from_signals = SignalSweeperConfig::from(&SignalConfig {
            sweep_interval_secs: 30,
            sweep_enabled: false,
            ..SignalConfig::default()
        });
        assert_eq!(from_signals.interval_seconds, 30);
        assert!(!from_signals.enabled);
    }

    #[tokio::test]
    async fn test_sweep_cycle_publishes_event() {
        let bus = EventBus::new(16);
        let mut receiver = bus.subscribe();
        let sweeper = SignalSweeper::new(board(&bus), bus.clone(), SignalSweeperConfig::default());

        assert_eq!(sweeper.sweep_cycle().await.unwrap(), 0);
        match receiver.recv().await.unwrap() {
            CoordinationEvent::SignalsSwept { removed, .. } => assert_eq!(removed, 0),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_sweeper_stops_on_cancel() {
        let bus = EventBus::default();
        let sweeper = Arc::new(SignalSweeper::new(
            board(&bus),
            bus,
            SignalSweeperConfig {
                interval_seconds: 1,
                enabled: true,
            },
        ));
        let token = sweeper.shutdown_token();
        let handle = sweeper.start();

        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("sweeper did not stop")
            .unwrap();
    }

    #[tokio::test]
    async fn test_sweeper_disabled_returns_immediately() {
        let bus = EventBus::default();
        let sweeper = Arc::new(SignalSweeper::new(
            board(&bus),
            bus,
            SignalSweeperConfig {
                interval_seconds: 1,
                enabled: false,
            },
        ));
        let handle = sweeper.start();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("disabled sweeper kept running")
            .unwrap();
    }
}
