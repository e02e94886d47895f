// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Signal Board - stigmergic reinforcement of (task, approach) pairs
//!
//! All board state sits behind one `parking_lot::Mutex`, held only for the
//! in-memory read or update and never across an `.await`. Persistence runs
//! after the lock is released, serialized by a separate async lock so the
//! last write always carries the latest snapshot.

use chrono::Utc;
use hybrid_swarm_core::domain::config::SignalConfig;
use hybrid_swarm_core::infrastructure::EventBus;
use hybrid_swarm_core::{CoordinationEvent, RepositoryError};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::signal::MAX_STRENGTH;
use crate::domain::{BoardState, Signal, SignalReading, SignalRepository};

/// Weight of the stored success metric when blending in a new outcome.
const SUCCESS_METRIC_RETENTION: f64 = 0.7;

pub struct SignalBoard {
    config: SignalConfig,
    repository: Arc<dyn SignalRepository>,
    event_bus: EventBus,
    signals: Mutex<BTreeMap<String, Vec<Signal>>>,
    persist_lock: tokio::sync::Mutex<()>,
}

impl SignalBoard {
    pub fn new(
        config: SignalConfig,
        repository: Arc<dyn SignalRepository>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            config,
            repository,
            event_bus,
            signals: Mutex::new(BTreeMap::new()),
            persist_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Board populated from `repository`.
    pub async fn load(
        config: SignalConfig,
        repository: Arc<dyn SignalRepository>,
        event_bus: EventBus,
    ) -> Result<Self, RepositoryError> {
        let stored = repository.load_all().await?;
        info!(count = stored.len(), "Loaded signals");
        let board = Self::new(config, repository, event_bus);
        {
            let mut signals = board.signals.lock();
            for signal in stored {
                signals.entry(signal.task_id.clone()).or_default().push(signal);
            }
        }
        Ok(board)
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }

    /// Deposit the outcome of using `approach_id` for `task_id`.
    ///
    /// A live signal for the same pair is amplified when the depositor matches
    /// or the quality is high, and attenuated otherwise. Returns the new
    /// strength.
    pub async fn deposit(
        &self,
        task_id: &str,
        approach_id: &str,
        quality: f64,
        depositor: &str,
    ) -> Result<f64, RepositoryError> {
        let quality = quality.clamp(0.0, 1.0);
        let initial = quality * MAX_STRENGTH;
        let now = Utc::now();

        let strength = {
            let mut signals = self.signals.lock();
            let entries = signals.entry(task_id.to_string()).or_default();
            match entries.iter_mut().find(|s| s.approach_id == approach_id) {
                Some(existing) => {
                    let current = existing.decayed_strength(now, self.config.decay_rate_secs);
                    if current > self.config.strength_floor {
                        let reinforce = existing.deposited_by == depositor
                            || quality > self.config.reinforce_quality;
                        let updated = if reinforce {
                            current + initial * self.config.amplification
                        } else {
                            current * self.config.attenuation
                        };
                        existing.strength = updated.clamp(0.0, MAX_STRENGTH);
                        existing.timestamp = now;
                        existing.success_metric = SUCCESS_METRIC_RETENTION
                            * existing.success_metric
                            + (1.0 - SUCCESS_METRIC_RETENTION) * quality;
                        debug!(
                            task_id = %task_id,
                            approach_id = %approach_id,
                            reinforce,
                            strength = existing.strength,
                            "Signal updated"
                        );
                    } else {
                        *existing = Signal::new(task_id, approach_id, initial, depositor, quality);
                    }
                    existing.strength
                }
                None => {
                    let signal = Signal::new(task_id, approach_id, initial, depositor, quality);
                    let strength = signal.strength;
                    entries.push(signal);
                    strength
                }
            }
        };

        metrics::counter!("hybrid_swarm_signal_deposits_total").increment(1);
        self.event_bus.publish(CoordinationEvent::SignalDeposited {
            task_id: task_id.to_string(),
            approach_id: approach_id.to_string(),
            strength,
            timestamp: now,
        });

        self.persist(&[task_id.to_string()]).await?;
        Ok(strength)
    }

    /// Live signals for `task_id`, strongest first.
    pub fn read(&self, task_id: &str, reader: &str) -> Vec<SignalReading> {
        let now = Utc::now();
        let mut readings: Vec<SignalReading> = {
            let signals = self.signals.lock();
            signals
                .get(task_id)
                .map(|entries| {
                    entries
                        .iter()
                        .filter_map(|s| {
                            let strength = s.decayed_strength(now, self.config.decay_rate_secs);
                            (strength > self.config.strength_floor).then(|| SignalReading {
                                approach_id: s.approach_id.clone(),
                                strength,
                                success_metric: s.success_metric,
                                age_hours: s.age_seconds(now) / 3600.0,
                                from_self: s.deposited_by == reader,
                            })
                        })
                        .collect()
                })
                .unwrap_or_default()
        };
        readings.sort_by(|a, b| {
            b.strength
                .total_cmp(&a.strength)
                .then_with(|| a.approach_id.cmp(&b.approach_id))
        });
        readings
    }

    pub fn strongest(&self, task_id: &str) -> Option<SignalReading> {
        self.read(task_id, "").into_iter().next()
    }

    /// Live decayed strength of one pair; 0 when absent or dead.
    pub fn strength_of(&self, task_id: &str, approach_id: &str) -> f64 {
        self.read(task_id, "")
            .into_iter()
            .find(|r| r.approach_id == approach_id)
            .map(|r| r.strength)
            .unwrap_or(0.0)
    }

    pub fn state(&self) -> BoardState {
        let now = Utc::now();
        let signals = self.signals.lock();
        let mut state = BoardState::default();
        for (task_id, entries) in signals.iter() {
            if entries.is_empty() {
                continue;
            }
            state.task_count += 1;
            state.signal_count += entries.len();
            let strengths = entries
                .iter()
                .map(|s| {
                    (
                        s.approach_id.clone(),
                        s.decayed_strength(now, self.config.decay_rate_secs),
                    )
                })
                .collect();
            state.tasks.insert(task_id.clone(), strengths);
        }
        state
    }

    /// Drop signals whose decayed strength fell below the floor.
    /// Returns how many were removed.
    pub async fn sweep(&self) -> Result<usize, RepositoryError> {
        let now = Utc::now();
        let (removed, touched) = {
            let mut signals = self.signals.lock();
            let mut removed = 0;
            let mut touched = Vec::new();
            for (task_id, entries) in signals.iter_mut() {
                let before = entries.len();
                entries.retain(|s| {
                    s.decayed_strength(now, self.config.decay_rate_secs)
                        >= self.config.strength_floor
                });
                if entries.len() != before {
                    removed += before - entries.len();
                    touched.push(task_id.clone());
                }
            }
            signals.retain(|_, entries| !entries.is_empty());
            (removed, touched)
        };

        if removed > 0 {
            self.persist(&touched).await?;
            debug!(removed, tasks = touched.len(), "Swept decayed signals");
        }
        Ok(removed)
    }

    async fn persist(&self, task_ids: &[String]) -> Result<(), RepositoryError> {
        let _guard = self.persist_lock.lock().await;
        for task_id in task_ids {
            let snapshot = self
                .signals
                .lock()
                .get(task_id)
                .cloned()
                .unwrap_or_default();
            self.repository.save_task(task_id, &snapshot).await?;
        }
        Ok(())
    }

    #[cfg(test)]
    fn backdate(&self, task_id: &str, approach_id: &str, seconds: i64) {
        let mut signals = self.signals.lock();
        if let Some(s) = signals
            .get_mut(task_id)
            .and_then(|entries| entries.iter_mut().find(|s| s.approach_id == approach_id))
        {
            s.timestamp -= chrono::Duration::seconds(seconds);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::InMemorySignalRepository;

    fn board() -> SignalBoard {
        SignalBoard::new(
            SignalConfig::default(),
            Arc::new(InMemorySignalRepository::new()),
            EventBus::default(),
        )
    }

    #[tokio::test]
    async fn test_double_deposit_clamps_to_max() {
        let board = board();
        let first = board.deposit("T", "A", 0.9, "X").await.unwrap();
        assert!((first - 90.0).abs() < 1e-9);
        let second = board.deposit("T", "A", 0.9, "X").await.unwrap();
        assert_eq!(second, 100.0);
    }

    #[tokio::test]
    async fn test_other_depositor_low_quality_attenuates() {
        let board = board();
        board.deposit("T", "A", 0.6, "X").await.unwrap();
        let before = board.strength_of("T", "A");
        let after = board.deposit("T", "A", 0.5, "Y").await.unwrap();
        assert!(after <= before);
        assert!((after - before * 0.7).abs() < 0.01);
    }

    #[tokio::test]
    async fn test_other_depositor_high_quality_amplifies() {
        let board = board();
        board.deposit("T", "A", 0.2, "X").await.unwrap();
        let after = board.deposit("T", "A", 0.8, "Y").await.unwrap();
        assert!(after > 20.0);
    }

    #[tokio::test]
    async fn test_success_metric_blended() {
        let board = board();
        board.deposit("T", "A", 1.0, "X").await.unwrap();
        board.deposit("T", "A", 0.0, "X").await.unwrap();
        let reading = board.strongest("T").unwrap();
        assert!((reading.success_metric - 0.7).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_read_sorted_and_filters_dead() {
        let board = board();
        board.deposit("T", "A", 0.3, "X").await.unwrap();
        board.deposit("T", "B", 0.8, "Y").await.unwrap();
        board.deposit("T", "C", 0.005, "Y").await.unwrap();

        let readings = board.read("T", "X");
        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].approach_id, "B");
        assert!(!readings[0].from_self);
        assert_eq!(readings[1].approach_id, "A");
        assert!(readings[1].from_self);
    }

    #[tokio::test]
    async fn test_dead_signal_replaced_by_fresh_deposit() {
        let board = board();
        board.deposit("T", "A", 0.9, "X").await.unwrap();
        // ~6 e-folds: 90 * e^-6 < 1
        board.backdate("T", "A", 6 * 3600);
        assert_eq!(board.strength_of("T", "A"), 0.0);
        let strength = board.deposit("T", "A", 0.4, "Y").await.unwrap();
        assert!((strength - 40.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_sweep_removes_decayed() {
        let board = board();
        board.deposit("T1", "A", 0.9, "X").await.unwrap();
        board.deposit("T2", "A", 0.9, "X").await.unwrap();
        board.backdate("T1", "A", 10 * 3600);

        let removed = board.sweep().await.unwrap();
        assert_eq!(removed, 1);
        let state = board.state();
        assert_eq!(state.task_count, 1);
        assert!(state.tasks.contains_key("T2"));
    }

    #[tokio::test]
    async fn test_load_restores_signals() {
        let repo = Arc::new(InMemorySignalRepository::new());
        let board = SignalBoard::new(SignalConfig::default(), repo.clone(), EventBus::default());
        board.deposit("T", "A", 0.5, "X").await.unwrap();

        let restored = SignalBoard::load(SignalConfig::default(), repo, EventBus::default())
            .await
            .unwrap();
        assert!(restored.strength_of("T", "A") > 49.0);
    }
}
