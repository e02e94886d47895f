// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Stigmergic Signals
//!
//! A [`Signal`] associates a task with the approach used for it. Its strength
//! decays exponentially with age and is reinforced or attenuated by later
//! deposits for the same (task, approach) pair.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Upper bound on signal strength.
pub const MAX_STRENGTH: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub task_id: String,
    pub approach_id: String,
    /// Strength at `timestamp`, in [0, 100]
    pub strength: f64,
    pub timestamp: DateTime<Utc>,
    pub deposited_by: String,
    /// Blended outcome quality, in [0, 1]
    pub success_metric: f64,
}

impl Signal {
    pub fn new(
        task_id: impl Into<String>,
        approach_id: impl Into<String>,
        strength: f64,
        deposited_by: impl Into<String>,
        success_metric: f64,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            approach_id: approach_id.into(),
            strength: strength.clamp(0.0, MAX_STRENGTH),
            timestamp: Utc::now(),
            deposited_by: deposited_by.into(),
            success_metric: success_metric.clamp(0.0, 1.0),
        }
    }

    /// Seconds since the last deposit; never negative.
    pub fn age_seconds(&self, now: DateTime<Utc>) -> f64 {
        let millis = (now - self.timestamp).num_milliseconds().max(0);
        millis as f64 / 1000.0
    }

    /// `strength * e^(-age / decay_rate)`.
    pub fn decayed_strength(&self, now: DateTime<Utc>, decay_rate_secs: f64) -> f64 {
        decay(self.strength, self.age_seconds(now), decay_rate_secs)
    }
}

/// Exponential decay of `strength` after `age_secs`.
pub fn decay(strength: f64, age_secs: f64, decay_rate_secs: f64) -> f64 {
    if decay_rate_secs <= 0.0 {
        return 0.0;
    }
    strength * (-age_secs.max(0.0) / decay_rate_secs).exp()
}

/// A live signal as seen by a reader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalReading {
    pub approach_id: String,
    pub strength: f64,
    pub success_metric: f64,
    pub age_hours: f64,
    pub from_self: bool,
}

/// Snapshot of the whole board with decayed strengths.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardState {
    pub task_count: usize,
    pub signal_count: usize,
    /// task id → approach id → decayed strength
    pub tasks: BTreeMap<String, BTreeMap<String, f64>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_decay_non_increasing_in_age() {
        let mut previous = f64::MAX;
        for age in [0.0, 1.0, 60.0, 3600.0, 86_400.0] {
            let s = decay(80.0, age, 3600.0);
            assert!(s <= previous);
            previous = s;
        }
        assert!((decay(80.0, 3600.0, 3600.0) - 80.0 / std::f64::consts::E).abs() < 1e-9);
    }

    #[test]
    fn test_decayed_strength_uses_timestamp() {
        let mut signal = Signal::new("t", "a", 50.0, "s", 0.5);
        let now = Utc::now();
        signal.timestamp = now - Duration::hours(1);
        let decayed = signal.decayed_strength(now, 3600.0);
        assert!((decayed - 50.0 / std::f64::consts::E).abs() < 1e-6);
    }

    #[test]
    fn test_future_timestamp_does_not_amplify() {
        let mut signal = Signal::new("t", "a", 50.0, "s", 0.5);
        let now = Utc::now();
        signal.timestamp = now + Duration::hours(1);
        assert_eq!(signal.decayed_strength(now, 3600.0), 50.0);
    }

    #[test]
    fn test_new_clamps_inputs() {
        let signal = Signal::new("t", "a", 250.0, "s", 1.4);
        assert_eq!(signal.strength, MAX_STRENGTH);
        assert_eq!(signal.success_metric, 1.0);
    }
}
