// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Domain events for the coordination bounded context.
//! Published to the [`EventBus`](crate::infrastructure::event_bus::EventBus)
//! for observability and integration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CoordinationEvent {
    // Specialist events

    /// No existing specialist resonated; a new profile was registered
    SpecialistCreated {
        specialist_id: String,
        domain: String,
        timestamp: DateTime<Utc>,
    },

    /// An existing specialist absorbed a task signature
    SpecialistMatched {
        specialist_id: String,
        resonance: f64,
        timestamp: DateTime<Utc>,
    },

    /// Specialists removed because the registry exceeded its capacity
    SpecialistsPruned {
        specialist_ids: Vec<String>,
        timestamp: DateTime<Utc>,
    },

    // Signal events

    SignalDeposited {
        task_id: String,
        approach_id: String,
        strength: f64,
        timestamp: DateTime<Utc>,
    },

    SignalsSwept {
        removed: usize,
        timestamp: DateTime<Utc>,
    },

    // Approach lifecycle events

    ApproachSelected {
        task_id: String,
        approach_id: String,
        score: f64,
        from_catalog: bool,
        timestamp: DateTime<Utc>,
    },

    ApproachCreated {
        approach_id: String,
        cluster_id: String,
        timestamp: DateTime<Utc>,
    },

    ApproachEvolved {
        parent_id: String,
        approach_id: String,
        generation: u32,
        timestamp: DateTime<Utc>,
    },

    ApproachPruned {
        approach_id: String,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    // Execution events

    ExecutionRecorded {
        task_id: String,
        specialist_id: String,
        approach_id: String,
        quality: f64,
        success: bool,
        timestamp: DateTime<Utc>,
    },

    PatternsDiscovered {
        cluster_count: usize,
        approaches_created: usize,
        timestamp: DateTime<Utc>,
    },
}

impl CoordinationEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            CoordinationEvent::SpecialistCreated { .. } => "SpecialistCreated",
            CoordinationEvent::SpecialistMatched { .. } => "SpecialistMatched",
            CoordinationEvent::SpecialistsPruned { .. } => "SpecialistsPruned",
            CoordinationEvent::SignalDeposited { .. } => "SignalDeposited",
            CoordinationEvent::SignalsSwept { .. } => "SignalsSwept",
            CoordinationEvent::ApproachSelected { .. } => "ApproachSelected",
            CoordinationEvent::ApproachCreated { .. } => "ApproachCreated",
            CoordinationEvent::ApproachEvolved { .. } => "ApproachEvolved",
            CoordinationEvent::ApproachPruned { .. } => "ApproachPruned",
            CoordinationEvent::ExecutionRecorded { .. } => "ExecutionRecorded",
            CoordinationEvent::PatternsDiscovered { .. } => "PatternsDiscovered",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_tag() {
        let event = CoordinationEvent::SignalsSwept {
            removed: 3,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "signals_swept");
        assert_eq!(event.event_type(), "SignalsSwept");
    }
}
