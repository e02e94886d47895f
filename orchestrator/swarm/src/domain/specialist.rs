// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Specialist Aggregate
//!
//! - [`TaskSignature`] - the categorical/numeric fingerprint of one task and
//!   its fixed-length feature vector.
//! - [`SpecialistProfile`] - aggregate root: a sliding window of recent
//!   signatures plus outcome statistics.
//!
//! Resonance between a task and a specialist is the cosine similarity of the
//! task's vector with the centroid of the specialist's window, weighted by the
//! specialist's success rate once it has recorded outcomes.

use chrono::{DateTime, Utc};
use hybrid_swarm_core::domain::similarity::{cosine, stable_bucket, stable_unit};
use hybrid_swarm_core::TaskDescriptor;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Length of [`TaskSignature::to_vector`].
pub const SIGNATURE_DIMENSIONS: usize = 6;

/// Success rate reported for a specialist with no recorded executions.
pub const DEFAULT_SUCCESS_RATE: f64 = 0.5;

/// Fingerprint of a single task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSignature {
    pub domain: String,
    pub complexity: f64,
    pub input_type: String,
    pub output_type: String,
    pub keywords: Vec<String>,
    pub estimated_duration: f64,
}

impl TaskSignature {
    pub fn from_task(task: &TaskDescriptor) -> Self {
        Self {
            domain: task.primary_domain().to_string(),
            complexity: task.clamped_complexity(),
            input_type: task.input_type.clone(),
            output_type: task.output_type.clone(),
            keywords: task.keywords.clone(),
            estimated_duration: task.estimated_duration.max(0.0),
        }
    }

    /// `[domain, complexity, input, output, keywords, duration]`, each in [0, 1].
    ///
    /// Categorical fields use a stable hash bucket; keywords are the mean of
    /// their buckets (0 when there are none); duration is `/10` capped at 1.
    pub fn to_vector(&self) -> [f64; SIGNATURE_DIMENSIONS] {
        let keyword_code = if self.keywords.is_empty() {
            0.0
        } else {
            self.keywords
                .iter()
                .map(|k| stable_bucket(k) as f64 / 100.0)
                .sum::<f64>()
                / self.keywords.len() as f64
        };

        [
            stable_unit(&self.domain),
            self.complexity.clamp(0.0, 1.0),
            stable_unit(&self.input_type),
            stable_unit(&self.output_type),
            keyword_code,
            (self.estimated_duration / 10.0).clamp(0.0, 1.0),
        ]
    }
}

/// Persistent specialist affinity profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialistProfile {
    pub id: String,
    pub signatures: VecDeque<TaskSignature>,
    pub success_count: u64,
    pub failure_count: u64,
    pub total_executions: u64,
    pub avg_quality: f64,
    pub specialization_strength: f64,
    pub created_at: DateTime<Utc>,
    pub last_used: DateTime<Utc>,
}

impl SpecialistProfile {
    pub fn new(id: impl Into<String>, first: TaskSignature) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            signatures: VecDeque::from([first]),
            success_count: 0,
            failure_count: 0,
            total_executions: 0,
            avg_quality: 0.0,
            specialization_strength: 1.0,
            created_at: now,
            last_used: now,
        }
    }

    /// `success / total`, or [`DEFAULT_SUCCESS_RATE`] with no history.
    pub fn success_rate(&self) -> f64 {
        if self.total_executions == 0 {
            DEFAULT_SUCCESS_RATE
        } else {
            self.success_count as f64 / self.total_executions as f64
        }
    }

    /// Mean vector of the signature window.
    pub fn centroid(&self) -> Option<[f64; SIGNATURE_DIMENSIONS]> {
        if self.signatures.is_empty() {
            return None;
        }
        let mut sum = [0.0; SIGNATURE_DIMENSIONS];
        for sig in &self.signatures {
            for (acc, v) in sum.iter_mut().zip(sig.to_vector()) {
                *acc += v;
            }
        }
        let n = self.signatures.len() as f64;
        Some(sum.map(|v| v / n))
    }

    /// Cosine similarity to the window centroid weighted by outcome history.
    ///
    /// A profile that has not recorded any execution is judged on similarity
    /// alone; afterwards the observed success rate scales the score. An empty
    /// window resonates with nothing.
    pub fn resonance(&self, signature: &TaskSignature) -> f64 {
        let Some(centroid) = self.centroid() else {
            return 0.0;
        };
        let similarity = cosine(&signature.to_vector(), &centroid);
        let factor = if self.total_executions == 0 {
            1.0
        } else {
            self.success_rate()
        };
        (similarity * factor).clamp(0.0, 1.0)
    }

    /// Append a signature, evict beyond `window_size`, recompute specialization.
    pub fn absorb(&mut self, signature: TaskSignature, window_size: usize) {
        self.signatures.push_back(signature);
        while self.signatures.len() > window_size.max(1) {
            self.signatures.pop_front();
        }
        self.last_used = Utc::now();
        self.recompute_specialization();
    }

    /// `1 - min(2 * mean per-dimension variance, 1)` over the window.
    fn recompute_specialization(&mut self) {
        if self.signatures.len() < 2 {
            return;
        }
        let Some(centroid) = self.centroid() else {
            return;
        };
        let n = self.signatures.len() as f64;
        let mut variance = [0.0; SIGNATURE_DIMENSIONS];
        for sig in &self.signatures {
            for ((acc, v), mean) in variance.iter_mut().zip(sig.to_vector()).zip(centroid) {
                *acc += (v - mean).powi(2);
            }
        }
        let mean_variance =
            variance.iter().map(|v| v / n).sum::<f64>() / SIGNATURE_DIMENSIONS as f64;
        self.specialization_strength = 1.0 - (mean_variance * 2.0).min(1.0);
    }

    /// Update counters and the EMA of quality. The first execution seeds it.
    pub fn record_execution(&mut self, success: bool, quality: f64, learning_rate: f64) {
        let quality = quality.clamp(0.0, 1.0);
        self.total_executions += 1;
        if success {
            self.success_count += 1;
        } else {
            self.failure_count += 1;
        }
        if self.total_executions == 1 {
            self.avg_quality = quality;
        } else {
            self.avg_quality = (1.0 - learning_rate) * self.avg_quality + learning_rate * quality;
        }
        self.last_used = Utc::now();
    }

    /// Capacity-pruning rank: `avg_quality * success / max(total, 1)`.
    pub fn retention_score(&self) -> f64 {
        self.avg_quality * self.success_count as f64 / self.total_executions.max(1) as f64
    }

    pub fn stats(&self) -> SpecialistStats {
        SpecialistStats {
            id: self.id.clone(),
            executions: self.total_executions,
            success_rate: self.success_rate(),
            avg_quality: self.avg_quality,
            specialization_strength: self.specialization_strength,
            window_len: self.signatures.len(),
        }
    }
}

/// Read-only summary of a specialist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialistStats {
    pub id: String,
    pub executions: u64,
    pub success_rate: f64,
    pub avg_quality: f64,
    pub specialization_strength: f64,
    pub window_len: usize,
}
