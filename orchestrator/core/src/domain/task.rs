// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Task Descriptor
//!
//! The structured description of an incoming task that every coordination
//! decision is made from. Produced by a [`DescriptorExtractor`] from a raw
//! prompt; this crate never inspects the prompt itself.
//!
//! [`DescriptorExtractor`]: crate::domain::collaborators::DescriptorExtractor

use serde::{Deserialize, Serialize};

use super::weights::WeightMap;

/// Domain reported when a task carries no domain weights.
pub const GENERAL_DOMAIN: &str = "general";

fn default_input_type() -> String {
    "text".to_string()
}

/// Structured task descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDescriptor {
    pub id: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub domain_weights: WeightMap,

    /// Complexity in [0, 1]
    pub complexity: f64,

    #[serde(default)]
    pub keywords: Vec<String>,

    pub output_type: String,

    /// Estimated duration in abstract units; normalized by /10 when encoded
    #[serde(default)]
    pub estimated_duration: f64,

    #[serde(default = "default_input_type")]
    pub input_type: String,
}

impl TaskDescriptor {
    pub fn new(id: impl Into<String>, output_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: String::new(),
            domain_weights: WeightMap::new(),
            complexity: 0.5,
            keywords: Vec::new(),
            output_type: output_type.into(),
            estimated_duration: 0.0,
            input_type: default_input_type(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>, weight: f64) -> Self {
        self.domain_weights.insert(domain, weight);
        self
    }

    pub fn with_complexity(mut self, complexity: f64) -> Self {
        self.complexity = complexity.clamp(0.0, 1.0);
        self
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_estimated_duration(mut self, duration: f64) -> Self {
        self.estimated_duration = duration.max(0.0);
        self
    }

    pub fn with_input_type(mut self, input_type: impl Into<String>) -> Self {
        self.input_type = input_type.into();
        self
    }

    /// Highest-weighted domain, or `general` when none are set.
    pub fn primary_domain(&self) -> &str {
        self.domain_weights.primary().unwrap_or(GENERAL_DOMAIN)
    }

    /// Complexity clamped to [0, 1].
    pub fn clamped_complexity(&self) -> f64 {
        if self.complexity.is_finite() {
            self.complexity.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}
