// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! External Collaborator Contracts
//!
//! The coordination engine consumes three collaborators it never looks inside:
//!
//! | Trait | Input | Output |
//! |-------|-------|--------|
//! | [`DescriptorExtractor`] | raw prompt | [`TaskDescriptor`] |
//! | [`ContentAnalyzer`] | generated text | [`ContentFeatures`] |
//! | [`IdentifierSanitizer`] | raw identifier | safe identifier |
//!
//! Implementations are injected through constructors as `Arc<dyn Trait>`.
//!
//! [`IdentifierSanitizer`]: crate::domain::identifier_sanitizer::IdentifierSanitizer

use serde::{Deserialize, Serialize};

use super::task::TaskDescriptor;

/// Structural features extracted from generated content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentFeatures {
    #[serde(default)]
    pub section_count: u32,
    #[serde(default)]
    pub has_code_blocks: bool,
    #[serde(default)]
    pub code_block_count: u32,
    #[serde(default)]
    pub has_numbered_list: bool,
    #[serde(default)]
    pub has_bullets: bool,
    #[serde(default)]
    pub has_tables: bool,
    #[serde(default)]
    pub total_length: u64,
    #[serde(default)]
    pub avg_section_length: f64,
    #[serde(default = "default_tone")]
    pub detected_tone: String,
    /// 0 = casual, 1 = formal
    #[serde(default)]
    pub formality_score: f64,
    #[serde(default)]
    pub explanation_ratio: f64,
    #[serde(default)]
    pub example_ratio: f64,
    #[serde(default)]
    pub code_ratio: f64,
}

fn default_tone() -> String {
    "neutral".to_string()
}

impl Default for ContentFeatures {
    fn default() -> Self {
        Self {
            section_count: 0,
            has_code_blocks: false,
            code_block_count: 0,
            has_numbered_list: false,
            has_bullets: false,
            has_tables: false,
            total_length: 0,
            avg_section_length: 0.0,
            detected_tone: default_tone(),
            formality_score: 0.5,
            explanation_ratio: 0.0,
            example_ratio: 0.0,
            code_ratio: 0.0,
        }
    }
}

/// Turns a raw prompt into a structured task descriptor.
pub trait DescriptorExtractor: Send + Sync {
    fn extract(&self, task_id: &str, prompt: &str) -> TaskDescriptor;
}

/// Extracts structural features from generated content.
pub trait ContentAnalyzer: Send + Sync {
    fn analyze(&self, content: &str) -> ContentFeatures;
}
