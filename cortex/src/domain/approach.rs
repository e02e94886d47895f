// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Approach Pattern Aggregate
//!
//! An approach is a reusable content-generation template: a
//! [`PatternSignature`] describing which tasks it fits, a
//! [`StyleCharacteristics`] block describing how output should look, and
//! [`PerformanceMetrics`] accumulated from every recorded execution.
//!
//! # Lifecycle
//!
//! - Created from a discovered pattern cluster (or seeded), version 1.
//! - Metrics mutate on every recorded execution.
//! - Evolution produces a *new* approach (`{id}_v{n}`); the parent is untouched.
//! - Pruning flips [`ApproachStatus`] to `Inactive`. Approaches are never
//!   physically destroyed.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Approach model, lineage and validation rules

use chrono::{DateTime, Utc};
use hybrid_swarm_core::domain::task::GENERAL_DOMAIN;
use hybrid_swarm_core::domain::similarity::jaccard;
use hybrid_swarm_core::WeightMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Smoothing factor of the approach quality EMA.
pub const QUALITY_EMA_ALPHA: f64 = 0.1;
/// Samples kept in the bounded quality history.
pub const QUALITY_HISTORY_CAP: usize = 100;
const TREND_WINDOW: usize = 10;
const TREND_THRESHOLD: f64 = 0.05;

/// Which tasks an approach fits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternSignature {
    pub domain_weights: WeightMap,
    pub complexity_min: f64,
    pub complexity_max: f64,
    #[serde(default)]
    pub keyword_patterns: Vec<String>,
    #[serde(default)]
    pub keyword_weights: WeightMap,
    #[serde(default)]
    pub output_types: Vec<String>,
    #[serde(default)]
    pub requires_code: bool,
    #[serde(default)]
    pub requires_examples: bool,
    #[serde(default)]
    pub requires_theory: bool,
}

impl PatternSignature {
    pub fn primary_domain(&self) -> &str {
        self.domain_weights.primary().unwrap_or(GENERAL_DOMAIN)
    }

    /// Similarity between two signatures in [0, 1].
    ///
    /// Mean of: shared domain mass (Σ min over shared domains), complexity
    /// range intersection-over-union, keyword Jaccard and output-type Jaccard.
    /// The two Jaccard terms only take part when either side is non-empty.
    pub fn similarity(&self, other: &PatternSignature) -> f64 {
        let mut scores = vec![
            self.domain_weights.shared_mass(&other.domain_weights),
            range_iou(
                (self.complexity_min, self.complexity_max),
                (other.complexity_min, other.complexity_max),
            ),
        ];
        if let Some(keywords) = jaccard(
            self.keyword_patterns.iter().map(String::as_str),
            other.keyword_patterns.iter().map(String::as_str),
        ) {
            scores.push(keywords);
        }
        if let Some(outputs) = jaccard(
            self.output_types.iter().map(String::as_str),
            other.output_types.iter().map(String::as_str),
        ) {
            scores.push(outputs);
        }
        (scores.iter().sum::<f64>() / scores.len() as f64).clamp(0.0, 1.0)
    }

    pub fn summary(&self) -> SignatureSummary {
        SignatureSummary {
            domains: self.domain_weights.clone(),
            complexity_range: (self.complexity_min, self.complexity_max),
            keywords: self.keyword_patterns.iter().take(5).cloned().collect(),
            output_types: self.output_types.clone(),
        }
    }
}

fn range_iou(a: (f64, f64), b: (f64, f64)) -> f64 {
    let overlap = (a.1.min(b.1) - a.0.max(b.0)).max(0.0);
    let union = a.1.max(b.1) - a.0.min(b.0);
    if union > 0.0 {
        overlap / union
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureType {
    SequentialSteps,
    Hierarchical,
    Bulleted,
    Prose,
}

impl StructureType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StructureType::SequentialSteps => "sequential_steps",
            StructureType::Hierarchical => "hierarchical",
            StructureType::Bulleted => "bulleted",
            StructureType::Prose => "prose",
        }
    }

    /// Human-readable label used in generated approach names.
    pub fn display_name(&self) -> &'static str {
        match self {
            StructureType::SequentialSteps => "Step-by-Step",
            StructureType::Hierarchical => "Structured",
            StructureType::Bulleted => "List-Based",
            StructureType::Prose => "Narrative",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Voice {
    FirstPerson,
    SecondPerson,
    ThirdPerson,
}

impl Voice {
    pub fn as_str(&self) -> &'static str {
        match self {
            Voice::FirstPerson => "first_person",
            Voice::SecondPerson => "second_person",
            Voice::ThirdPerson => "third_person",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthLevel {
    Concise,
    Moderate,
    Comprehensive,
    Exhaustive,
}

impl DepthLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DepthLevel::Concise => "concise",
            DepthLevel::Moderate => "moderate",
            DepthLevel::Comprehensive => "comprehensive",
            DepthLevel::Exhaustive => "exhaustive",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplanationStyle {
    Conceptual,
    Practical,
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExampleDensity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeStyle {
    Minimal,
    Annotated,
    Production,
}

/// How generated output should look.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleCharacteristics {
    pub structure_type: StructureType,
    /// Inclusive (min, max) section count
    pub section_count: (u32, u32),
    pub tone: String,
    pub voice: Voice,
    pub depth_level: DepthLevel,
    pub explanation_style: ExplanationStyle,
    pub example_density: ExampleDensity,
    #[serde(default)]
    pub code_style: Option<CodeStyle>,

    // Organization
    pub use_headers: bool,
    pub use_bullets: bool,
    pub use_numbered_lists: bool,
    pub use_tables: bool,

    // Special elements
    pub include_summary: bool,
    pub include_tldr: bool,
    pub include_prerequisites: bool,
    pub include_next_steps: bool,
}

impl Default for StyleCharacteristics {
    fn default() -> Self {
        Self {
            structure_type: StructureType::Prose,
            section_count: (2, 5),
            tone: "neutral".to_string(),
            voice: Voice::ThirdPerson,
            depth_level: DepthLevel::Moderate,
            explanation_style: ExplanationStyle::Mixed,
            example_density: ExampleDensity::Medium,
            code_style: None,
            use_headers: true,
            use_bullets: false,
            use_numbered_lists: false,
            use_tables: false,
            include_summary: false,
            include_tldr: false,
            include_prerequisites: false,
            include_next_steps: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTrend {
    New,
    Improving,
    Stable,
    Declining,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualitySample {
    pub timestamp: DateTime<Utc>,
    pub quality: f64,
}

/// Usage and quality statistics of one approach.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub usage_count: u64,
    pub first_used: Option<DateTime<Utc>>,
    pub last_used: Option<DateTime<Utc>>,
    pub avg_quality: f64,
    pub min_quality: f64,
    pub max_quality: f64,
    pub quality_std_dev: f64,
    pub success_count: u64,
    pub failure_count: u64,
    pub success_rate: f64,
    pub recent_quality_trend: QualityTrend,
    pub quality_history: VecDeque<QualitySample>,
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        Self {
            usage_count: 0,
            first_used: None,
            last_used: None,
            avg_quality: 0.0,
            min_quality: 0.0,
            max_quality: 0.0,
            quality_std_dev: 0.0,
            success_count: 0,
            failure_count: 0,
            success_rate: 0.0,
            recent_quality_trend: QualityTrend::New,
            quality_history: VecDeque::new(),
        }
    }
}

impl PerformanceMetrics {
    /// Metrics seeded with an expected quality but no usage.
    pub fn with_expected_quality(quality: f64) -> Self {
        Self {
            avg_quality: quality.clamp(0.0, 1.0),
            ..Self::default()
        }
    }

    /// Fold one execution into the metrics.
    ///
    /// The first sample seeds average, min and max directly; later samples
    /// move the average by an EMA with [`QUALITY_EMA_ALPHA`].
    pub fn record(&mut self, quality: f64, success: bool, now: DateTime<Utc>) {
        let quality = quality.clamp(0.0, 1.0);
        self.usage_count += 1;
        self.first_used.get_or_insert(now);
        self.last_used = Some(now);

        self.quality_history.push_back(QualitySample {
            timestamp: now,
            quality,
        });
        while self.quality_history.len() > QUALITY_HISTORY_CAP {
            self.quality_history.pop_front();
        }

        if self.usage_count == 1 {
            self.avg_quality = quality;
            self.min_quality = quality;
            self.max_quality = quality;
            self.quality_std_dev = 0.0;
        } else {
            self.avg_quality =
                (1.0 - QUALITY_EMA_ALPHA) * self.avg_quality + QUALITY_EMA_ALPHA * quality;
            self.min_quality = self.min_quality.min(quality);
            self.max_quality = self.max_quality.max(quality);
            let n = self.quality_history.len() as f64;
            let variance = self
                .quality_history
                .iter()
                .map(|s| (s.quality - self.avg_quality).powi(2))
                .sum::<f64>()
                / n;
            self.quality_std_dev = variance.sqrt();
        }

        if success {
            self.success_count += 1;
        } else {
            self.failure_count += 1;
        }
        self.success_rate = self.success_count as f64 / self.usage_count as f64;
        self.recent_quality_trend = self.trend();
    }

    /// Last ten samples against the ten before them.
    fn trend(&self) -> QualityTrend {
        let len = self.quality_history.len();
        if len < TREND_WINDOW {
            return QualityTrend::New;
        }
        let mean = |range: std::ops::Range<usize>| {
            let count = range.len() as f64;
            range.map(|i| self.quality_history[i].quality).sum::<f64>() / count
        };
        let recent = mean(len - TREND_WINDOW..len);
        let previous = if len >= 2 * TREND_WINDOW {
            mean(len - 2 * TREND_WINDOW..len - TREND_WINDOW)
        } else {
            recent
        };
        let diff = recent - previous;
        if diff > TREND_THRESHOLD {
            QualityTrend::Improving
        } else if diff < -TREND_THRESHOLD {
            QualityTrend::Declining
        } else {
            QualityTrend::Stable
        }
    }
}

/// Soft-delete state of an approach.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ApproachStatus {
    Active,
    Inactive {
        deactivated_at: DateTime<Utc>,
        reason: String,
    },
}

impl ApproachStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, ApproachStatus::Active)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApproachValidationError {
    #[error("approach id is empty")]
    EmptyId,

    #[error("approach name is empty")]
    EmptyName,

    #[error("approach signature has no domains")]
    NoDomains,

    #[error("invalid complexity range [{min}, {max}]")]
    ComplexityRange { min: f64, max: f64 },

    #[error("invalid section count range ({min}, {max})")]
    SectionRange { min: u32, max: u32 },
}

/// A reusable content-generation approach.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApproachPattern {
    pub id: String,
    pub name: String,
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub signature: PatternSignature,
    pub style: StyleCharacteristics,
    #[serde(default)]
    pub metrics: PerformanceMetrics,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub generation: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    pub status: ApproachStatus,
}

impl ApproachPattern {
    /// A fresh, active, version-1 approach with no lineage.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        signature: PatternSignature,
        style: StyleCharacteristics,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            version: 1,
            created_at: now,
            last_updated: now,
            signature,
            style,
            metrics: PerformanceMetrics::default(),
            parent_id: None,
            generation: 0,
            tags: Vec::new(),
            status: ApproachStatus::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn validate(&self) -> Result<(), ApproachValidationError> {
        if self.id.trim().is_empty() {
            return Err(ApproachValidationError::EmptyId);
        }
        if self.name.trim().is_empty() {
            return Err(ApproachValidationError::EmptyName);
        }
        if self.signature.domain_weights.is_empty() {
            return Err(ApproachValidationError::NoDomains);
        }
        let (min, max) = (self.signature.complexity_min, self.signature.complexity_max);
        if !(0.0..=1.0).contains(&min) || !(0.0..=1.0).contains(&max) || min > max {
            return Err(ApproachValidationError::ComplexityRange { min, max });
        }
        let (smin, smax) = self.style.section_count;
        if smax < smin {
            return Err(ApproachValidationError::SectionRange {
                min: smin,
                max: smax,
            });
        }
        Ok(())
    }

    /// Guidance handed to the content generator alongside the approach id.
    pub fn metadata(&self) -> ApproachMetadata {
        ApproachMetadata {
            name: self.name.clone(),
            signature: self.signature.summary(),
            style: StyleSummary {
                structure: self.style.structure_type,
                tone: self.style.tone.clone(),
                voice: self.style.voice,
                depth: self.style.depth_level,
                use_code: self.signature.requires_code,
                use_examples: self.signature.requires_examples,
            },
            expected_quality: self.metrics.avg_quality,
        }
    }

    pub fn performance(&self) -> ApproachPerformance {
        ApproachPerformance {
            id: self.id.clone(),
            name: self.name.clone(),
            usage_count: self.metrics.usage_count,
            avg_quality: self.metrics.avg_quality,
            min_quality: self.metrics.min_quality,
            max_quality: self.metrics.max_quality,
            quality_std_dev: self.metrics.quality_std_dev,
            success_rate: self.metrics.success_rate,
            recent_trend: self.metrics.recent_quality_trend,
            version: self.version,
            generation: self.generation,
            active: self.is_active(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureSummary {
    pub domains: WeightMap,
    pub complexity_range: (f64, f64),
    pub keywords: Vec<String>,
    pub output_types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleSummary {
    pub structure: StructureType,
    pub tone: String,
    pub voice: Voice,
    pub depth: DepthLevel,
    pub use_code: bool,
    pub use_examples: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApproachMetadata {
    pub name: String,
    pub signature: SignatureSummary,
    pub style: StyleSummary,
    pub expected_quality: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApproachPerformance {
    pub id: String,
    pub name: String,
    pub usage_count: u64,
    pub avg_quality: f64,
    pub min_quality: f64,
    pub max_quality: f64,
    pub quality_std_dev: f64,
    pub success_rate: f64,
    pub recent_trend: QualityTrend,
    pub version: u32,
    pub generation: u32,
    pub active: bool,
}
