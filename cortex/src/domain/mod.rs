// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Cortex domain model: approaches, matching, execution records, clusters.

pub mod approach;
pub mod cluster;
pub mod execution;
pub mod matching;
pub mod repository;

pub use approach::{
    ApproachMetadata, ApproachPattern, ApproachPerformance, ApproachStatus,
    ApproachValidationError, CodeStyle, DepthLevel, ExampleDensity, ExplanationStyle,
    PatternSignature, PerformanceMetrics, QualitySample, QualityTrend, SignatureSummary,
    StructureType, StyleCharacteristics, StyleSummary, Voice,
};
pub use cluster::{ClusterSummary, PatternCluster};
pub use execution::{DateRange, ExecutionRecord, LedgerIndex, LedgerStatistics};
pub use matching::{match_score, MatchBreakdown};
pub use repository::{ApproachRepository, ExecutionRecordStore};
