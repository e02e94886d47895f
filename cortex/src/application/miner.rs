// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Pattern Miner - discovers recurring successful patterns in the ledger
//!
//! Successful executions are turned into sparse feature maps and grouped by
//! a greedy single pass: each unassigned record seeds a cluster and pulls in
//! every later unassigned record whose cosine similarity to the seed reaches
//! the threshold. Clusters below the minimum size are dropped.
//!
//! Clustering is quadratic in the number of records and runs on the
//! blocking pool.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Discovery, signature/style extraction and novelty checks

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use hybrid_swarm_core::domain::config::DiscoveryConfig;
use hybrid_swarm_core::domain::similarity::{sparse_cosine, std_dev};
use hybrid_swarm_core::infrastructure::json_store::write_json_atomic;
use hybrid_swarm_core::{ContentFeatures, WeightMap};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use super::ledger::{ExecutionLedger, LedgerQuery};
use crate::domain::cluster::CONSISTENCY_STD_DEV;
use crate::domain::{
    ApproachPattern, ClusterSummary, CodeStyle, DepthLevel, ExampleDensity, ExecutionRecord,
    ExplanationStyle, PatternCluster, PatternSignature, StructureType, StyleCharacteristics, Voice,
};

pub const REPORT_FILE: &str = "discovered_patterns.json";

const KNOWN_DOMAINS: [&str; 6] = ["research", "writing", "coding", "review", "comparison", "analysis"];
const KNOWN_OUTPUTS: [&str; 6] = ["tutorial", "code", "explanation", "list", "comparison", "report"];
const TOP_KEYWORDS: usize = 10;
const TOP_OUTPUTS: usize = 3;

/// Persisted summary of the latest discovery run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryReport {
    pub discovered_at: DateTime<Utc>,
    pub cluster_count: usize,
    pub clusters: Vec<ClusterSummary>,
}

pub struct PatternMiner {
    ledger: Arc<ExecutionLedger>,
    config: DiscoveryConfig,
    report_dir: Option<PathBuf>,
}

impl PatternMiner {
    pub fn new(ledger: Arc<ExecutionLedger>, config: DiscoveryConfig) -> Self {
        Self {
            ledger,
            config,
            report_dir: None,
        }
    }

    /// Also write a [`DiscoveryReport`] into `dir` after every run.
    pub fn with_report_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.report_dir = Some(dir.into());
        self
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Cluster successful executions from the lookback window.
    ///
    /// Returns an empty list when there are fewer qualifying records than
    /// the minimum cluster size.
    pub async fn discover(&self) -> Result<Vec<PatternCluster>> {
        let query = LedgerQuery::new()
            .since(Utc::now() - Duration::days(self.config.lookback_days))
            .min_quality(self.config.min_quality);
        let records = self
            .ledger
            .query(&query)
            .await
            .context("Failed to read execution ledger")?;

        if records.len() < self.config.min_cluster_size {
            debug!(
                records = records.len(),
                min_cluster_size = self.config.min_cluster_size,
                "Not enough successful executions for discovery"
            );
            return Ok(Vec::new());
        }

        info!(records = records.len(), "Analyzing successful executions");
        let threshold = self.config.similarity_threshold;
        let min_size = self.config.min_cluster_size;
        let clusters = tokio::task::spawn_blocking(move || cluster(records, threshold, min_size))
            .await
            .context("Clustering task failed")?;
        info!(clusters = clusters.len(), "Pattern discovery finished");

        if let Some(dir) = &self.report_dir {
            let report = DiscoveryReport {
                discovered_at: Utc::now(),
                cluster_count: clusters.len(),
                clusters: clusters.iter().map(PatternCluster::summary).collect(),
            };
            write_json_atomic(&dir.join(REPORT_FILE), &report)
                .await
                .context("Failed to write discovery report")?;
        }
        Ok(clusters)
    }
}

/// Sparse feature map of one execution.
pub fn feature_vector(record: &ExecutionRecord) -> BTreeMap<String, f64> {
    let mut features = BTreeMap::new();
    for domain in KNOWN_DOMAINS {
        features.insert(
            format!("domain_{domain}"),
            record.task.domain_weights.get(domain),
        );
    }
    features.insert("complexity".to_string(), record.task.complexity);
    for output in KNOWN_OUTPUTS {
        let hit = if record.task.output_type == output { 1.0 } else { 0.0 };
        features.insert(format!("output_{output}"), hit);
    }

    if let Some(cf) = &record.content_features {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        features.insert("has_code".to_string(), flag(cf.has_code_blocks));
        features.insert("has_numbered_list".to_string(), flag(cf.has_numbered_list));
        features.insert("has_bullets".to_string(), flag(cf.has_bullets));
        features.insert(
            "section_count".to_string(),
            (cf.section_count as f64 / 10.0).min(1.0),
        );
        features.insert("code_ratio".to_string(), cf.code_ratio);
        features.insert("explanation_ratio".to_string(), cf.explanation_ratio);
        features.insert("example_ratio".to_string(), cf.example_ratio);
        features.insert("formality".to_string(), cf.formality_score);
    }
    features
}

/// Greedy threshold clustering. Records keep their input order inside each
/// cluster; kept clusters are numbered `cluster_0`, `cluster_1`, ...
pub fn cluster(
    records: Vec<ExecutionRecord>,
    threshold: f64,
    min_size: usize,
) -> Vec<PatternCluster> {
    let features: Vec<BTreeMap<String, f64>> = records.iter().map(feature_vector).collect();
    let mut used = vec![false; records.len()];
    let mut groups: Vec<Vec<usize>> = Vec::new();

    for i in 0..records.len() {
        if used[i] {
            continue;
        }
        used[i] = true;
        let mut members = vec![i];
        for j in (i + 1)..records.len() {
            if !used[j] && sparse_cosine(&features[i], &features[j]) >= threshold {
                used[j] = true;
                members.push(j);
            }
        }
        if members.len() >= min_size.max(1) {
            groups.push(members);
        }
    }

    let mut slots: Vec<Option<ExecutionRecord>> = records.into_iter().map(Some).collect();
    groups
        .into_iter()
        .enumerate()
        .map(|(n, members)| {
            let member_features: Vec<&BTreeMap<String, f64>> =
                members.iter().map(|&i| &features[i]).collect();
            let member_records: Vec<ExecutionRecord> =
                members.iter().filter_map(|&i| slots[i].take()).collect();
            analyze_cluster(format!("cluster_{n}"), member_records, &member_features)
        })
        .collect()
}

fn analyze_cluster(
    cluster_id: String,
    records: Vec<ExecutionRecord>,
    features: &[&BTreeMap<String, f64>],
) -> PatternCluster {
    let qualities: Vec<f64> = records.iter().map(|r| r.actual_quality).collect();
    let avg_quality = qualities.iter().sum::<f64>() / qualities.len().max(1) as f64;
    let quality_std_dev = std_dev(&qualities);

    // Missing keys count as zero.
    let mut centroid: BTreeMap<String, f64> = BTreeMap::new();
    for f in features {
        for (k, v) in f.iter() {
            *centroid.entry(k.clone()).or_insert(0.0) += v;
        }
    }
    let n = features.len().max(1) as f64;
    for v in centroid.values_mut() {
        *v /= n;
    }

    PatternCluster {
        cluster_id,
        records,
        centroid,
        avg_quality,
        quality_std_dev,
        is_consistent: quality_std_dev < CONSISTENCY_STD_DEV,
    }
}

/// Items ranked by frequency; ties keep first-seen order.
fn ranked<T: PartialEq + Clone>(items: impl IntoIterator<Item = T>) -> Vec<(T, usize)> {
    let mut counts: Vec<(T, usize)> = Vec::new();
    for item in items {
        match counts.iter_mut().find(|(seen, _)| *seen == item) {
            Some((_, count)) => *count += 1,
            None => counts.push((item, 1)),
        }
    }
    // stable sort keeps insertion order among equal counts
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

fn majority(count: usize, total: usize) -> bool {
    total > 0 && count as f64 / total as f64 > 0.5
}

fn count_with_features(records: &[ExecutionRecord], pred: impl Fn(&ContentFeatures) -> bool) -> usize {
    records
        .iter()
        .filter(|r| r.content_features.as_ref().is_some_and(&pred))
        .count()
}

fn mean_of(features: &[&ContentFeatures], f: impl Fn(&ContentFeatures) -> f64) -> f64 {
    features.iter().map(|c| f(c)).sum::<f64>() / features.len().max(1) as f64
}

fn share_of(features: &[&ContentFeatures], pred: impl Fn(&ContentFeatures) -> bool) -> bool {
    majority(features.iter().filter(|c| pred(c)).count(), features.len())
}

/// Signature describing the tasks in `cluster`.
pub fn extract_signature(cluster: &PatternCluster) -> PatternSignature {
    let records = &cluster.records;
    let total = records.len();

    let mut domains = WeightMap::new();
    for record in records {
        for (domain, weight) in record.task.domain_weights.iter() {
            domains.accumulate(domain, weight * record.actual_quality);
        }
    }

    let complexities = records.iter().map(|r| r.task.complexity);
    let lo = complexities.clone().fold(f64::INFINITY, f64::min);
    let hi = complexities.fold(f64::NEG_INFINITY, f64::max);
    let (lo, hi) = if lo.is_finite() && hi.is_finite() {
        (lo, hi)
    } else {
        (0.0, 1.0)
    };
    let span = hi - lo;

    let keywords: Vec<(String, usize)> = ranked(
        records
            .iter()
            .flat_map(|r| r.task.keywords.iter().cloned()),
    )
    .into_iter()
    .take(TOP_KEYWORDS)
    .collect();
    let keyword_weights: WeightMap = keywords
        .iter()
        .map(|(k, count)| (k.clone(), *count as f64 / total.max(1) as f64))
        .collect();

    let output_types = ranked(records.iter().map(|r| r.task.output_type.clone()))
        .into_iter()
        .take(TOP_OUTPUTS)
        .map(|(o, _)| o)
        .collect();

    let with_code = count_with_features(records, |c| c.has_code_blocks);
    let with_examples = count_with_features(records, |c| c.example_ratio > 0.3);
    let with_theory = count_with_features(records, |c| c.explanation_ratio > 0.4);

    PatternSignature {
        domain_weights: domains.normalized(),
        complexity_min: (lo - span * 0.1).max(0.0),
        complexity_max: (hi + span * 0.1).min(1.0),
        keyword_patterns: keywords.into_iter().map(|(k, _)| k).collect(),
        keyword_weights,
        output_types,
        requires_code: majority(with_code, total),
        requires_examples: majority(with_examples, total),
        requires_theory: majority(with_theory, total),
    }
}

/// Style shared by the outputs in `cluster`. Falls back to the default style
/// when no record carries content features.
pub fn extract_style(cluster: &PatternCluster) -> StyleCharacteristics {
    let features: Vec<&ContentFeatures> = cluster
        .records
        .iter()
        .filter_map(|r| r.content_features.as_ref())
        .collect();
    if features.is_empty() {
        return StyleCharacteristics::default();
    }

    let structure_type = ranked(features.iter().map(|c| {
        if c.has_numbered_list {
            StructureType::SequentialSteps
        } else if c.has_bullets {
            StructureType::Bulleted
        } else if c.section_count >= 4 {
            StructureType::Hierarchical
        } else {
            StructureType::Prose
        }
    }))
    .first()
    .map(|(s, _)| *s)
    .unwrap_or(StructureType::Prose);

    let sections = features.iter().map(|c| c.section_count);
    let section_count = (
        sections.clone().min().unwrap_or(0),
        sections.max().unwrap_or(0),
    );

    let tone = ranked(features.iter().map(|c| c.detected_tone.clone()))
        .first()
        .map(|(t, _)| t.clone())
        .unwrap_or_else(|| "neutral".to_string());

    let formality = mean_of(&features, |c| c.formality_score);
    let voice = if formality > 0.7 {
        Voice::ThirdPerson
    } else if formality < 0.3 {
        Voice::FirstPerson
    } else {
        Voice::SecondPerson
    };

    let length = mean_of(&features, |c| c.total_length as f64);
    let depth_level = if length < 1000.0 {
        DepthLevel::Concise
    } else if length < 3000.0 {
        DepthLevel::Moderate
    } else if length < 5000.0 {
        DepthLevel::Comprehensive
    } else {
        DepthLevel::Exhaustive
    };

    let explanation = mean_of(&features, |c| c.explanation_ratio);
    let example = mean_of(&features, |c| c.example_ratio);
    let explanation_style = if explanation > 0.6 {
        ExplanationStyle::Conceptual
    } else if example > 0.4 {
        ExplanationStyle::Practical
    } else {
        ExplanationStyle::Mixed
    };
    let example_density = if example < 0.2 {
        ExampleDensity::Low
    } else if example < 0.4 {
        ExampleDensity::Medium
    } else {
        ExampleDensity::High
    };

    let code = mean_of(&features, |c| c.code_ratio);
    let code_style = if code < 0.05 {
        None
    } else if code < 0.2 {
        Some(CodeStyle::Minimal)
    } else if code < 0.4 {
        Some(CodeStyle::Annotated)
    } else {
        Some(CodeStyle::Production)
    };

    StyleCharacteristics {
        structure_type,
        section_count,
        include_prerequisites: tone == "educational",
        tone,
        voice,
        depth_level,
        explanation_style,
        example_density,
        code_style,
        use_headers: share_of(&features, |c| c.section_count > 1),
        use_bullets: share_of(&features, |c| c.has_bullets),
        use_numbered_lists: share_of(&features, |c| c.has_numbered_list),
        use_tables: share_of(&features, |c| c.has_tables),
        include_summary: true,
        include_tldr: false,
        include_next_steps: structure_type == StructureType::SequentialSteps,
    }
}

/// `true` unless some approach's signature is more than `threshold` similar.
pub fn is_novel(signature: &PatternSignature, approaches: &[ApproachPattern], threshold: f64) -> bool {
    approaches
        .iter()
        .all(|a| signature.similarity(&a.signature) <= threshold)
}

/// Novelty of a cluster against existing approaches.
pub fn check_novelty(cluster: &PatternCluster, approaches: &[ApproachPattern], threshold: f64) -> bool {
    is_novel(&extract_signature(cluster), approaches, threshold)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::infrastructure::InMemoryExecutionRecordStore;
    use hybrid_swarm_core::TaskDescriptor;

    pub(crate) fn tutorial_record(n: usize, quality: f64) -> ExecutionRecord {
        ExecutionRecord::new(
            TaskDescriptor::new(format!("tut_{n}"), "tutorial")
                .with_domain("coding", 0.8)
                .with_domain("writing", 0.4)
                .with_complexity(0.4 + (n % 3) as f64 * 0.1)
                .with_keywords(["python", "tutorial"]),
            "specialist_a",
            "legacy_approach_B_tutorial",
            0.8,
            quality,
            true,
        )
        .with_content_features(Some(ContentFeatures {
            section_count: 5,
            has_code_blocks: true,
            code_block_count: 3,
            has_numbered_list: true,
            total_length: 2400,
            detected_tone: "educational".into(),
            formality_score: 0.5,
            explanation_ratio: 0.3,
            example_ratio: 0.5,
            code_ratio: 0.25,
            ..ContentFeatures::default()
        }))
    }

    pub(crate) fn report_record(n: usize, quality: f64) -> ExecutionRecord {
        ExecutionRecord::new(
            TaskDescriptor::new(format!("rep_{n}"), "report")
                .with_domain("research", 0.9)
                .with_domain("analysis", 0.6)
                .with_complexity(0.8)
                .with_keywords(["market", "analysis"]),
            "specialist_b",
            "legacy_approach_A_comprehensive",
            0.8,
            quality,
            true,
        )
    }

    #[test]
    fn test_feature_vector_known_keys() {
        let f = feature_vector(&tutorial_record(0, 0.9));
        assert_eq!(f["domain_coding"], 0.8);
        assert_eq!(f["domain_research"], 0.0);
        assert_eq!(f["output_tutorial"], 1.0);
        assert_eq!(f["section_count"], 0.5);
        assert_eq!(f.len(), 6 + 1 + 6 + 8);

        let bare = feature_vector(&report_record(0, 0.9));
        assert_eq!(bare.len(), 13);
        assert!(!bare.contains_key("has_code"));
    }

    #[test]
    fn test_cluster_separates_groups_and_drops_small() {
        let mut records: Vec<ExecutionRecord> = Vec::new();
        for n in 0..12 {
            records.push(tutorial_record(n, 0.9));
            if n < 4 {
                records.push(report_record(n, 0.85));
            }
        }
        let clusters = cluster(records, 0.65, 10);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].cluster_id, "cluster_0");
        assert_eq!(clusters[0].size(), 12);
        assert!(clusters[0].is_consistent);
        assert!((clusters[0].avg_quality - 0.9).abs() < 1e-9);
        assert_eq!(clusters[0].records[0].task.id, "tut_0");
    }

    #[test]
    fn test_centroid_averages_missing_as_zero() {
        let records = vec![tutorial_record(0, 0.9), report_record(0, 0.9)];
        let clusters = cluster(records, 0.0, 2);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].centroid["has_code"], 0.5);
        assert!((clusters[0].centroid["domain_research"] - 0.45).abs() < 1e-9);
    }

    #[test]
    fn test_extract_signature_and_style() {
        let records: Vec<ExecutionRecord> = (0..10).map(|n| tutorial_record(n, 0.9)).collect();
        let clusters = cluster(records, 0.65, 10);
        let sig = extract_signature(&clusters[0]);

        assert_eq!(sig.primary_domain(), "coding");
        assert!((sig.domain_weights.total() - 1.0).abs() < 1e-9);
        // complexities span 0.4..0.6, widened by 10% of the span
        assert!((sig.complexity_min - 0.38).abs() < 1e-9);
        assert!((sig.complexity_max - 0.62).abs() < 1e-9);
        assert_eq!(sig.keyword_patterns, vec!["python", "tutorial"]);
        assert_eq!(sig.keyword_weights.get("python"), 1.0);
        assert_eq!(sig.output_types, vec!["tutorial"]);
        assert!(sig.requires_code);
        assert!(sig.requires_examples);
        assert!(!sig.requires_theory);

        let style = extract_style(&clusters[0]);
        assert_eq!(style.structure_type, StructureType::SequentialSteps);
        assert_eq!(style.section_count, (5, 5));
        assert_eq!(style.tone, "educational");
        assert_eq!(style.voice, Voice::SecondPerson);
        assert_eq!(style.depth_level, DepthLevel::Moderate);
        assert_eq!(style.explanation_style, ExplanationStyle::Practical);
        assert_eq!(style.example_density, ExampleDensity::High);
        assert_eq!(style.code_style, Some(CodeStyle::Annotated));
        assert!(style.include_prerequisites);
        assert!(style.include_next_steps);
        assert!(style.use_numbered_lists);
    }

    #[test]
    fn test_style_defaults_without_features() {
        let records: Vec<ExecutionRecord> = (0..3).map(|n| report_record(n, 0.9)).collect();
        let clusters = cluster(records, 0.5, 3);
        assert_eq!(extract_style(&clusters[0]), StyleCharacteristics::default());
    }

    #[test]
    fn test_novelty_against_identical_signature() {
        let records: Vec<ExecutionRecord> = (0..10).map(|n| tutorial_record(n, 0.9)).collect();
        let clusters = cluster(records, 0.65, 10);
        let sig = extract_signature(&clusters[0]);
        let existing = ApproachPattern::new("a", "A", sig.clone(), StyleCharacteristics::default());
        assert!(!check_novelty(&clusters[0], &[existing], 0.85));
        assert!(is_novel(&sig, &[], 0.85));
    }

    #[tokio::test]
    async fn test_discover_requires_minimum_records_and_writes_report() {
        let ledger = Arc::new(ExecutionLedger::new(Arc::new(
            InMemoryExecutionRecordStore::new(),
        )));
        let dir = tempfile::tempdir().unwrap();
        let miner = PatternMiner::new(ledger.clone(), DiscoveryConfig::default())
            .with_report_dir(dir.path());

        for n in 0..5 {
            ledger.append(&tutorial_record(n, 0.9)).await.unwrap();
        }
        assert!(miner.discover().await.unwrap().is_empty());
        assert!(!dir.path().join(REPORT_FILE).exists());

        for n in 5..12 {
            ledger.append(&tutorial_record(n, 0.9)).await.unwrap();
        }
        // below min_quality, ignored
        ledger.append(&tutorial_record(99, 0.3)).await.unwrap();

        let clusters = miner.discover().await.unwrap();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].size(), 12);

        let report: DiscoveryReport = serde_json::from_slice(
            &tokio::fs::read(dir.path().join(REPORT_FILE)).await.unwrap(),
        )
        .unwrap();
        assert_eq!(report.cluster_count, 1);
        assert_eq!(report.clusters[0].size, 12);
    }
}
