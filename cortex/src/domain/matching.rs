// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Task → approach match scoring.
//!
//! | Component | Weight |
//! |-----------|--------|
//! | domain overlap | 0.4 |
//! | complexity fit | 0.2 |
//! | keyword match | 0.2 |
//! | output match | 0.2 |

use hybrid_swarm_core::{TaskDescriptor, WeightMap};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::approach::PatternSignature;

const DOMAIN_WEIGHT: f64 = 0.4;
const COMPLEXITY_WEIGHT: f64 = 0.2;
const KEYWORD_WEIGHT: f64 = 0.2;
const OUTPUT_WEIGHT: f64 = 0.2;

/// Per-component scores behind a match.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchBreakdown {
    pub domain: f64,
    pub complexity: f64,
    pub keywords: f64,
    pub output: f64,
}

impl MatchBreakdown {
    pub fn compute(task: &TaskDescriptor, signature: &PatternSignature) -> Self {
        Self {
            domain: domain_overlap(&task.domain_weights, &signature.domain_weights),
            complexity: complexity_fit(
                task.complexity,
                signature.complexity_min,
                signature.complexity_max,
            ),
            keywords: keyword_match(&task.keywords, &signature.keyword_weights),
            output: if signature.output_types.iter().any(|o| o == &task.output_type) {
                1.0
            } else {
                0.0
            },
        }
    }

    pub fn total(&self) -> f64 {
        (DOMAIN_WEIGHT * self.domain
            + COMPLEXITY_WEIGHT * self.complexity
            + KEYWORD_WEIGHT * self.keywords
            + OUTPUT_WEIGHT * self.output)
            .clamp(0.0, 1.0)
    }
}

/// Weighted match score in [0, 1].
pub fn match_score(task: &TaskDescriptor, signature: &PatternSignature) -> f64 {
    MatchBreakdown::compute(task, signature).total()
}

pub fn domain_overlap(task: &WeightMap, signature: &WeightMap) -> f64 {
    task.overlap(signature)
}

/// 1.0 inside `[min, max]`, falling linearly to 0 at a distance of 0.5.
pub fn complexity_fit(complexity: f64, min: f64, max: f64) -> f64 {
    let distance = if complexity < min {
        min - complexity
    } else if complexity > max {
        complexity - max
    } else {
        return 1.0;
    };
    (1.0 - 2.0 * distance).max(0.0)
}

/// Share of signature keyword weight found in the task keywords.
/// Exact (case-insensitive) hits earn the full weight, substring hits half.
pub fn keyword_match(task_keywords: &[String], signature_keywords: &WeightMap) -> f64 {
    if task_keywords.is_empty() || signature_keywords.is_empty() {
        return 0.0;
    }
    let task_keywords: BTreeSet<String> = task_keywords.iter().map(|k| k.to_lowercase()).collect();

    let mut total = 0.0;
    let mut matched = 0.0;
    for (keyword, weight) in signature_keywords.iter() {
        total += weight;
        let keyword = keyword.to_lowercase();
        if task_keywords.contains(&keyword) {
            matched += weight;
        } else if task_keywords
            .iter()
            .any(|tk| tk.contains(&keyword) || keyword.contains(tk.as_str()))
        {
            matched += weight * 0.5;
        }
    }
    if total <= 0.0 {
        return 0.0;
    }
    (matched / total).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tutorial_signature() -> PatternSignature {
        PatternSignature {
            domain_weights: [("writing", 0.9), ("coding", 0.7)].into_iter().collect(),
            complexity_min: 0.3,
            complexity_max: 0.8,
            keyword_patterns: vec!["tutorial".into(), "guide".into(), "how to".into()],
            keyword_weights: [("tutorial", 0.9), ("guide", 0.8), ("how to", 0.9)]
                .into_iter()
                .collect(),
            output_types: vec!["tutorial".into(), "guide".into()],
            requires_code: true,
            requires_examples: true,
            requires_theory: false,
        }
    }

    #[test]
    fn test_complexity_fit_inside_and_outside() {
        assert_eq!(complexity_fit(0.3, 0.3, 0.8), 1.0);
        assert_eq!(complexity_fit(0.8, 0.3, 0.8), 1.0);
        assert_eq!(complexity_fit(0.55, 0.3, 0.8), 1.0);
        assert!((complexity_fit(0.9, 0.3, 0.8) - 0.8).abs() < 1e-9);
        assert!((complexity_fit(0.2, 0.3, 0.8) - 0.8).abs() < 1e-9);
        assert_eq!(complexity_fit(0.0, 0.6, 0.8), 0.0);
    }

    #[test]
    fn test_domain_overlap_bounds() {
        let a: WeightMap = [("writing", 0.9), ("coding", 0.7)].into_iter().collect();
        let b: WeightMap = [("research", 1.0)].into_iter().collect();
        assert!((domain_overlap(&a, &a) - 1.0).abs() < 1e-9);
        assert_eq!(domain_overlap(&a, &b), 0.0);
        assert_eq!(domain_overlap(&a, &WeightMap::new()), 0.0);
    }

    #[test]
    fn test_keyword_match_exact_and_partial() {
        let weights: WeightMap = [("tutorial", 1.0), ("guide", 1.0)].into_iter().collect();
        assert_eq!(keyword_match(&["Tutorial".into(), "guide".into()], &weights), 1.0);
        // "tutorials" contains "tutorial": half credit on one of two keywords
        assert!((keyword_match(&["tutorials".into()], &weights) - 0.25).abs() < 1e-9);
        assert_eq!(keyword_match(&[], &weights), 0.0);
    }

    #[test]
    fn test_match_score_full_fit() {
        let task = TaskDescriptor::new("t", "tutorial")
            .with_domain("writing", 0.9)
            .with_domain("coding", 0.7)
            .with_complexity(0.5)
            .with_keywords(["tutorial", "guide", "how to"]);
        let breakdown = MatchBreakdown::compute(&task, &tutorial_signature());
        assert_eq!(breakdown.output, 1.0);
        assert_eq!(breakdown.complexity, 1.0);
        assert!((match_score(&task, &tutorial_signature()) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_match_score_stays_in_unit_interval() {
        let sig = tutorial_signature();
        for complexity in [0.0, 0.25, 0.5, 0.75, 1.0] {
            for output in ["tutorial", "report"] {
                let task = TaskDescriptor::new("t", output)
                    .with_domain("research", 0.4)
                    .with_domain("writing", 1.0)
                    .with_complexity(complexity)
                    .with_keywords(["guide"]);
                let score = match_score(&task, &sig);
                assert!((0.0..=1.0).contains(&score));
            }
        }
    }
}
