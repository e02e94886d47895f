// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Weight Maps
//!
//! Keyed non-negative weights used for task domains and approach keywords.
//! Backed by a `BTreeMap` so iteration (and therefore every derived score)
//! is deterministic regardless of insertion order.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Explicit merge/normalize semantics for label → weight mappings

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Label → weight mapping with deterministic ordering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightMap(BTreeMap<String, f64>);

impl WeightMap {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Insert a weight. Negative and non-finite weights are stored as 0.
    pub fn insert(&mut self, label: impl Into<String>, weight: f64) {
        let weight = if weight.is_finite() { weight.max(0.0) } else { 0.0 };
        self.0.insert(label.into(), weight);
    }

    /// Add to an existing weight, inserting when absent.
    pub fn accumulate(&mut self, label: &str, amount: f64) {
        *self.0.entry(label.to_string()).or_insert(0.0) += amount.max(0.0);
    }

    pub fn get(&self, label: &str) -> f64 {
        self.0.get(label).copied().unwrap_or(0.0)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.0.contains_key(label)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    /// Label with the highest weight. Ties resolve to the lexicographically
    /// smallest label.
    pub fn primary(&self) -> Option<&str> {
        let mut best: Option<(&str, f64)> = None;
        for (label, weight) in self.iter() {
            match best {
                Some((_, w)) if weight <= w => {}
                _ => best = Some((label, weight)),
            }
        }
        best.map(|(label, _)| label)
    }

    /// Scale so the weights sum to 1. A map with zero total is returned as-is.
    pub fn normalized(&self) -> Self {
        let total = self.total();
        if total <= 0.0 {
            return self.clone();
        }
        Self(self.0.iter().map(|(k, v)| (k.clone(), v / total)).collect())
    }

    /// Blend `other` into the labels already present in `self`:
    /// `keep * self + (1 - keep) * other`. Labels only present in `other`
    /// are ignored.
    pub fn blend_existing(&self, other: &WeightMap, keep: f64) -> Self {
        let keep = keep.clamp(0.0, 1.0);
        Self(
            self.0
                .iter()
                .map(|(k, v)| (k.clone(), keep * v + (1.0 - keep) * other.get(k)))
                .collect(),
        )
    }

    /// Weighted Jaccard overlap: Σ min / Σ max over the union of labels.
    /// 1.0 for identical maps, 0.0 for disjoint or empty maps.
    pub fn overlap(&self, other: &WeightMap) -> f64 {
        if self.is_empty() || other.is_empty() {
            return 0.0;
        }
        let union: BTreeSet<&str> = self.labels().chain(other.labels()).collect();
        let mut sum_min = 0.0;
        let mut sum_max = 0.0;
        for label in union {
            let (a, b) = (self.get(label), other.get(label));
            sum_min += a.min(b);
            sum_max += a.max(b);
        }
        if sum_max <= 0.0 {
            return 0.0;
        }
        (sum_min / sum_max).clamp(0.0, 1.0)
    }

    /// Σ min over shared labels, without normalization.
    pub fn shared_mass(&self, other: &WeightMap) -> f64 {
        self.iter()
            .filter(|(label, _)| other.contains(label))
            .map(|(label, w)| w.min(other.get(label)))
            .sum()
    }

    /// The `n` heaviest labels, heaviest first (ties by label).
    pub fn top(&self, n: usize) -> Vec<(String, f64)> {
        let mut entries: Vec<(String, f64)> =
            self.0.iter().map(|(k, v)| (k.clone(), *v)).collect();
        entries.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        entries.truncate(n);
        entries
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for WeightMap {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut map = WeightMap::new();
        for (label, weight) in iter {
            map.insert(label, weight);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_breaks_ties_lexicographically() {
        let map: WeightMap = [("writing", 0.5), ("research", 0.5), ("coding", 0.1)]
            .into_iter()
            .collect();
        assert_eq!(map.primary(), Some("research"));
        assert_eq!(WeightMap::new().primary(), None);
    }

    #[test]
    fn test_normalized_sums_to_one() {
        let map: WeightMap = [("a", 2.0), ("b", 6.0)].into_iter().collect();
        let norm = map.normalized();
        assert!((norm.total() - 1.0).abs() < 1e-9);
        assert!((norm.get("b") - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_overlap_identical_and_disjoint() {
        let a: WeightMap = [("research", 0.8), ("writing", 0.2)].into_iter().collect();
        let b: WeightMap = [("coding", 1.0)].into_iter().collect();
        assert!((a.overlap(&a) - 1.0).abs() < 1e-9);
        assert_eq!(a.overlap(&b), 0.0);
        assert_eq!(a.overlap(&WeightMap::new()), 0.0);
    }

    #[test]
    fn test_overlap_partial() {
        let a: WeightMap = [("research", 0.8), ("writing", 0.2)].into_iter().collect();
        let b: WeightMap = [("research", 0.4), ("coding", 0.6)].into_iter().collect();
        // min: 0.4, max: 0.8 + 0.2 + 0.6
        assert!((a.overlap(&b) - 0.4 / 1.6).abs() < 1e-9);
    }

    #[test]
    fn test_blend_existing_ignores_new_labels() {
        let old: WeightMap = [("research", 1.0)].into_iter().collect();
        let new: WeightMap = [("research", 0.5), ("coding", 0.5)].into_iter().collect();
        let blended = old.blend_existing(&new, 0.8);
        assert!((blended.get("research") - 0.9).abs() < 1e-9);
        assert!(!blended.contains("coding"));
    }

    #[test]
    fn test_negative_weights_clamped() {
        let mut map = WeightMap::new();
        map.insert("x", -3.0);
        assert_eq!(map.get("x"), 0.0);
    }
}
