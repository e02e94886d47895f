// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Similarity and stable hashing primitives shared by specialist matching and
//! pattern mining.

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Cosine similarity of two equal-length vectors, clamped to [0, 1].
///
/// Returns 0.0 when either vector has zero magnitude or the lengths differ.
pub fn cosine(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)).clamp(0.0, 1.0)
}

/// Cosine similarity over the keys both feature maps share, clamped to [0, 1].
pub fn sparse_cosine(a: &BTreeMap<String, f64>, b: &BTreeMap<String, f64>) -> f64 {
    let shared: Vec<&String> = a.keys().filter(|k| b.contains_key(*k)).collect();
    if shared.is_empty() {
        return 0.0;
    }
    let va: Vec<f64> = shared.iter().map(|k| a[*k]).collect();
    let vb: Vec<f64> = shared.iter().map(|k| b[*k]).collect();
    cosine(&va, &vb)
}

/// Hex SHA-256 digest of `input`.
pub fn stable_hash_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

/// Stable bucket in `0..100` for a categorical label.
///
/// Uses the first eight bytes of the SHA-256 digest so the encoding is
/// identical across processes and platforms.
pub fn stable_bucket(input: &str) -> u64 {
    let digest = Sha256::digest(input.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(prefix) % 100
}

/// `stable_bucket` normalized to [0, 0.99].
pub fn stable_unit(input: &str) -> f64 {
    stable_bucket(input) as f64 / 100.0
}

/// Jaccard index of two label sets. `None` when both sets are empty.
pub fn jaccard<'a, I, J>(a: I, b: J) -> Option<f64>
where
    I: IntoIterator<Item = &'a str>,
    J: IntoIterator<Item = &'a str>,
{
    let a: std::collections::BTreeSet<&str> = a.into_iter().collect();
    let b: std::collections::BTreeSet<&str> = b.into_iter().collect();
    let union = a.union(&b).count();
    if union == 0 {
        return None;
    }
    Some(a.intersection(&b).count() as f64 / union as f64)
}

/// Population standard deviation. 0.0 for fewer than two samples.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_identical_is_one() {
        let v = [0.3, 0.5, 0.1];
        assert!((cosine(&v, &v) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_clamps_negative() {
        assert_eq!(cosine(&[1.0, 0.0], &[-1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_cosine_zero_vector() {
        assert_eq!(cosine(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine(&[1.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_sparse_cosine_uses_shared_keys() {
        let a = BTreeMap::from([("x".to_string(), 1.0), ("y".to_string(), 1.0)]);
        let b = BTreeMap::from([("x".to_string(), 2.0), ("z".to_string(), 5.0)]);
        assert!((sparse_cosine(&a, &b) - 1.0).abs() < 1e-9);
        let c = BTreeMap::from([("q".to_string(), 1.0)]);
        assert_eq!(sparse_cosine(&a, &c), 0.0);
    }

    #[test]
    fn test_stable_bucket_deterministic() {
        assert_eq!(stable_bucket("research"), stable_bucket("research"));
        assert!(stable_bucket("research") < 100);
        assert!(stable_unit("writing") < 1.0);
    }

    #[test]
    fn test_jaccard() {
        assert_eq!(jaccard(["a", "b"], ["b", "c"]), Some(1.0 / 3.0));
        assert_eq!(jaccard(Vec::<&str>::new(), Vec::<&str>::new()), None);
    }

    #[test]
    fn test_std_dev() {
        assert_eq!(std_dev(&[0.5]), 0.0);
        assert!((std_dev(&[0.0, 1.0]) - 0.5).abs() < 1e-9);
    }
}
