// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Coordination Configuration Types
//
// Defines the configuration schema for a coordination engine instance:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - Specialist resonance and registry capacity
// - Signal decay, reinforcement and sweeping
// - Approach matching, discovery, evolution and pruning thresholds
// - Storage backend selection

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::repository::{FileSystemConfig, StorageBackend};

pub const API_VERSION: &str = "100monkeys.ai/v1";
pub const KIND: &str = "CoordinationConfig";

/// Top-level coordination configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinationConfig {
    /// API version (must be "100monkeys.ai/v1")
    #[serde(rename = "apiVersion", default = "default_api_version")]
    pub api_version: String,

    /// Resource kind (must be "CoordinationConfig")
    #[serde(default = "default_kind")]
    pub kind: String,

    #[serde(default)]
    pub metadata: ConfigMetadata,

    #[serde(default)]
    pub spec: CoordinationSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigMetadata {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl Default for ConfigMetadata {
    fn default() -> Self {
        Self {
            name: "hybrid-swarm".to_string(),
            version: None,
        }
    }
}

/// Configuration specification (content under spec:)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoordinationSpec {
    #[serde(default)]
    pub resonance: ResonanceConfig,

    #[serde(default)]
    pub signals: SignalConfig,

    #[serde(default)]
    pub matching: MatchingConfig,

    #[serde(default)]
    pub discovery: DiscoveryConfig,

    #[serde(default)]
    pub evolution: EvolutionConfig,

    #[serde(default)]
    pub pruning: PruningConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResonanceConfig {
    /// Minimum resonance required to reuse an existing specialist
    #[serde(default = "default_vigilance")]
    pub vigilance_threshold: f64,

    #[serde(default = "default_max_specialists")]
    pub max_specialists: usize,

    /// Signatures retained per specialist
    #[serde(default = "default_window_size")]
    pub window_size: usize,

    /// EMA rate for specialist average quality
    #[serde(default = "default_specialist_learning_rate")]
    pub learning_rate: f64,
}

impl Default for ResonanceConfig {
    fn default() -> Self {
        Self {
            vigilance_threshold: default_vigilance(),
            max_specialists: default_max_specialists(),
            window_size: default_window_size(),
            learning_rate: default_specialist_learning_rate(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalConfig {
    /// e-folding time of signal strength, in seconds
    #[serde(default = "default_decay_rate")]
    pub decay_rate_secs: f64,

    #[serde(default = "default_amplification")]
    pub amplification: f64,

    #[serde(default = "default_attenuation")]
    pub attenuation: f64,

    /// Deposits above this quality amplify even when the depositor differs
    #[serde(default = "default_reinforce_quality")]
    pub reinforce_quality: f64,

    /// Signals at or below this decayed strength are dead
    #[serde(default = "default_strength_floor")]
    pub strength_floor: f64,

    #[serde(default = "default_true")]
    pub sweep_enabled: bool,

    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            decay_rate_secs: default_decay_rate(),
            amplification: default_amplification(),
            attenuation: default_attenuation(),
            reinforce_quality: default_reinforce_quality(),
            strength_floor: default_strength_floor(),
            sweep_enabled: true,
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    #[serde(default = "default_match_threshold")]
    pub threshold: f64,

    #[serde(default = "default_match_limit")]
    pub limit: usize,

    /// Weight of the catalog match score in the final blend
    #[serde(default = "default_match_weight")]
    pub match_weight: f64,

    /// Weight of the normalized signal strength in the final blend
    #[serde(default = "default_signal_weight")]
    pub signal_weight: f64,

    /// Quality target used when a matched approach has no history yet
    #[serde(default = "default_quality_target")]
    pub default_quality_target: f64,

    /// Quality target used by the legacy fallback when no signal is live
    #[serde(default = "default_legacy_quality_target")]
    pub legacy_quality_target: f64,

    #[serde(default = "default_legacy_approaches")]
    pub legacy_approaches: Vec<String>,

    /// Seed for the fallback selector; entropy-seeded when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rng_seed: Option<u64>,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            threshold: default_match_threshold(),
            limit: default_match_limit(),
            match_weight: default_match_weight(),
            signal_weight: default_signal_weight(),
            default_quality_target: default_quality_target(),
            legacy_quality_target: default_legacy_quality_target(),
            legacy_approaches: default_legacy_approaches(),
            rng_seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Run discovery after this many recorded executions
    #[serde(default = "default_discovery_interval")]
    pub interval_executions: u64,

    #[serde(default = "default_min_cluster_size")]
    pub min_cluster_size: usize,

    #[serde(default = "default_discovery_min_quality")]
    pub min_quality: f64,

    #[serde(default = "default_cluster_similarity")]
    pub similarity_threshold: f64,

    /// Signature similarity above which a cluster is not novel
    #[serde(default = "default_novelty_threshold")]
    pub novelty_threshold: f64,

    #[serde(default = "default_lookback_days")]
    pub lookback_days: i64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_executions: default_discovery_interval(),
            min_cluster_size: default_min_cluster_size(),
            min_quality: default_discovery_min_quality(),
            similarity_threshold: default_cluster_similarity(),
            novelty_threshold: default_novelty_threshold(),
            lookback_days: default_lookback_days(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionConfig {
    #[serde(default = "default_evolution_min_executions")]
    pub min_executions: usize,

    #[serde(default = "default_min_quality_improvement")]
    pub min_quality_improvement: f64,

    #[serde(default = "default_min_days_between")]
    pub min_days_between_updates: i64,

    /// Executions at or above this quality drive signature refinement
    #[serde(default = "default_high_quality")]
    pub high_quality_threshold: f64,

    /// History window used when evolving from the ledger
    #[serde(default = "default_history_days")]
    pub history_days: i64,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            min_executions: default_evolution_min_executions(),
            min_quality_improvement: default_min_quality_improvement(),
            min_days_between_updates: default_min_days_between(),
            high_quality_threshold: default_high_quality(),
            history_days: default_history_days(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PruningConfig {
    #[serde(default = "default_min_usage_for_evaluation")]
    pub min_usage_for_evaluation: u64,

    #[serde(default = "default_max_age_no_traction")]
    pub max_age_no_traction_days: i64,

    #[serde(default = "default_min_quality_threshold")]
    pub min_quality_threshold: f64,

    #[serde(default = "default_min_success_rate")]
    pub min_success_rate: f64,

    /// Usage below which an old approach has "no traction"
    #[serde(default = "default_traction_usage")]
    pub traction_usage: u64,

    #[serde(default = "default_supersede_similarity")]
    pub supersede_similarity: f64,

    #[serde(default = "default_supersede_quality_margin")]
    pub supersede_quality_margin: f64,

    #[serde(default = "default_supersede_usage_margin")]
    pub supersede_usage_margin: u64,
}

impl Default for PruningConfig {
    fn default() -> Self {
        Self {
            min_usage_for_evaluation: default_min_usage_for_evaluation(),
            max_age_no_traction_days: default_max_age_no_traction(),
            min_quality_threshold: default_min_quality_threshold(),
            min_success_rate: default_min_success_rate(),
            traction_usage: default_traction_usage(),
            supersede_similarity: default_supersede_similarity(),
            supersede_quality_margin: default_supersede_quality_margin(),
            supersede_usage_margin: default_supersede_usage_margin(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Memory,
    Filesystem,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_kind")]
    pub backend: StorageKind,

    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_kind(),
            data_dir: default_data_dir(),
        }
    }
}

impl StorageConfig {
    pub fn backend(&self) -> StorageBackend {
        match self.backend {
            StorageKind::Memory => StorageBackend::InMemory,
            StorageKind::Filesystem => StorageBackend::FileSystem(FileSystemConfig {
                data_dir: self.data_dir.clone(),
            }),
        }
    }
}

fn default_api_version() -> String {
    API_VERSION.to_string()
}

fn default_kind() -> String {
    KIND.to_string()
}

fn default_true() -> bool {
    true
}

fn default_vigilance() -> f64 {
    0.7
}

fn default_max_specialists() -> usize {
    10
}

fn default_window_size() -> usize {
    20
}

fn default_specialist_learning_rate() -> f64 {
    0.3
}

fn default_decay_rate() -> f64 {
    3600.0
}

fn default_amplification() -> f64 {
    1.5
}

fn default_attenuation() -> f64 {
    0.7
}

fn default_reinforce_quality() -> f64 {
    0.7
}

fn default_strength_floor() -> f64 {
    1.0
}

fn default_sweep_interval() -> u64 {
    600
}

fn default_match_threshold() -> f64 {
    0.3
}

fn default_match_limit() -> usize {
    3
}

fn default_match_weight() -> f64 {
    0.7
}

fn default_signal_weight() -> f64 {
    0.3
}

fn default_quality_target() -> f64 {
    0.8
}

fn default_legacy_quality_target() -> f64 {
    0.5
}

fn default_legacy_approaches() -> Vec<String> {
    vec![
        "approach_A".to_string(),
        "approach_B".to_string(),
        "approach_C".to_string(),
    ]
}

fn default_discovery_interval() -> u64 {
    50
}

fn default_min_cluster_size() -> usize {
    10
}

fn default_discovery_min_quality() -> f64 {
    0.8
}

fn default_cluster_similarity() -> f64 {
    0.65
}

fn default_novelty_threshold() -> f64 {
    0.85
}

fn default_lookback_days() -> i64 {
    365
}

fn default_evolution_min_executions() -> usize {
    20
}

fn default_min_quality_improvement() -> f64 {
    0.05
}

fn default_min_days_between() -> i64 {
    7
}

fn default_high_quality() -> f64 {
    0.85
}

fn default_history_days() -> i64 {
    30
}

fn default_min_usage_for_evaluation() -> u64 {
    20
}

fn default_max_age_no_traction() -> i64 {
    30
}

fn default_min_quality_threshold() -> f64 {
    0.6
}

fn default_min_success_rate() -> f64 {
    0.5
}

fn default_traction_usage() -> u64 {
    5
}

fn default_supersede_similarity() -> f64 {
    0.7
}

fn default_supersede_quality_margin() -> f64 {
    0.15
}

fn default_supersede_usage_margin() -> u64 {
    50
}

fn default_storage_kind() -> StorageKind {
    StorageKind::Memory
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

impl Default for CoordinationConfig {
    fn default() -> Self {
        Self {
            api_version: default_api_version(),
            kind: default_kind(),
            metadata: ConfigMetadata::default(),
            spec: CoordinationSpec::default(),
        }
    }
}

impl CoordinationConfig {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. HYBRID_SWARM_CONFIG_PATH environment variable
    /// 2. ./hybrid-swarm.yaml (working directory)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("HYBRID_SWARM_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./hybrid-swarm.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        None
    }

    /// Load configuration from an explicit path, a discovered path, or defaults
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit CLI path (fail if missing/invalid)
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::debug!("No configuration file found. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("HYBRID_SWARM_DATA_DIR") {
            tracing::info!("Environment override: HYBRID_SWARM_DATA_DIR={}", dir);
            self.spec.storage.backend = StorageKind::Filesystem;
            self.spec.storage.data_dir = PathBuf::from(dir);
        }

        if let Ok(val) = std::env::var("HYBRID_SWARM_VIGILANCE") {
            match val.parse::<f64>() {
                Ok(v) => {
                    tracing::info!("Environment override: HYBRID_SWARM_VIGILANCE={}", v);
                    self.spec.resonance.vigilance_threshold = v;
                }
                Err(_) => {
                    tracing::warn!(
                        "Invalid value for HYBRID_SWARM_VIGILANCE: '{}'. Expected a number. Ignoring.",
                        val
                    );
                }
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        let spec = &self.spec;

        check_unit("resonance.vigilance_threshold", spec.resonance.vigilance_threshold)?;
        check_unit("resonance.learning_rate", spec.resonance.learning_rate)?;
        if spec.resonance.max_specialists == 0 {
            anyhow::bail!("resonance.max_specialists must be at least 1");
        }
        if spec.resonance.window_size == 0 {
            anyhow::bail!("resonance.window_size must be at least 1");
        }

        if !(spec.signals.decay_rate_secs > 0.0) {
            anyhow::bail!("signals.decay_rate_secs must be positive");
        }
        if spec.signals.sweep_interval_secs == 0 {
            anyhow::bail!("signals.sweep_interval_secs must be positive");
        }
        check_unit("signals.attenuation", spec.signals.attenuation)?;
        check_unit("signals.reinforce_quality", spec.signals.reinforce_quality)?;

        check_unit("matching.threshold", spec.matching.threshold)?;
        check_unit("matching.default_quality_target", spec.matching.default_quality_target)?;
        check_unit("matching.legacy_quality_target", spec.matching.legacy_quality_target)?;
        if spec.matching.limit == 0 {
            anyhow::bail!("matching.limit must be at least 1");
        }
        if (spec.matching.match_weight + spec.matching.signal_weight - 1.0).abs() > 1e-6 {
            anyhow::bail!(
                "matching.match_weight + matching.signal_weight must equal 1.0 (got {})",
                spec.matching.match_weight + spec.matching.signal_weight
            );
        }
        if spec.matching.legacy_approaches.is_empty() {
            anyhow::bail!("matching.legacy_approaches cannot be empty");
        }

        if spec.discovery.interval_executions == 0 {
            anyhow::bail!("discovery.interval_executions must be at least 1");
        }
        if spec.discovery.min_cluster_size == 0 {
            anyhow::bail!("discovery.min_cluster_size must be at least 1");
        }
        check_unit("discovery.min_quality", spec.discovery.min_quality)?;
        check_unit("discovery.similarity_threshold", spec.discovery.similarity_threshold)?;
        check_unit("discovery.novelty_threshold", spec.discovery.novelty_threshold)?;

        check_unit("pruning.min_quality_threshold", spec.pruning.min_quality_threshold)?;
        check_unit("pruning.min_success_rate", spec.pruning.min_success_rate)?;
        check_unit("pruning.supersede_similarity", spec.pruning.supersede_similarity)?;

        if spec.storage.backend == StorageKind::Filesystem
            && spec.storage.data_dir.as_os_str().is_empty()
        {
            anyhow::bail!("storage.data_dir cannot be empty for the filesystem backend");
        }

        Ok(())
    }
}

fn check_unit(name: &str, value: f64) -> anyhow::Result<()> {
    if !(0.0..=1.0).contains(&value) {
        anyhow::bail!("{} must be within [0, 1] (got {})", name, value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CoordinationConfig::default();
        assert_eq!(config.api_version, API_VERSION);
        assert_eq!(config.kind, KIND);
        assert_eq!(config.spec.resonance.vigilance_threshold, 0.7);
        assert_eq!(config.spec.resonance.max_specialists, 10);
        assert_eq!(config.spec.signals.decay_rate_secs, 3600.0);
        assert_eq!(config.spec.signals.sweep_interval_secs, 600);
        assert_eq!(config.spec.matching.limit, 3);
        assert_eq!(config.spec.discovery.interval_executions, 50);
        assert_eq!(config.spec.pruning.max_age_no_traction_days, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = r#"
apiVersion: 100monkeys.ai/v1
kind: CoordinationConfig
metadata:
  name: test
spec:
  resonance:
    vigilance_threshold: 0.8
  storage:
    backend: filesystem
    data_dir: /tmp/swarm
"#;
        let config = CoordinationConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.spec.resonance.vigilance_threshold, 0.8);
        assert_eq!(config.spec.resonance.window_size, 20);
        assert_eq!(config.spec.signals.amplification, 1.5);
        assert_eq!(
            config.spec.storage.backend(),
            StorageBackend::FileSystem(FileSystemConfig {
                data_dir: PathBuf::from("/tmp/swarm")
            })
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_roundtrip() {
        let mut config = CoordinationConfig::default();
        config.spec.matching.rng_seed = Some(7);
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed = CoordinationConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(parsed.spec.matching.rng_seed, Some(7));
        assert_eq!(parsed.spec.matching.legacy_approaches.len(), 3);
    }

    #[test]
    fn test_validation_rejects_out_of_range() {
        let mut config = CoordinationConfig::default();
        config.spec.resonance.vigilance_threshold = 1.5;
        assert!(config.validate().is_err());

        let mut config = CoordinationConfig::default();
        config.spec.matching.signal_weight = 0.5;
        assert!(config.validate().is_err());

        let mut config = CoordinationConfig::default();
        config.kind = "NodeConfig".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hybrid-swarm.yaml");
        CoordinationConfig::default().to_yaml_file(&path).unwrap();
        let loaded = CoordinationConfig::load_or_default(Some(path)).unwrap();
        assert_eq!(loaded.metadata.name, "hybrid-swarm");
    }

    #[test]
    fn test_missing_explicit_path_fails() {
        let result = CoordinationConfig::load_or_default(Some(PathBuf::from("/nonexistent/x.yaml")));
        assert!(result.is_err());
    }
}
