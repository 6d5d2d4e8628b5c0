//! Configuration management for Conversense.
//!
//! Loaded from a TOML file (explicit path or the platform config
//! directory); every value has a serde default so an absent file yields a
//! working configuration. Fusion weights, polarity thresholds, sarcasm
//! markers, and intensity cut-points are configuration constants here, not
//! arithmetic scattered through the pipeline.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Default polarity threshold above which a score reads positive.
pub const DEFAULT_POSITIVE_THRESHOLD: f64 = 0.1;
/// Default polarity threshold below which a score reads negative.
pub const DEFAULT_NEGATIVE_THRESHOLD: f64 = -0.1;
/// Default per-estimator timeout in seconds.
pub const DEFAULT_ESTIMATOR_TIMEOUT_SECS: u64 = 5;
/// Default concurrent messages per batch.
pub const DEFAULT_BATCH_CONCURRENCY: usize = 4;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// One estimator's place in the fusion: registry name plus weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimatorWeight {
    pub name: String,
    pub weight: f64,
}

/// Sentiment analysis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Estimators to run, in fusion order, with their weights.
    /// Weights must sum to 1.0.
    #[serde(default = "default_estimators")]
    pub estimators: Vec<EstimatorWeight>,

    /// Combined score above this is labeled positive.
    #[serde(default = "default_positive_threshold")]
    pub positive_threshold: f64,

    /// Combined score below this is labeled negative.
    #[serde(default = "default_negative_threshold")]
    pub negative_threshold: f64,

    /// Per-estimator timeout; a scorer that overruns it is treated as
    /// failed rather than blocking the pipeline.
    #[serde(default = "default_estimator_timeout_secs")]
    pub estimator_timeout_secs: u64,

    /// Maximum messages analyzed concurrently in a batch.
    #[serde(default = "default_batch_concurrency")]
    pub batch_concurrency: usize,

    /// Phrases that hint at sarcasm. Heuristic with no stated derivation;
    /// kept configurable rather than assumed tuned.
    #[serde(default = "default_sarcasm_markers")]
    pub sarcasm_markers: Vec<String>,

    /// Confidence above this reads as high emotional intensity.
    #[serde(default = "default_intensity_high")]
    pub intensity_high: f64,

    /// Confidence above this (up to the high cut) reads as medium.
    #[serde(default = "default_intensity_medium")]
    pub intensity_medium: f64,
}

fn default_estimators() -> Vec<EstimatorWeight> {
    vec![
        EstimatorWeight {
            name: "lexicon".to_string(),
            weight: 0.4,
        },
        EstimatorWeight {
            name: "rules".to_string(),
            weight: 0.6,
        },
    ]
}

fn default_positive_threshold() -> f64 {
    DEFAULT_POSITIVE_THRESHOLD
}

fn default_negative_threshold() -> f64 {
    DEFAULT_NEGATIVE_THRESHOLD
}

fn default_estimator_timeout_secs() -> u64 {
    DEFAULT_ESTIMATOR_TIMEOUT_SECS
}

fn default_batch_concurrency() -> usize {
    DEFAULT_BATCH_CONCURRENCY
}

fn default_sarcasm_markers() -> Vec<String> {
    [
        "yeah right",
        "sure",
        "obviously",
        "totally",
        "definitely",
        "great job",
        "brilliant",
        "fantastic",
        "amazing",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_intensity_high() -> f64 {
    0.7
}

fn default_intensity_medium() -> f64 {
    0.3
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            estimators: default_estimators(),
            positive_threshold: default_positive_threshold(),
            negative_threshold: default_negative_threshold(),
            estimator_timeout_secs: default_estimator_timeout_secs(),
            batch_concurrency: default_batch_concurrency(),
            sarcasm_markers: default_sarcasm_markers(),
            intensity_high: default_intensity_high(),
            intensity_medium: default_intensity_medium(),
        }
    }
}

impl AnalysisConfig {
    pub fn estimator_timeout(&self) -> Duration {
        Duration::from_secs(self.estimator_timeout_secs)
    }

    /// Check invariants the pipeline depends on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.estimators.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one estimator must be configured".to_string(),
            ));
        }

        let weight_sum: f64 = self.estimators.iter().map(|e| e.weight).sum();
        if (weight_sum - 1.0).abs() > 1e-6 {
            return Err(ConfigError::Invalid(format!(
                "estimator weights must sum to 1.0, got {}",
                weight_sum
            )));
        }

        if self.positive_threshold <= 0.0 || self.negative_threshold >= 0.0 {
            return Err(ConfigError::Invalid(
                "positive threshold must be > 0 and negative threshold < 0".to_string(),
            ));
        }

        if self.batch_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "batch concurrency must be at least 1".to_string(),
            ));
        }

        if self.intensity_medium >= self.intensity_high {
            return Err(ConfigError::Invalid(
                "medium intensity cut must be below the high cut".to_string(),
            ));
        }

        Ok(())
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversenseConfig {
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

impl ConversenseConfig {
    /// Default config file location under the platform config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("conversense").join("config.toml"))
    }

    /// Load from an explicit path, or the default location, or defaults
    /// when no file exists.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => Self::default_path().filter(|p| p.exists()),
        };

        let config = match path {
            Some(path) => {
                debug!("loading config from {}", path.display());
                let contents = fs::read_to_string(&path)?;
                toml::from_str(&contents)?
            }
            None => Self::default(),
        };

        config.analysis.validate()?;
        Ok(config)
    }
}
