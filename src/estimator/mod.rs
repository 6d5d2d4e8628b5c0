//! Sentiment estimator abstraction.
//!
//! Two independently-implemented scorers sit behind one capability trait:
//! - `lexicon`: averaged polarity lexicon with a subjectivity measure
//! - `rules`: valence rules with negation/booster/emphasis handling and a
//!   compound score
//!
//! Estimators are selected by name at construction time; the pipeline
//! invokes them polymorphically and fuses their verdicts.

mod lexicon;
mod rules;

pub use lexicon::{LexiconEstimator, LexiconScores};
pub use rules::{RuleEstimator, RuleScores};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use crate::config::AnalysisConfig;
use crate::models::EstimatorVerdict;

/// Errors from sentiment estimators.
#[derive(Debug, Error)]
pub enum EstimatorError {
    #[error("estimation failed: {0}")]
    Failed(String),

    #[error("estimator did not return within {0:?}")]
    TimedOut(Duration),
}

/// Available estimator strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EstimatorKind {
    /// Polarity-lexicon scorer with a subjectivity measure.
    Lexicon,
    /// Rule-based scorer producing a normalized compound score.
    Rules,
}

impl EstimatorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EstimatorKind::Lexicon => "lexicon",
            EstimatorKind::Rules => "rules",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "lexicon" => Some(EstimatorKind::Lexicon),
            "rules" => Some(EstimatorKind::Rules),
            _ => None,
        }
    }
}

impl std::fmt::Display for EstimatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A polarity scorer consumed polymorphically by the pipeline.
///
/// Implementations are pure over their input text; a failed computation
/// surfaces as `Err` so fusion can distinguish "neutral sentiment" from
/// "estimator failed".
#[async_trait]
pub trait SentimentEstimator: Send + Sync {
    /// Which strategy this estimator implements.
    fn kind(&self) -> EstimatorKind;

    /// Registry name, used in reports and configuration.
    fn name(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Score normalized text into a verdict.
    async fn estimate(&self, text: &str) -> Result<EstimatorVerdict, EstimatorError>;
}

/// Build the configured estimator set with fusion weights.
///
/// Unknown estimator names are skipped with a warning, mirroring how
/// unavailable backends are dropped from a processing chain.
pub fn build_estimators(config: &AnalysisConfig) -> Vec<(Arc<dyn SentimentEstimator>, f64)> {
    let mut estimators: Vec<(Arc<dyn SentimentEstimator>, f64)> = Vec::new();

    for entry in &config.estimators {
        match EstimatorKind::from_str(&entry.name) {
            Some(EstimatorKind::Lexicon) => {
                let est = LexiconEstimator::new(
                    config.positive_threshold,
                    config.negative_threshold,
                );
                estimators.push((Arc::new(est), entry.weight));
            }
            Some(EstimatorKind::Rules) => {
                estimators.push((Arc::new(RuleEstimator::new()), entry.weight));
            }
            None => {
                warn!("Unknown sentiment estimator '{}', skipping", entry.name);
            }
        }
    }

    estimators
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EstimatorWeight;

    #[test]
    fn test_kind_round_trip() {
        assert_eq!(EstimatorKind::from_str("lexicon"), Some(EstimatorKind::Lexicon));
        assert_eq!(EstimatorKind::from_str("Rules"), Some(EstimatorKind::Rules));
        assert_eq!(EstimatorKind::from_str("oracle"), None);
    }

    #[test]
    fn test_unknown_estimator_skipped() {
        let config = AnalysisConfig {
            estimators: vec![
                EstimatorWeight { name: "lexicon".into(), weight: 0.4 },
                EstimatorWeight { name: "oracle".into(), weight: 0.6 },
            ],
            ..AnalysisConfig::default()
        };
        let built = build_estimators(&config);
        assert_eq!(built.len(), 1);
        assert_eq!(built[0].0.name(), "lexicon");
    }

    #[test]
    fn test_default_config_builds_both() {
        let built = build_estimators(&AnalysisConfig::default());
        let names: Vec<_> = built.iter().map(|(e, _)| e.name()).collect();
        assert_eq!(names, vec!["lexicon", "rules"]);
    }
}
