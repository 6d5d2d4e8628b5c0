//! Conversation analysis pipeline.
//!
//! Orchestrates one message end-to-end: normalize, run every estimator
//! concurrently under a timeout, fuse the surviving verdicts, extract
//! insights, assemble the immutable result. Batches run with bounded
//! concurrency and input-order results; one message's failure never
//! aborts the rest.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{AnalysisConfig, ConfigError, ConversenseConfig};
use crate::estimator::{build_estimators, EstimatorError, SentimentEstimator};
use crate::fusion::fuse;
use crate::insights::InsightExtractor;
use crate::models::{
    AnalysisFailure, AnalysisResult, EstimatorReport, EstimatorVerdict, LabelCounts,
    LabelPercentages, Message, SentimentLabel, SummaryAggregate,
};
use crate::normalize::normalize;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("no usable estimators configured")]
    NoEstimators,
}

/// End-to-end analyzer for conversation messages.
#[derive(Clone)]
pub struct ConversationPipeline {
    estimators: Vec<(Arc<dyn SentimentEstimator>, f64)>,
    insights: InsightExtractor,
    config: AnalysisConfig,
}

impl ConversationPipeline {
    /// Build the pipeline from configuration.
    pub fn new(config: &ConversenseConfig) -> Result<Self, PipelineError> {
        config.analysis.validate()?;
        let estimators = build_estimators(&config.analysis);
        Self::with_estimators(estimators, config.analysis.clone())
    }

    /// Build the pipeline over an explicit estimator set.
    ///
    /// Weights are taken as configured; other estimator sets can be
    /// substituted as long as their weights sum to 1.0.
    pub fn with_estimators(
        estimators: Vec<(Arc<dyn SentimentEstimator>, f64)>,
        config: AnalysisConfig,
    ) -> Result<Self, PipelineError> {
        if estimators.is_empty() {
            return Err(PipelineError::NoEstimators);
        }
        Ok(Self {
            insights: InsightExtractor::from_config(&config),
            estimators,
            config,
        })
    }

    /// Analyze a single message.
    ///
    /// A message with no text short-circuits: no estimator runs and the
    /// result carries the `no_text` failure marker instead of a verdict.
    pub async fn run(&self, message: &Message) -> AnalysisResult {
        if !message.has_text() {
            debug!(message_id = %message.id, "message has no text, skipping estimation");
            return AnalysisResult::failed(message, AnalysisFailure::NoText);
        }

        let processed = normalize(&message.text, message.platform);
        let reports = self.estimate_all(&processed).await;

        let contributions: Vec<(EstimatorVerdict, f64)> = reports
            .iter()
            .filter_map(|r| r.verdict.clone().map(|v| (v, r.weight)))
            .collect();

        let fused = fuse(
            &contributions,
            self.config.positive_threshold,
            self.config.negative_threshold,
        );
        let insights = self.insights.extract(&message.text, Some(&fused));

        debug!(
            message_id = %message.id,
            label = %fused.label,
            confidence = fused.confidence,
            "analysis completed"
        );

        AnalysisResult {
            message_id: message.id.clone(),
            conversation_id: message.conversation_id.clone(),
            platform: message.platform,
            verdict: Some(fused),
            insights: Some(insights),
            processed_text: Some(processed),
            estimators: reports,
            failure: None,
            analyzed_at: chrono::Utc::now(),
        }
    }

    /// Run every estimator concurrently, each bounded by the configured
    /// timeout, and join the outcomes in construction order.
    async fn estimate_all(&self, text: &str) -> Vec<EstimatorReport> {
        let timeout = self.config.estimator_timeout();

        let invocations = self.estimators.iter().map(|(estimator, weight)| {
            let estimator = Arc::clone(estimator);
            let weight = *weight;
            let text = text.to_string();
            async move {
                let outcome = match tokio::time::timeout(timeout, estimator.estimate(&text)).await
                {
                    Ok(result) => result,
                    Err(_) => Err(EstimatorError::TimedOut(timeout)),
                };
                (estimator.name(), weight, outcome)
            }
        });

        futures::future::join_all(invocations)
            .await
            .into_iter()
            .map(|(name, weight, outcome)| match outcome {
                Ok(verdict) => EstimatorReport {
                    estimator: name.to_string(),
                    weight,
                    verdict: Some(verdict),
                    error: None,
                },
                Err(err) => {
                    warn!("estimator {} failed: {}", name, err);
                    EstimatorReport {
                        estimator: name.to_string(),
                        weight,
                        verdict: None,
                        error: Some(err.to_string()),
                    }
                }
            })
            .collect()
    }

    /// Analyze a batch with bounded concurrency.
    ///
    /// Results come back in input order regardless of completion order.
    /// A panic while analyzing one message is contained to that message's
    /// result; the batch continues.
    pub async fn run_batch(&self, messages: &[Message]) -> Vec<AnalysisResult> {
        let concurrency = self.config.batch_concurrency.max(1);

        let tasks = messages.iter().cloned().map(|message| {
            let pipeline = self.clone();
            async move {
                let handle = tokio::spawn({
                    let pipeline = pipeline.clone();
                    let message = message.clone();
                    async move { pipeline.run(&message).await }
                });
                match handle.await {
                    Ok(result) => result,
                    Err(join_error) => {
                        warn!(
                            message_id = %message.id,
                            "analysis task failed: {}", join_error
                        );
                        AnalysisResult::failed(
                            &message,
                            AnalysisFailure::Pipeline(join_error.to_string()),
                        )
                    }
                }
            }
        });

        stream::iter(tasks).buffered(concurrency).collect().await
    }

    /// Aggregate a result set into a fresh summary.
    ///
    /// Counts cover succeeded results only, while percentages divide by
    /// the total including failures — they can sum below 100 when
    /// failures exist, deliberately. Ties for the overall label resolve
    /// by the fixed priority order.
    pub fn summarize(&self, results: &[AnalysisResult]) -> SummaryAggregate {
        let total = results.len();
        let mut counts = LabelCounts::default();
        let mut confidence_sum = 0.0;
        let mut succeeded = 0usize;

        for result in results {
            let Some(verdict) = result.verdict.as_ref().filter(|_| !result.is_failed()) else {
                continue;
            };
            counts.increment(verdict.label);
            confidence_sum += verdict.confidence;
            succeeded += 1;
        }

        let percentages = if total > 0 {
            LabelPercentages {
                positive: counts.positive as f64 / total as f64 * 100.0,
                negative: counts.negative as f64 / total as f64 * 100.0,
                neutral: counts.neutral as f64 / total as f64 * 100.0,
            }
        } else {
            LabelPercentages::default()
        };

        let mut overall_label = SentimentLabel::PRIORITY[0];
        for label in SentimentLabel::PRIORITY {
            if counts.get(label) > counts.get(overall_label) {
                overall_label = label;
            }
        }

        SummaryAggregate {
            total,
            succeeded,
            counts,
            percentages,
            average_confidence: if succeeded > 0 {
                confidence_sum / succeeded as f64
            } else {
                0.0
            },
            overall_label,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::EstimatorKind;
    use crate::models::Platform;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedEstimator {
        verdict: EstimatorVerdict,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl SentimentEstimator for FixedEstimator {
        fn kind(&self) -> EstimatorKind {
            EstimatorKind::Lexicon
        }

        async fn estimate(&self, _text: &str) -> Result<EstimatorVerdict, EstimatorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.verdict.clone())
        }
    }

    struct FailingEstimator;

    #[async_trait]
    impl SentimentEstimator for FailingEstimator {
        fn kind(&self) -> EstimatorKind {
            EstimatorKind::Rules
        }

        async fn estimate(&self, _text: &str) -> Result<EstimatorVerdict, EstimatorError> {
            Err(EstimatorError::Failed("lexicon unavailable".to_string()))
        }
    }

    struct HangingEstimator;

    #[async_trait]
    impl SentimentEstimator for HangingEstimator {
        fn kind(&self) -> EstimatorKind {
            EstimatorKind::Rules
        }

        async fn estimate(&self, _text: &str) -> Result<EstimatorVerdict, EstimatorError> {
            futures::future::pending().await
        }
    }

    fn message(id: &str, text: &str) -> Message {
        Message::new(
            id.to_string(),
            "family".to_string(),
            "Ana".to_string(),
            text.to_string(),
            Utc::now(),
            Platform::Whatsapp,
        )
    }

    fn fixed(score: f64, calls: Arc<AtomicUsize>) -> Arc<dyn SentimentEstimator> {
        let label = if score > 0.1 {
            SentimentLabel::Positive
        } else if score < -0.1 {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        };
        Arc::new(FixedEstimator {
            verdict: EstimatorVerdict {
                label,
                score,
                confidence: score.abs(),
            },
            calls,
        })
    }

    #[tokio::test]
    async fn test_empty_text_short_circuits_without_estimators() {
        let calls = Arc::new(AtomicUsize::new(0));
        let pipeline = ConversationPipeline::with_estimators(
            vec![(fixed(0.5, calls.clone()), 1.0)],
            AnalysisConfig::default(),
        )
        .unwrap();

        let result = pipeline.run(&message("m1", "")).await;

        assert_eq!(result.failure, Some(AnalysisFailure::NoText));
        assert!(result.verdict.is_none());
        assert!(result.insights.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_estimator_degrades_without_phantom_zero() {
        let calls = Arc::new(AtomicUsize::new(0));
        let pipeline = ConversationPipeline::with_estimators(
            vec![
                (fixed(0.5, calls.clone()), 0.4),
                (Arc::new(FailingEstimator), 0.6),
            ],
            AnalysisConfig::default(),
        )
        .unwrap();

        let result = pipeline.run(&message("m1", "anything at all")).await;
        let verdict = result.verdict.unwrap();

        assert!((verdict.score - 0.2).abs() < 1e-9);
        assert_eq!(verdict.label, SentimentLabel::Positive);
        // Confidence is the surviving estimator's own, not averaged with
        // a phantom zero from the failed one.
        assert!((verdict.confidence - 0.5).abs() < 1e-9);

        assert_eq!(result.estimators.len(), 2);
        assert!(result.estimators[0].verdict.is_some());
        assert!(result.estimators[1].error.is_some());
        assert!(result.failure.is_none());
    }

    #[tokio::test]
    async fn test_hanging_estimator_times_out() {
        let calls = Arc::new(AtomicUsize::new(0));
        let config = AnalysisConfig {
            estimator_timeout_secs: 1,
            ..AnalysisConfig::default()
        };
        let pipeline = ConversationPipeline::with_estimators(
            vec![
                (fixed(0.5, calls.clone()), 0.4),
                (Arc::new(HangingEstimator), 0.6),
            ],
            config,
        )
        .unwrap();

        let result = pipeline.run(&message("m1", "still works")).await;
        let verdict = result.verdict.unwrap();

        assert!((verdict.confidence - 0.5).abs() < 1e-9);
        assert!(result.estimators[1]
            .error
            .as_deref()
            .unwrap()
            .contains("did not return"));
    }

    #[tokio::test]
    async fn test_all_estimators_failed_is_vacuously_neutral() {
        let pipeline = ConversationPipeline::with_estimators(
            vec![(Arc::new(FailingEstimator), 1.0)],
            AnalysisConfig::default(),
        )
        .unwrap();

        let result = pipeline.run(&message("m1", "text")).await;
        let verdict = result.verdict.unwrap();

        assert_eq!(verdict.label, SentimentLabel::Neutral);
        assert_eq!(verdict.confidence, 0.0);
        assert!(verdict.agreement);
        assert!(result.failure.is_none());
    }

    #[tokio::test]
    async fn test_batch_preserves_input_order() {
        let calls = Arc::new(AtomicUsize::new(0));
        let pipeline = ConversationPipeline::with_estimators(
            vec![(fixed(0.5, calls), 1.0)],
            AnalysisConfig {
                batch_concurrency: 3,
                ..AnalysisConfig::default()
            },
        )
        .unwrap();

        let messages: Vec<Message> = (0..10)
            .map(|i| message(&format!("m{}", i), "fine text"))
            .collect();
        let results = pipeline.run_batch(&messages).await;

        assert_eq!(results.len(), 10);
        for (i, result) in results.iter().enumerate() {
            assert_eq!(result.message_id, format!("m{}", i));
        }
    }

    #[tokio::test]
    async fn test_batch_isolates_no_text_failures() {
        let pipeline = ConversationPipeline::new(&ConversenseConfig::default()).unwrap();
        let messages = vec![
            message("m0", "I love this!!!"),
            message("m1", ""),
            message("m2", "I hate it."),
        ];

        let results = pipeline.run_batch(&messages).await;

        assert!(results[0].verdict.is_some());
        assert_eq!(results[1].failure, Some(AnalysisFailure::NoText));
        assert!(results[2].verdict.is_some());
    }

    #[test]
    fn test_summary_tie_breaks_by_priority() {
        let pipeline = ConversationPipeline::new(&ConversenseConfig::default()).unwrap();

        let mk = |label: SentimentLabel, confidence: f64| AnalysisResult {
            message_id: "m".into(),
            conversation_id: "family".into(),
            platform: Platform::Whatsapp,
            verdict: Some(crate::models::FusedVerdict {
                label,
                score: 0.0,
                confidence,
                agreement: true,
            }),
            insights: None,
            processed_text: None,
            estimators: Vec::new(),
            failure: None,
            analyzed_at: Utc::now(),
        };

        let results = vec![
            mk(SentimentLabel::Positive, 0.8),
            mk(SentimentLabel::Positive, 0.6),
            mk(SentimentLabel::Negative, 0.7),
            mk(SentimentLabel::Negative, 0.9),
        ];
        let summary = pipeline.summarize(&results);

        assert_eq!(summary.overall_label, SentimentLabel::Positive);
        assert_eq!(summary.counts.positive, 2);
        assert_eq!(summary.counts.negative, 2);
        assert_eq!(summary.succeeded, 4);
        assert!((summary.average_confidence - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_summary_of_empty_set() {
        let pipeline = ConversationPipeline::new(&ConversenseConfig::default()).unwrap();
        let summary = pipeline.summarize(&[]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.succeeded, 0);
        assert_eq!(summary.average_confidence, 0.0);
    }
}
