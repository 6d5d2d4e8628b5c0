//! Analysis result models.
//!
//! One `AnalysisResult` is produced per message per pipeline run and is
//! never mutated afterward; a retry produces a new result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentiment polarity label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    /// Fixed tie-break order for summary aggregation: positive wins over
    /// negative, negative over neutral.
    pub const PRIORITY: [SentimentLabel; 3] = [
        SentimentLabel::Positive,
        SentimentLabel::Negative,
        SentimentLabel::Neutral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "positive" => Some(Self::Positive),
            "negative" => Some(Self::Negative),
            "neutral" => Some(Self::Neutral),
            _ => None,
        }
    }
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Verdict from a single estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimatorVerdict {
    pub label: SentimentLabel,
    /// Continuous polarity score in [-1, 1].
    pub score: f64,
    /// Confidence in [0, 1].
    pub confidence: f64,
}

/// Per-estimator entry in an analysis result: either the verdict the
/// estimator produced or the error note it degraded with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimatorReport {
    /// Estimator name (registry key).
    pub estimator: String,
    /// Weight this estimator carries in fusion.
    pub weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verdict: Option<EstimatorVerdict>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Combined verdict across all contributing estimators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedVerdict {
    pub label: SentimentLabel,
    /// Weighted combination of estimator scores.
    pub score: f64,
    /// Mean confidence across estimators that produced a verdict.
    pub confidence: f64,
    /// Whether every contributing estimator reached the same label.
    pub agreement: bool,
}

/// Emotional intensity bucket derived from the fused verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionalIntensity {
    Neutral,
    Low,
    Medium,
    High,
}

impl EmotionalIntensity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Secondary signals derived from raw message text and the fused verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insights {
    /// Whitespace-token count of the raw text.
    pub word_count: usize,
    pub has_emoji: bool,
    /// A run of 3+ consecutive uppercase letters exists.
    pub has_caps: bool,
    pub has_exclamation: bool,
    pub has_question: bool,
    /// Marker-phrase heuristic; not a verified sarcasm model.
    pub potential_sarcasm: bool,
    pub emotional_intensity: EmotionalIntensity,
    /// Lowercased mention targets, sigils stripped.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mentions: Vec<String>,
    /// Lowercased hashtag words, sigils stripped.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hashtags: Vec<String>,
}

/// Why a message could not be analyzed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "detail")]
pub enum AnalysisFailure {
    /// The message had no analyzable text; no estimator was invoked.
    NoText,
    /// Unexpected failure while analyzing this message.
    Pipeline(String),
}

impl std::fmt::Display for AnalysisFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoText => write!(f, "no text"),
            Self::Pipeline(detail) => write!(f, "pipeline failure: {}", detail),
        }
    }
}

/// The unit handed to the external result sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub message_id: String,
    pub conversation_id: String,
    pub platform: super::Platform,
    /// Fused verdict; absent when the message failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verdict: Option<FusedVerdict>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insights: Option<Insights>,
    /// Normalized text the estimators scored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_text: Option<String>,
    /// Per-estimator breakdown, in construction order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub estimators: Vec<EstimatorReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<AnalysisFailure>,
    pub analyzed_at: DateTime<Utc>,
}

impl AnalysisResult {
    /// Build a failed result carrying no verdict.
    pub fn failed(message: &super::Message, failure: AnalysisFailure) -> Self {
        Self {
            message_id: message.id.clone(),
            conversation_id: message.conversation_id.clone(),
            platform: message.platform,
            verdict: None,
            insights: None,
            processed_text: None,
            estimators: Vec::new(),
            failure: Some(failure),
            analyzed_at: Utc::now(),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }
}

/// Per-label raw counts over a result set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCounts {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
}

impl LabelCounts {
    pub fn get(&self, label: SentimentLabel) -> usize {
        match label {
            SentimentLabel::Positive => self.positive,
            SentimentLabel::Negative => self.negative,
            SentimentLabel::Neutral => self.neutral,
        }
    }

    pub fn increment(&mut self, label: SentimentLabel) {
        match label {
            SentimentLabel::Positive => self.positive += 1,
            SentimentLabel::Negative => self.negative += 1,
            SentimentLabel::Neutral => self.neutral += 1,
        }
    }
}

/// Per-label percentages of the total result count (failures included in
/// the denominator, so percentages can sum below 100).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelPercentages {
    pub positive: f64,
    pub negative: f64,
    pub neutral: f64,
}

/// Aggregate over many analysis results; recomputed fresh each time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryAggregate {
    /// Total results, including failures.
    pub total: usize,
    /// Results that produced a fused verdict.
    pub succeeded: usize,
    pub counts: LabelCounts,
    pub percentages: LabelPercentages,
    /// Mean confidence over succeeded results (0 when none succeeded).
    pub average_confidence: f64,
    /// Label with the highest raw count; ties resolve by
    /// `SentimentLabel::PRIORITY`.
    pub overall_label: SentimentLabel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_round_trip() {
        for l in SentimentLabel::PRIORITY {
            assert_eq!(SentimentLabel::from_str(l.as_str()), Some(l));
        }
        assert_eq!(SentimentLabel::from_str("mixed"), None);
    }

    #[test]
    fn test_failure_serialization_shape() {
        let json = serde_json::to_value(AnalysisFailure::NoText).unwrap();
        assert_eq!(json["kind"], "no_text");

        let json = serde_json::to_value(AnalysisFailure::Pipeline("boom".into())).unwrap();
        assert_eq!(json["kind"], "pipeline");
        assert_eq!(json["detail"], "boom");
    }

    #[test]
    fn test_label_counts_increment_and_get() {
        let mut counts = LabelCounts::default();
        counts.increment(SentimentLabel::Positive);
        counts.increment(SentimentLabel::Positive);
        counts.increment(SentimentLabel::Neutral);
        assert_eq!(counts.get(SentimentLabel::Positive), 2);
        assert_eq!(counts.get(SentimentLabel::Negative), 0);
        assert_eq!(counts.get(SentimentLabel::Neutral), 1);
    }
}
