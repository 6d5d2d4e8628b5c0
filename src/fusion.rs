//! Weighted fusion of estimator verdicts.
//!
//! A pure combination step: no I/O, no logging. The caller passes only the
//! verdicts of estimators that actually produced one; errored estimators
//! contribute nothing here, not even a phantom zero in the confidence mean.

use crate::models::{EstimatorVerdict, FusedVerdict, SentimentLabel};

/// Combine weighted estimator verdicts into one.
///
/// `combined_score = Σ(weight × score)` over the contributing verdicts,
/// labeled with the shared polarity thresholds. Confidence is the mean of
/// the contributors' confidences; `agreement` is whether every contributor
/// reached the same label. An empty slice (every estimator errored) fuses
/// to a neutral, zero-confidence verdict with vacuous agreement.
pub fn fuse(
    verdicts: &[(EstimatorVerdict, f64)],
    positive_threshold: f64,
    negative_threshold: f64,
) -> FusedVerdict {
    if verdicts.is_empty() {
        return FusedVerdict {
            label: SentimentLabel::Neutral,
            score: 0.0,
            confidence: 0.0,
            agreement: true,
        };
    }

    let score: f64 = verdicts.iter().map(|(v, weight)| v.score * weight).sum();

    let label = if score > positive_threshold {
        SentimentLabel::Positive
    } else if score < negative_threshold {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    };

    let confidence =
        verdicts.iter().map(|(v, _)| v.confidence).sum::<f64>() / verdicts.len() as f64;

    let first_label = verdicts[0].0.label;
    let agreement = verdicts.iter().all(|(v, _)| v.label == first_label);

    FusedVerdict {
        label,
        score,
        confidence,
        agreement,
    }
}
