//! Polarity-lexicon estimator.
//!
//! Scores text by averaging per-word polarity from a weighted lexicon,
//! with single-token negation and intensifier handling. Also produces a
//! subjectivity measure (how opinionated the matched vocabulary is).

use std::collections::HashMap;

use async_trait::async_trait;

use super::{EstimatorError, EstimatorKind, SentimentEstimator};
use crate::models::{EstimatorVerdict, SentimentLabel};

/// A preceding negator flips and dampens the next sentiment word.
const NEGATION_FACTOR: f64 = -0.5;
/// A preceding intensifier amplifies the next sentiment word.
const INTENSIFIER_FACTOR: f64 = 1.3;

const NEGATORS: &[&str] = &[
    "not", "no", "never", "none", "neither", "nor", "cannot", "dont", "doesnt", "didnt",
    "isnt", "wasnt", "arent", "werent", "cant", "wont", "couldnt", "shouldnt", "wouldnt",
    "aint",
];

const INTENSIFIERS: &[&str] = &[
    "very", "really", "extremely", "so", "totally", "absolutely", "incredibly",
];

/// Raw scores from the lexicon pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LexiconScores {
    /// Mean matched polarity in [-1, 1].
    pub polarity: f64,
    /// Mean matched subjectivity in [0, 1].
    pub subjectivity: f64,
}

/// Polarity-based estimator (strategy A).
pub struct LexiconEstimator {
    entries: HashMap<&'static str, (f64, f64)>,
    positive_threshold: f64,
    negative_threshold: f64,
}

impl LexiconEstimator {
    pub fn new(positive_threshold: f64, negative_threshold: f64) -> Self {
        let mut estimator = Self {
            entries: HashMap::new(),
            positive_threshold,
            negative_threshold,
        };
        estimator.initialize_lexicon();
        estimator
    }

    /// (word, polarity, subjectivity) entries for everyday conversation.
    fn initialize_lexicon(&mut self) {
        let entries: &[(&'static str, f64, f64)] = &[
            ("love", 0.5, 0.6),
            ("loved", 0.7, 0.8),
            ("loving", 0.6, 0.7),
            ("like", 0.3, 0.4),
            ("liked", 0.3, 0.4),
            ("great", 0.8, 0.75),
            ("good", 0.7, 0.6),
            ("nice", 0.6, 1.0),
            ("amazing", 0.6, 0.9),
            ("awesome", 1.0, 1.0),
            ("excellent", 1.0, 1.0),
            ("fantastic", 0.4, 0.9),
            ("wonderful", 1.0, 1.0),
            ("brilliant", 0.9, 0.9),
            ("perfect", 1.0, 1.0),
            ("beautiful", 0.85, 1.0),
            ("happy", 0.8, 1.0),
            ("glad", 0.5, 1.0),
            ("fun", 0.3, 0.2),
            ("enjoy", 0.4, 0.5),
            ("enjoyed", 0.4, 0.5),
            ("best", 1.0, 0.3),
            ("better", 0.5, 0.5),
            ("cool", 0.35, 0.65),
            ("thanks", 0.2, 0.2),
            ("congrats", 0.6, 0.7),
            ("win", 0.8, 0.4),
            ("won", 0.8, 0.4),
            ("hate", -0.8, 0.9),
            ("hated", -0.9, 0.7),
            ("terrible", -1.0, 1.0),
            ("awful", -1.0, 1.0),
            ("horrible", -1.0, 1.0),
            ("bad", -0.7, 0.67),
            ("worse", -0.5, 0.6),
            ("worst", -1.0, 1.0),
            ("sad", -0.5, 1.0),
            ("angry", -0.5, 1.0),
            ("annoying", -0.6, 0.8),
            ("annoyed", -0.6, 0.8),
            ("broken", -0.4, 0.4),
            ("disappointing", -0.6, 0.7),
            ("disappointed", -0.75, 0.75),
            ("useless", -0.5, 0.4),
            ("boring", -1.0, 1.0),
            ("wrong", -0.5, 0.5),
            ("slow", -0.3, 0.4),
            ("ugly", -0.7, 1.0),
            ("stupid", -0.8, 0.9),
            ("poor", -0.4, 0.6),
            ("fail", -0.5, 0.5),
            ("failed", -0.5, 0.5),
            ("problem", -0.3, 0.3),
            ("lost", -0.4, 0.4),
            ("scam", -0.9, 0.8),
        ];
        for &(word, polarity, subjectivity) in entries {
            self.entries.insert(word, (polarity, subjectivity));
        }
    }

    /// Compute polarity and subjectivity over the whole text.
    pub fn scores(&self, text: &str) -> LexiconScores {
        let tokens: Vec<String> = text
            .split_whitespace()
            .map(|w| {
                w.trim_matches(|c: char| !c.is_alphanumeric())
                    .to_lowercase()
            })
            .filter(|w| !w.is_empty())
            .collect();

        let mut polarities = Vec::new();
        let mut subjectivities = Vec::new();

        for (i, token) in tokens.iter().enumerate() {
            let Some(&(polarity, subjectivity)) = self.entries.get(token.as_str()) else {
                continue;
            };
            let mut polarity = polarity;
            if i > 0 {
                let prev = tokens[i - 1].as_str();
                if NEGATORS.contains(&prev) {
                    polarity *= NEGATION_FACTOR;
                } else if INTENSIFIERS.contains(&prev) {
                    polarity = (polarity * INTENSIFIER_FACTOR).clamp(-1.0, 1.0);
                }
            }
            polarities.push(polarity);
            subjectivities.push(subjectivity);
        }

        if polarities.is_empty() {
            return LexiconScores {
                polarity: 0.0,
                subjectivity: 0.0,
            };
        }

        LexiconScores {
            polarity: (polarities.iter().sum::<f64>() / polarities.len() as f64)
                .clamp(-1.0, 1.0),
            subjectivity: subjectivities.iter().sum::<f64>() / subjectivities.len() as f64,
        }
    }
}

#[async_trait]
impl SentimentEstimator for LexiconEstimator {
    fn kind(&self) -> EstimatorKind {
        EstimatorKind::Lexicon
    }

    async fn estimate(&self, text: &str) -> Result<EstimatorVerdict, EstimatorError> {
        let scores = self.scores(text);

        let label = if scores.polarity > self.positive_threshold {
            SentimentLabel::Positive
        } else if scores.polarity < self.negative_threshold {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        };

        Ok(EstimatorVerdict {
            label,
            score: scores.polarity,
            confidence: scores.polarity.abs(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimator() -> LexiconEstimator {
        LexiconEstimator::new(0.1, -0.1)
    }

    #[tokio::test]
    async fn test_positive_text() {
        let verdict = estimator().estimate("what a great day, I love it").await.unwrap();
        assert_eq!(verdict.label, SentimentLabel::Positive);
        assert!(verdict.score > 0.1);
        assert!((verdict.confidence - verdict.score.abs()).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_negative_text() {
        let verdict = estimator().estimate("this is terrible, I hate it").await.unwrap();
        assert_eq!(verdict.label, SentimentLabel::Negative);
        assert!(verdict.score < -0.1);
    }

    #[tokio::test]
    async fn test_unmatched_text_is_neutral_with_zero_confidence() {
        let verdict = estimator().estimate("the meeting is at noon").await.unwrap();
        assert_eq!(verdict.label, SentimentLabel::Neutral);
        assert_eq!(verdict.score, 0.0);
        assert_eq!(verdict.confidence, 0.0);
    }

    #[test]
    fn test_negation_flips_and_dampens() {
        let est = estimator();
        let plain = est.scores("good");
        let negated = est.scores("not good");
        assert!(plain.polarity > 0.0);
        assert!(negated.polarity < 0.0);
        assert!((negated.polarity - plain.polarity * NEGATION_FACTOR).abs() < 1e-9);
    }

    #[test]
    fn test_intensifier_amplifies() {
        let est = estimator();
        assert!(est.scores("very good").polarity > est.scores("good").polarity);
    }

    #[test]
    fn test_subjectivity_averages_matched_words() {
        let scores = estimator().scores("good fun");
        assert!((scores.subjectivity - (0.6 + 0.2) / 2.0).abs() < 1e-9);
    }
}
