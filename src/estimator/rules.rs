//! Rule-based compound estimator.
//!
//! Scores text with a valence lexicon plus ordering-aware rules: negation
//! scope, booster words, all-caps emphasis, and punctuation emphasis. The
//! summed valence is squashed into [-1, 1] with `x / sqrt(x² + α)`.

use std::collections::HashMap;

use async_trait::async_trait;

use super::{EstimatorError, EstimatorKind, SentimentEstimator};
use crate::models::{EstimatorVerdict, SentimentLabel};

/// Normalization constant for the compound score.
const ALPHA: f64 = 15.0;
/// Valence scaling applied when a negator precedes a sentiment word.
const NEGATION_SCALAR: f64 = -0.74;
/// Emphasis added for an all-caps sentiment word in mixed-case text.
const CAPS_INCREMENT: f64 = 0.733;
/// Booster increment per modifier word.
const BOOSTER_INCREMENT: f64 = 0.293;
/// Emphasis per exclamation mark, capped at four marks.
const EXCLAMATION_BOOST: f64 = 0.292;
/// Emphasis per question mark beyond the first, capped at 0.96.
const QUESTION_BOOST: f64 = 0.18;
/// Compound threshold for a positive label (inclusive).
const COMPOUND_POSITIVE: f64 = 0.05;
/// Compound threshold for a negative label (inclusive).
const COMPOUND_NEGATIVE: f64 = -0.05;

const NEGATORS: &[&str] = &[
    "not", "no", "never", "none", "nothing", "nowhere", "neither", "nor", "cannot",
    "dont", "doesnt", "didnt", "isnt", "wasnt", "arent", "werent", "cant", "wont",
    "couldnt", "shouldnt", "wouldnt", "aint", "without",
];

/// Raw scores from the rule pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleScores {
    /// Normalized compound score in [-1, 1].
    pub compound: f64,
    /// Proportion of positive valence mass.
    pub positive: f64,
    /// Proportion of negative valence mass.
    pub negative: f64,
    /// Proportion of neutral tokens.
    pub neutral: f64,
}

/// Rule-based estimator (strategy B).
pub struct RuleEstimator {
    valence: HashMap<&'static str, f64>,
    boosters: HashMap<&'static str, f64>,
}

impl RuleEstimator {
    pub fn new() -> Self {
        let mut estimator = Self {
            valence: HashMap::new(),
            boosters: HashMap::new(),
        };
        estimator.initialize_lexicon();
        estimator
    }

    /// Word valences on the usual [-4, 4] scale.
    fn initialize_lexicon(&mut self) {
        let valences: &[(&'static str, f64)] = &[
            ("love", 3.2),
            ("loved", 2.9),
            ("like", 1.5),
            ("liked", 1.6),
            ("great", 3.1),
            ("good", 1.9),
            ("nice", 1.8),
            ("amazing", 2.8),
            ("awesome", 3.1),
            ("excellent", 2.7),
            ("fantastic", 2.6),
            ("wonderful", 2.7),
            ("brilliant", 2.8),
            ("perfect", 2.7),
            ("beautiful", 2.9),
            ("happy", 2.7),
            ("glad", 2.0),
            ("fun", 2.3),
            ("enjoy", 2.2),
            ("enjoyed", 2.3),
            ("best", 3.2),
            ("better", 1.9),
            ("cool", 1.3),
            ("thanks", 1.9),
            ("congrats", 2.4),
            ("win", 2.8),
            ("won", 2.7),
            ("hate", -2.7),
            ("hated", -2.9),
            ("terrible", -3.1),
            ("awful", -3.1),
            ("horrible", -2.5),
            ("bad", -2.5),
            ("worse", -2.1),
            ("worst", -3.1),
            ("sad", -2.1),
            ("angry", -2.3),
            ("annoying", -1.8),
            ("annoyed", -1.8),
            ("broken", -1.6),
            ("disappointing", -2.2),
            ("disappointed", -2.0),
            ("useless", -1.8),
            ("boring", -1.3),
            ("wrong", -2.1),
            ("stupid", -2.4),
            ("poor", -1.9),
            ("fail", -2.5),
            ("failed", -2.3),
            ("lost", -1.3),
            ("problem", -1.7),
            ("ugly", -2.3),
            ("scam", -2.6),
        ];
        for &(word, score) in valences {
            self.valence.insert(word, score);
        }

        let boosters: &[(&'static str, f64)] = &[
            ("very", BOOSTER_INCREMENT),
            ("really", BOOSTER_INCREMENT),
            ("extremely", BOOSTER_INCREMENT),
            ("absolutely", BOOSTER_INCREMENT),
            ("incredibly", BOOSTER_INCREMENT),
            ("totally", BOOSTER_INCREMENT),
            ("so", BOOSTER_INCREMENT),
            ("slightly", -BOOSTER_INCREMENT),
            ("somewhat", -BOOSTER_INCREMENT),
            ("barely", -BOOSTER_INCREMENT),
            ("hardly", -BOOSTER_INCREMENT),
            ("kinda", -BOOSTER_INCREMENT),
        ];
        for &(word, score) in boosters {
            self.boosters.insert(word, score);
        }
    }

    /// Compute compound score and valence-mass proportions.
    pub fn scores(&self, text: &str) -> RuleScores {
        let raw_tokens: Vec<&str> = text.split_whitespace().collect();
        let cleaned: Vec<String> = raw_tokens
            .iter()
            .map(|w| {
                w.trim_matches(|c: char| !c.is_alphanumeric())
                    .to_lowercase()
            })
            .collect();

        let caps_differential = has_caps_differential(&raw_tokens);

        let mut sentiments: Vec<f64> = Vec::new();
        for (i, token) in cleaned.iter().enumerate() {
            if token.is_empty() {
                continue;
            }
            let Some(&base) = self.valence.get(token.as_str()) else {
                sentiments.push(0.0);
                continue;
            };

            let mut valence = base;

            // All-caps emphasis only matters when the text mixes cases.
            if caps_differential && is_all_caps(raw_tokens[i]) {
                valence += CAPS_INCREMENT * valence.signum();
            }

            // Boosters within the three preceding tokens, dampened by distance.
            for back in 1..=3usize {
                let Some(j) = i.checked_sub(back) else { break };
                if let Some(&boost) = self.boosters.get(cleaned[j].as_str()) {
                    let damping = match back {
                        1 => 1.0,
                        2 => 0.95,
                        _ => 0.9,
                    };
                    valence += boost * damping * valence.signum();
                }
            }

            // Negation anywhere in the three preceding tokens flips scope.
            let negated = (1..=3usize)
                .filter_map(|back| i.checked_sub(back))
                .any(|j| NEGATORS.contains(&cleaned[j].as_str()));
            if negated {
                valence *= NEGATION_SCALAR;
            }

            sentiments.push(valence);
        }

        let mut total: f64 = sentiments.iter().sum();
        let emphasis = punctuation_emphasis(text);
        if total > 0.0 {
            total += emphasis;
        } else if total < 0.0 {
            total -= emphasis;
        }

        let compound = (total / (total * total + ALPHA).sqrt()).clamp(-1.0, 1.0);

        let pos_mass: f64 = sentiments.iter().filter(|&&v| v > 0.0).map(|v| v + 1.0).sum();
        let neg_mass: f64 = sentiments
            .iter()
            .filter(|&&v| v < 0.0)
            .map(|v| v.abs() + 1.0)
            .sum();
        let neu_count = sentiments.iter().filter(|&&v| v == 0.0).count() as f64;
        let mass = pos_mass + neg_mass + neu_count;

        if mass == 0.0 {
            return RuleScores {
                compound: 0.0,
                positive: 0.0,
                negative: 0.0,
                neutral: 1.0,
            };
        }

        RuleScores {
            compound,
            positive: pos_mass / mass,
            negative: neg_mass / mass,
            neutral: neu_count / mass,
        }
    }
}

impl Default for RuleEstimator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SentimentEstimator for RuleEstimator {
    fn kind(&self) -> EstimatorKind {
        EstimatorKind::Rules
    }

    async fn estimate(&self, text: &str) -> Result<EstimatorVerdict, EstimatorError> {
        let scores = self.scores(text);

        let label = if scores.compound >= COMPOUND_POSITIVE {
            SentimentLabel::Positive
        } else if scores.compound <= COMPOUND_NEGATIVE {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        };

        Ok(EstimatorVerdict {
            label,
            score: scores.compound,
            confidence: scores.compound.abs(),
        })
    }
}

/// Whether the word is entirely uppercase letters (at least two).
fn is_all_caps(word: &str) -> bool {
    let letters: Vec<char> = word.chars().filter(|c| c.is_alphabetic()).collect();
    letters.len() >= 2 && letters.iter().all(|c| c.is_uppercase())
}

/// True when some but not all words are shouted.
fn has_caps_differential(words: &[&str]) -> bool {
    let alphabetic: Vec<&&str> = words
        .iter()
        .filter(|w| w.chars().any(|c| c.is_alphabetic()))
        .collect();
    let caps = alphabetic.iter().filter(|w| is_all_caps(w)).count();
    caps > 0 && caps < alphabetic.len()
}

/// Emphasis contributed by exclamation and question marks.
fn punctuation_emphasis(text: &str) -> f64 {
    let exclamations = text.chars().filter(|&c| c == '!').count().min(4);
    let questions = text.chars().filter(|&c| c == '?').count();
    let question_emphasis = match questions {
        0 | 1 => 0.0,
        2..=3 => questions as f64 * QUESTION_BOOST,
        _ => 0.96,
    };
    exclamations as f64 * EXCLAMATION_BOOST + question_emphasis
}
