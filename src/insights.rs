//! Secondary-signal extraction from raw message text.
//!
//! Operates on the text as observed (before normalization) together with
//! the fused verdict. Pure; all thresholds and marker lists are fixed
//! configuration, and the sarcasm check is a marker-phrase heuristic, not
//! a model.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::AnalysisConfig;
use crate::models::{EmotionalIntensity, FusedVerdict, Insights, SentimentLabel};

static CAPS_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Z]{3,}").unwrap());
static MENTION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@(\w+)").unwrap());
static HASHTAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#(\w+)").unwrap());

/// Emoji code-point ranges recognized by `has_emoji`.
const EMOJI_RANGES: &[(u32, u32)] = &[
    (0x1F600, 0x1F64F), // emoticons
    (0x1F300, 0x1F5FF), // symbols & pictographs
    (0x1F680, 0x1F6FF), // transport & map symbols
    (0x1F1E0, 0x1F1FF), // flags
];

/// Derives insight flags from raw text and the fused verdict.
#[derive(Debug, Clone)]
pub struct InsightExtractor {
    sarcasm_markers: Vec<String>,
    intensity_high: f64,
    intensity_medium: f64,
}

impl InsightExtractor {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            sarcasm_markers: config
                .sarcasm_markers
                .iter()
                .map(|m| m.to_lowercase())
                .collect(),
            intensity_high: config.intensity_high,
            intensity_medium: config.intensity_medium,
        }
    }

    /// Extract insights for one message.
    pub fn extract(&self, raw_text: &str, fused: Option<&FusedVerdict>) -> Insights {
        let lower = raw_text.to_lowercase();

        Insights {
            word_count: raw_text.split_whitespace().count(),
            has_emoji: raw_text.chars().any(is_emoji),
            has_caps: CAPS_RUN.is_match(raw_text),
            has_exclamation: raw_text.contains('!'),
            has_question: raw_text.contains('?'),
            potential_sarcasm: self
                .sarcasm_markers
                .iter()
                .any(|marker| lower.contains(marker.as_str())),
            emotional_intensity: self.intensity(fused),
            mentions: captured_words(&MENTION, &lower),
            hashtags: captured_words(&HASHTAG, &lower),
        }
    }

    fn intensity(&self, fused: Option<&FusedVerdict>) -> EmotionalIntensity {
        let Some(fused) = fused else {
            return EmotionalIntensity::Neutral;
        };
        if fused.label == SentimentLabel::Neutral {
            EmotionalIntensity::Neutral
        } else if fused.confidence > self.intensity_high {
            EmotionalIntensity::High
        } else if fused.confidence > self.intensity_medium {
            EmotionalIntensity::Medium
        } else {
            EmotionalIntensity::Low
        }
    }
}

fn is_emoji(c: char) -> bool {
    let cp = c as u32;
    EMOJI_RANGES.iter().any(|&(lo, hi)| cp >= lo && cp <= hi)
}

fn captured_words(pattern: &Regex, text: &str) -> Vec<String> {
    pattern
        .captures_iter(text)
        .map(|cap| cap[1].to_string())
        .collect()
}
