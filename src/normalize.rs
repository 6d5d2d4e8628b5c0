//! Text normalization ahead of sentiment scoring.
//!
//! Strips the noise that overwhelms polarity estimators (URLs, repeated
//! punctuation, platform markup) while keeping the words that carry
//! sentiment. Pure and deterministic; insight extraction reads the raw
//! text, not this output.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::Platform;

static URL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"https?://\S+").unwrap());
static NON_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s.,!?;:\-@#]").unwrap());
static REPOST_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bRT\b").unwrap());
static EXCLAMATION_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"!{2,}").unwrap());
static QUESTION_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\?{2,}").unwrap());
static SIGIL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[@#](\w+)").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Normalize raw message text for estimation.
///
/// URLs are removed before the character filter runs; filtering first
/// would strip the scheme separators and leave URL fragments behind.
/// Runs of `!` or `?` collapse to a single occurrence so emphasis stays
/// visible without its magnitude. Mention/hashtag sigils are dropped but
/// the underlying word is kept for sentiment context.
pub fn normalize(text: &str, platform: Platform) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut cleaned = URL.replace_all(text, " ").into_owned();
    cleaned = NON_TEXT.replace_all(&cleaned, "").into_owned();

    if platform == Platform::Twitter {
        cleaned = REPOST_MARKER.replace_all(&cleaned, " ").into_owned();
    }

    cleaned = EXCLAMATION_RUN.replace_all(&cleaned, "!").into_owned();
    cleaned = QUESTION_RUN.replace_all(&cleaned, "?").into_owned();
    cleaned = SIGIL.replace_all(&cleaned, "$1").into_owned();
    cleaned = WHITESPACE.replace_all(&cleaned, " ").into_owned();

    cleaned.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize("", Platform::Whatsapp), "");
        assert_eq!(normalize("   ", Platform::Whatsapp), "");
    }

    #[test]
    fn test_strips_urls_entirely() {
        assert_eq!(
            normalize("check this https://example.com/a?b=c out", Platform::Whatsapp),
            "check this out"
        );
    }

    #[test]
    fn test_collapses_punctuation_runs() {
        assert_eq!(
            normalize("I love this!!! Really??", Platform::Whatsapp),
            "I love this! Really?"
        );
    }

    #[test]
    fn test_strips_repost_marker_on_twitter_only() {
        assert_eq!(normalize("RT great news", Platform::Twitter), "great news");
        assert_eq!(normalize("RT great news", Platform::Whatsapp), "RT great news");
        // Only the standalone token is a repost marker.
        assert_eq!(normalize("START here", Platform::Twitter), "START here");
    }

    #[test]
    fn test_keeps_words_behind_sigils() {
        assert_eq!(
            normalize("@ana loved #mondays", Platform::Twitter),
            "ana loved mondays"
        );
    }

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(normalize("so \t much\n\nspace", Platform::Whatsapp), "so much space");
    }
}
