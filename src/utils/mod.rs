pub mod config;
pub mod errors;

pub use config::{
    ApiConfig, AppConfig, ChunkingConfig, Credentials, JobConfig, RetryConfig, SchedulerConfig,
};
pub use errors::{Result, TranslatorError};

use once_cell::sync::Lazy;
use regex::Regex;

pub const PARAGRAPH_BREAK: &str = "\n\n";

static PARAGRAPH_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t\r\f\v]*\n\s*").unwrap());

/// Trims the text, collapses whitespace runs inside each paragraph to single
/// spaces, and rejoins paragraphs with exactly one blank line.
pub fn normalize_text(text: &str) -> String {
    split_paragraphs(text).join(PARAGRAPH_BREAK)
}

/// Paragraphs of `text`, each whitespace-collapsed and non-empty.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    PARAGRAPH_SPLIT
        .split(text.trim())
        .map(collapse_whitespace)
        .filter(|p| !p.is_empty())
        .collect()
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// The last `n` whitespace-separated words of `text`, joined by single spaces.
pub fn trailing_words(text: &str, n: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    let start = words.len().saturating_sub(n);
    words[start..].join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_keeps_paragraph_breaks() {
        let raw = "  First   line\nstill first.\n\n\n  Second\tparagraph.  \n \n Third. ";
        assert_eq!(
            normalize_text(raw),
            "First line still first.\n\nSecond paragraph.\n\nThird."
        );
    }

    #[test]
    fn whitespace_only_input_normalizes_to_empty() {
        assert_eq!(normalize_text(" \n\n \t "), "");
        assert!(split_paragraphs("   ").is_empty());
    }

    #[test]
    fn trailing_words_handles_short_text() {
        assert_eq!(trailing_words("a b c", 2), "b c");
        assert_eq!(trailing_words("a b c", 10), "a b c");
        assert_eq!(trailing_words("", 3), "");
    }
}
