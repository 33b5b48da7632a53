use crate::utils::{count_words, split_paragraphs};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static SENTENCE_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[.!?]+["'”’)\]]*(\s+|$)"#).unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentKind {
    Paragraph,
    Sentence,
    /// Piece of a sentence that alone exceeded the word limit.
    Fragment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,
    pub kind: SegmentKind,
    /// First segment of its paragraph; joins to its predecessor with a blank line.
    pub starts_paragraph: bool,
    pub word_count: usize,
}

impl Segment {
    fn new(text: String, kind: SegmentKind, starts_paragraph: bool) -> Self {
        let word_count = count_words(&text);
        Self {
            text,
            kind,
            starts_paragraph,
            word_count,
        }
    }

    /// Separator to place between the previous segment and this one.
    pub fn separator(&self) -> &'static str {
        if self.starts_paragraph {
            crate::utils::PARAGRAPH_BREAK
        } else {
            " "
        }
    }
}

/// Splits text into ordered segments of at most `max_words` words each,
/// preferring paragraph, then sentence boundaries.
pub fn segment_text(text: &str, max_words: usize) -> Vec<Segment> {
    let max_words = max_words.max(1);
    let mut segments = Vec::new();

    for paragraph in split_paragraphs(text) {
        if count_words(&paragraph) <= max_words {
            segments.push(Segment::new(paragraph, SegmentKind::Paragraph, true));
            continue;
        }

        let mut first_in_paragraph = true;
        for sentence in split_sentences(&paragraph) {
            if count_words(&sentence) <= max_words {
                segments.push(Segment::new(
                    sentence,
                    SegmentKind::Sentence,
                    first_in_paragraph,
                ));
                first_in_paragraph = false;
                continue;
            }

            tracing::debug!(
                words = count_words(&sentence),
                max_words,
                "Sentence exceeds chunk limit, splitting at word boundary"
            );
            for piece in force_split(&sentence, max_words) {
                segments.push(Segment::new(
                    piece,
                    SegmentKind::Fragment,
                    first_in_paragraph,
                ));
                first_in_paragraph = false;
            }
        }
    }

    segments
}

/// Sentences of a single whitespace-collapsed paragraph, terminal punctuation kept.
pub fn split_sentences(paragraph: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;

    for m in SENTENCE_END.find_iter(paragraph) {
        let sentence = paragraph[start..m.end()].trim();
        if !sentence.is_empty() {
            sentences.push(sentence.to_string());
        }
        start = m.end();
    }

    let rest = paragraph[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest.to_string());
    }

    sentences
}

fn force_split(sentence: &str, max_words: usize) -> Vec<String> {
    let words: Vec<&str> = sentence.split_whitespace().collect();
    words
        .chunks(max_words)
        .map(|piece| piece.join(" "))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize, prefix: &str) -> String {
        (0..n)
            .map(|i| format!("{}{}", prefix, i))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn short_paragraphs_stay_whole() {
        let segments = segment_text("One two three.\n\nFour five.", 10);
        assert_eq!(segments.len(), 2);
        assert!(segments.iter().all(|s| s.kind == SegmentKind::Paragraph));
        assert_eq!(segments[1].text, "Four five.");
    }

    #[test]
    fn long_paragraph_splits_into_sentences() {
        let text = "Alpha beta gamma. Delta epsilon! Zeta eta theta? Iota.";
        let segments = segment_text(text, 4);

        let texts: Vec<&str> = segments.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["Alpha beta gamma.", "Delta epsilon!", "Zeta eta theta?", "Iota."]
        );
        assert!(segments[0].starts_paragraph);
        assert!(!segments[1].starts_paragraph);
        assert!(segments.iter().all(|s| s.kind == SegmentKind::Sentence));
    }

    #[test]
    fn oversized_sentence_is_force_split_as_last_resort() {
        let sentence = format!("{}.", words(25, "w"));
        let segments = segment_text(&sentence, 10);

        assert_eq!(segments.len(), 3);
        assert!(segments.iter().all(|s| s.kind == SegmentKind::Fragment));
        assert_eq!(segments[0].word_count, 10);
        assert_eq!(segments[1].word_count, 10);
        assert_eq!(segments[2].word_count, 5);
    }

    #[test]
    fn no_segment_is_empty() {
        let segments = segment_text("  \n\n Hello.   \n\n\n  ", 5);
        assert_eq!(segments.len(), 1);
        assert!(segments.iter().all(|s| !s.text.trim().is_empty()));
    }

    #[test]
    fn sentence_split_keeps_closing_quotes() {
        let sentences = split_sentences(r#"He said "stop." Then he left."#);
        assert_eq!(sentences, vec![r#"He said "stop.""#, "Then he left."]);
    }

    #[test]
    fn decimal_points_do_not_end_sentences() {
        let sentences = split_sentences("It cost 3.50 dollars. Cheap.");
        assert_eq!(sentences, vec!["It cost 3.50 dollars.", "Cheap."]);
    }
}
