use crate::translation::TranslationResult;
use crate::utils::{count_words, Result, TranslatorError};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const TRUNCATION_THRESHOLD: f64 = 0.7;
pub const EXPANSION_THRESHOLD: f64 = 1.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum QualityVerdict {
    PossiblyTruncated,
    PossiblyExpanded,
    Nominal,
}

impl std::fmt::Display for QualityVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QualityVerdict::PossiblyTruncated => write!(f, "possibly truncated"),
            QualityVerdict::PossiblyExpanded => write!(f, "possibly expanded"),
            QualityVerdict::Nominal => write!(f, "nominal"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct QualityReport {
    pub original_words: usize,
    pub translated_words: usize,
    pub ratio: f64,
    pub verdict: QualityVerdict,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AssembledTranslation {
    pub text: String,
    pub chunk_count: usize,
    pub quality: QualityReport,
}

/// Word-count ratio heuristic; not a correctness guarantee.
pub fn check_quality(original_words: usize, translated_words: usize) -> QualityReport {
    let ratio = if original_words == 0 {
        0.0
    } else {
        translated_words as f64 / original_words as f64
    };

    let verdict = if original_words == 0 {
        QualityVerdict::Nominal
    } else if ratio < TRUNCATION_THRESHOLD {
        QualityVerdict::PossiblyTruncated
    } else if ratio > EXPANSION_THRESHOLD {
        QualityVerdict::PossiblyExpanded
    } else {
        QualityVerdict::Nominal
    };

    QualityReport {
        original_words,
        translated_words,
        ratio,
        verdict,
    }
}

/// Joins per-chunk translations in index order.
///
/// Every index in `0..total` must have exactly one result. Missing indices
/// fail with `IncompleteTranslationError`; repeated or out-of-range indices
/// fail with `InconsistentResultsError`. Partial text is never produced.
pub fn assemble(
    total: usize,
    mut results: Vec<TranslationResult>,
    original_text: &str,
) -> Result<AssembledTranslation> {
    results.sort_by_key(|r| r.chunk_index);

    let duplicates: Vec<usize> = results
        .windows(2)
        .filter(|pair| pair[0].chunk_index == pair[1].chunk_index)
        .map(|pair| pair[0].chunk_index)
        .fold(Vec::new(), |mut acc, i| {
            if acc.last() != Some(&i) {
                acc.push(i);
            }
            acc
        });
    let out_of_range: Vec<usize> = results
        .iter()
        .map(|r| r.chunk_index)
        .filter(|&i| i >= total)
        .collect();

    if !duplicates.is_empty() || !out_of_range.is_empty() {
        return Err(TranslatorError::InconsistentResultsError {
            duplicates,
            out_of_range,
        });
    }

    let missing: Vec<usize> = (0..total)
        .filter(|i| results.binary_search_by_key(i, |r| r.chunk_index).is_err())
        .collect();

    if !missing.is_empty() {
        return Err(TranslatorError::IncompleteTranslationError { missing });
    }

    let translated_words: usize = results.iter().map(|r| r.translated_length).sum();
    let text = results
        .iter()
        .map(|r| r.translated_text.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    Ok(AssembledTranslation {
        text,
        chunk_count: total,
        quality: check_quality(count_words(original_text), translated_words),
    })
}
