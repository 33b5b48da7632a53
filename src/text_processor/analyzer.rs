use crate::text_processor::chunker::ChunkBuilder;
use crate::text_processor::segmenter::split_sentences;
use crate::utils::{count_words, split_paragraphs, ChunkingConfig};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DocumentAnalysis {
    pub word_count: usize,
    pub paragraph_count: usize,
    pub sentence_count: usize,
    pub estimated_chunks: usize,
    pub max_document_words: usize,
    pub exceeds_limit: bool,
}

/// Measures a document without contacting the translation service.
pub fn analyze_text(text: &str, config: &ChunkingConfig) -> DocumentAnalysis {
    let paragraphs = split_paragraphs(text);
    let word_count = paragraphs.iter().map(|p| count_words(p)).sum();
    let sentence_count = paragraphs.iter().map(|p| split_sentences(p).len()).sum();
    let exceeds_limit = word_count > config.max_document_words;

    let estimated_chunks = if exceeds_limit {
        0
    } else {
        ChunkBuilder::from_config(config).build(text).len()
    };

    DocumentAnalysis {
        word_count,
        paragraph_count: paragraphs.len(),
        sentence_count,
        estimated_chunks,
        max_document_words: config.max_document_words,
        exceeds_limit,
    }
}
