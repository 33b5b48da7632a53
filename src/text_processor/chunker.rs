use crate::text_processor::segmenter::{segment_text, Segment};
use crate::utils::{count_words, trailing_words, ChunkingConfig};
use serde::{Deserialize, Serialize};

/// One translation unit. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub index: usize,
    pub total: usize,
    pub word_count: usize,
    /// Leading words repeated from the previous chunk for context.
    pub overlap_words: usize,
}

impl Chunk {
    pub fn is_last(&self) -> bool {
        self.index + 1 == self.total
    }

    /// Words of this chunk that are not repeated from its predecessor.
    pub fn core_words(&self) -> Vec<&str> {
        self.text
            .split_whitespace()
            .skip(self.overlap_words)
            .collect()
    }
}

pub struct ChunkBuilder {
    max_chunk_size: usize,
    overlap_size: usize,
}

impl ChunkBuilder {
    pub fn new(max_chunk_size: usize, overlap_size: usize) -> Self {
        Self {
            max_chunk_size: max_chunk_size.max(1),
            overlap_size,
        }
    }

    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(config.max_chunk_size, config.overlap_size)
    }

    pub fn build(&self, text: &str) -> Vec<Chunk> {
        let segments = segment_text(text, self.max_chunk_size);
        self.pack(&segments)
    }

    /// Greedy packing of segments; see [`ChunkBuilder::build`].
    pub fn pack(&self, segments: &[Segment]) -> Vec<Chunk> {
        let mut drafts: Vec<Draft> = Vec::new();
        let mut current = Draft::default();

        for segment in segments {
            let would_exceed = current.words + segment.word_count > self.max_chunk_size;

            if would_exceed && current.has_content() {
                let overlap = trailing_words(&current.text, self.overlap_size);
                drafts.push(std::mem::take(&mut current));
                current.seed(&overlap);
            }

            current.push(segment);
        }

        if current.has_content() {
            drafts.push(current);
        }

        let drafts: Vec<Draft> = drafts
            .into_iter()
            .filter(|d| !d.text.trim().is_empty())
            .collect();
        let total = drafts.len();

        drafts
            .into_iter()
            .enumerate()
            .map(|(index, draft)| Chunk {
                word_count: count_words(&draft.text),
                text: draft.text,
                index,
                total,
                overlap_words: draft.overlap_words,
            })
            .collect()
    }
}

#[derive(Debug, Default)]
struct Draft {
    text: String,
    words: usize,
    overlap_words: usize,
    segments: usize,
}

impl Draft {
    fn has_content(&self) -> bool {
        self.segments > 0
    }

    fn seed(&mut self, overlap: &str) {
        self.overlap_words = count_words(overlap);
        self.words = self.overlap_words;
        self.text = overlap.to_string();
    }

    fn push(&mut self, segment: &Segment) {
        if !self.text.is_empty() {
            self.text.push_str(segment.separator());
        }
        self.text.push_str(&segment.text);
        self.words += segment.word_count;
        self.segments += 1;
    }
}
