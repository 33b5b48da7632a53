pub mod analyzer;
pub mod chunker;
pub mod segmenter;

pub use analyzer::{analyze_text, DocumentAnalysis};
pub use chunker::{Chunk, ChunkBuilder};
pub use segmenter::{segment_text, split_sentences, Segment, SegmentKind};
