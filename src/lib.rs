pub mod server;
pub mod state;
pub mod text_processor;
pub mod translation;
pub mod utils;

pub use server::{HttpState, TranslatorServer};
pub use state::{AppState, JobRegistry, JobResult, JobSnapshot};
pub use text_processor::{analyze_text, Chunk, ChunkBuilder, DocumentAnalysis};
pub use translation::{
    AssembledTranslation, ChunkTranslator, Orchestrator, QualityVerdict, TranslationClient,
    TranslationJob, TranslationResult,
};
pub use utils::{AppConfig, JobConfig, Result, TranslatorError};
