pub mod assembler;
pub mod client;
pub mod context;
pub mod orchestrator;
pub mod retry;

pub use assembler::{assemble, check_quality, AssembledTranslation, QualityReport, QualityVerdict};
pub use client::TranslationClient;
pub use context::{extract_context, ContextManager};
pub use orchestrator::{ChunkStatus, JobProgress, JobStatus, Orchestrator, TranslationJob};
pub use retry::{RetryOutcome, RetryPolicy};

use crate::utils::{Result, TranslatorError};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;

/// Everything the remote service needs to translate one chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRequest {
    pub chunk_index: usize,
    pub text: String,
    pub target_language: String,
    pub context: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TranslationResult {
    pub chunk_index: usize,
    pub translated_text: String,
    pub original_length: usize,
    pub translated_length: usize,
}

/// One attempt at translating one chunk.
///
/// Implementations must return [`TranslatorError::Cancelled`] promptly once
/// `cancel` fires, and must not retry on their own; retries belong to
/// [`RetryPolicy`].
#[async_trait]
pub trait ChunkTranslator: Send + Sync {
    async fn translate(
        &self,
        request: &ChunkRequest,
        cancel: &CancellationToken,
    ) -> Result<TranslationResult>;
}

/// Language code to display name, as served by the languages endpoint.
pub type LanguageCatalog = BTreeMap<String, String>;

pub fn validate_language(catalog: &LanguageCatalog, target_language: &str) -> Result<()> {
    if catalog.contains_key(target_language) {
        Ok(())
    } else {
        Err(TranslatorError::UnsupportedLanguage(format!(
            "{} (available: {})",
            target_language,
            catalog.keys().cloned().collect::<Vec<_>>().join(", ")
        )))
    }
}
