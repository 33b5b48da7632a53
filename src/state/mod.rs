pub mod registry;

pub use registry::{JobHandle, JobRegistry, JobResult, JobSnapshot};

use crate::translation::{
    validate_language, ChunkTranslator, JobProgress, LanguageCatalog, Orchestrator,
    TranslationJob,
};
use crate::utils::{count_words, AppConfig, Result, TranslatorError};
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub translator: Arc<dyn ChunkTranslator>,
    pub jobs: JobRegistry,
}

impl AppState {
    pub fn new(config: AppConfig, translator: Arc<dyn ChunkTranslator>) -> Self {
        Self {
            config,
            translator,
            jobs: JobRegistry::new(),
        }
    }

    /// Validates and starts a background translation job.
    ///
    /// Oversized documents and unknown languages are rejected before any
    /// chunking or network call; a running job causes `JobAlreadyRunning`.
    pub async fn start_translation(
        &self,
        text: &str,
        target_language: &str,
        catalog: Option<&LanguageCatalog>,
    ) -> Result<JobHandle> {
        let words = count_words(text);
        let max = self.config.chunking.max_document_words;
        if words > max {
            return Err(TranslatorError::InputTooLarge { words, max });
        }

        if let Some(catalog) = catalog {
            validate_language(catalog, target_language)?;
        }

        let handle = self.jobs.try_begin(target_language, words).await?;

        let job = TranslationJob::with_cancellation(text, target_language, handle.cancel.clone())
            .with_id(&handle.job_id);
        let orchestrator = Orchestrator::new(
            Arc::clone(&self.translator),
            self.config.job_config(target_language),
        );
        let jobs = self.jobs.clone();
        let job_id = handle.job_id.clone();

        tokio::spawn(async move {
            run_job(orchestrator, job, jobs, job_id).await;
        });

        Ok(handle)
    }
}

async fn run_job(
    orchestrator: Orchestrator,
    mut job: TranslationJob,
    jobs: JobRegistry,
    job_id: String,
) {
    let (progress_tx, mut progress_rx) = mpsc::unbounded_channel::<JobProgress>();

    let progress_jobs = jobs.clone();
    let progress_id = job_id.clone();
    let progress_task = tokio::spawn(async move {
        while let Some(progress) = progress_rx.recv().await {
            tracing::info!(
                job_id = %progress_id,
                completed = progress.completed_chunks,
                total = progress.total_chunks,
                "Translation progress"
            );
            progress_jobs.update_progress(&progress_id, progress).await;
        }
    });

    let outcome = orchestrator
        .run_with_progress(&mut job, move |progress| {
            let _ = progress_tx.send(progress);
        })
        .await;

    // Sender dropped with the callback; the progress task drains and exits.
    let _ = progress_task.await;
    jobs.finish(&job_id, outcome).await;
}
