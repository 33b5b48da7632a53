//! Dependency-aware chunk scheduler.
//!
//! Chunk `i` is dispatched only after chunk `i - 1` has completed and while
//! fewer than `concurrency_limit` chunks are processing. Every in-flight chunk
//! pins the context it was launched with. Completions are signalled through a
//! `JoinSet`; all bookkeeping happens on the orchestrating task between
//! completions, so job state needs no locking.

use crate::text_processor::{Chunk, ChunkBuilder};
use crate::translation::assembler::{assemble, AssembledTranslation};
use crate::translation::context::ContextManager;
use crate::translation::retry::{RetryOutcome, RetryPolicy};
use crate::translation::{ChunkRequest, ChunkTranslator, TranslationResult};
use crate::utils::{count_words, normalize_text, JobConfig, Result, TranslatorError};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChunkStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Idle,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Idle => write!(f, "idle"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
            JobStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct JobProgress {
    pub completed_chunks: usize,
    pub total_chunks: usize,
}

impl JobProgress {
    pub fn fraction(&self) -> f32 {
        if self.total_chunks == 0 {
            0.0
        } else {
            self.completed_chunks as f32 / self.total_chunks as f32
        }
    }
}

/// State of one translation request, owned by the orchestrator while it runs.
#[derive(Debug)]
pub struct TranslationJob {
    pub id: String,
    pub original_text: String,
    pub target_language: String,
    pub chunks: Vec<Chunk>,
    pub results: Vec<TranslationResult>,
    pub chunk_status: Vec<ChunkStatus>,
    /// Context pinned by the most recently dispatched chunk.
    pub context: String,
    pub status: JobStatus,
    pub retries: usize,
    cancel: CancellationToken,
}

impl TranslationJob {
    pub fn new(original_text: &str, target_language: &str) -> Self {
        Self::with_cancellation(original_text, target_language, CancellationToken::new())
    }

    pub fn with_cancellation(
        original_text: &str,
        target_language: &str,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            original_text: original_text.to_string(),
            target_language: target_language.to_string(),
            chunks: Vec::new(),
            results: Vec::new(),
            chunk_status: Vec::new(),
            context: String::new(),
            status: JobStatus::Idle,
            retries: 0,
            cancel,
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_translating(&self) -> bool {
        self.status == JobStatus::Running
    }

    pub fn progress(&self) -> JobProgress {
        JobProgress {
            completed_chunks: self.completed_chunks(),
            total_chunks: self.chunks.len(),
        }
    }

    pub fn completed_chunks(&self) -> usize {
        self.count_status(ChunkStatus::Completed)
    }

    pub fn processing_chunks(&self) -> usize {
        self.count_status(ChunkStatus::Processing)
    }

    fn count_status(&self, status: ChunkStatus) -> usize {
        self.chunk_status.iter().filter(|s| **s == status).count()
    }

    /// Lowest pending chunk whose predecessor is completed, if a slot is free.
    pub fn next_eligible(&self, concurrency_limit: usize) -> Option<usize> {
        if self.processing_chunks() >= concurrency_limit {
            return None;
        }

        self.chunk_status.iter().enumerate().find_map(|(i, status)| {
            let ready = *status == ChunkStatus::Pending
                && (i == 0 || self.chunk_status[i - 1] == ChunkStatus::Completed);
            ready.then_some(i)
        })
    }

    /// Replaces everything derived from a previous run with fresh values.
    fn reset(&mut self) {
        self.chunks = Vec::new();
        self.results = Vec::new();
        self.chunk_status = Vec::new();
        self.context = String::new();
        self.retries = 0;
        self.status = JobStatus::Idle;
    }

    fn abort(&mut self, status: JobStatus) {
        self.results = Vec::new();
        self.status = status;
    }
}

type ChunkOutcome = (usize, Result<RetryOutcome<TranslationResult>>);

enum SchedulerEvent {
    Cancelled,
    Settled(Option<std::result::Result<ChunkOutcome, tokio::task::JoinError>>),
}

pub struct Orchestrator {
    translator: Arc<dyn ChunkTranslator>,
    config: JobConfig,
    retry: RetryPolicy,
    context: ContextManager,
}

impl Orchestrator {
    pub fn new(translator: Arc<dyn ChunkTranslator>, config: JobConfig) -> Self {
        let retry = RetryPolicy::from_config(&config.retry);
        let context = ContextManager::new(config.chunking.context_size);
        Self {
            translator,
            config,
            retry,
            context,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub async fn run(&self, job: &mut TranslationJob) -> Result<AssembledTranslation> {
        self.run_with_progress(job, |_| {}).await
    }

    /// Drives `job` to a terminal state. `on_progress` is called once with
    /// `0/total` after chunking, then after every chunk completion.
    pub async fn run_with_progress<F>(
        &self,
        job: &mut TranslationJob,
        on_progress: F,
    ) -> Result<AssembledTranslation>
    where
        F: Fn(JobProgress) + Send + Sync,
    {
        job.reset();
        job.status = JobStatus::Running;

        match self.execute(job, &on_progress).await {
            Ok(assembled) => {
                job.status = JobStatus::Completed;
                info!(
                    job_id = %job.id,
                    chunks = assembled.chunk_count,
                    retries = job.retries,
                    ratio = assembled.quality.ratio,
                    verdict = %assembled.quality.verdict,
                    "Translation completed"
                );
                Ok(assembled)
            }
            Err(TranslatorError::Cancelled) => {
                job.abort(JobStatus::Cancelled);
                info!(job_id = %job.id, "Translation cancelled");
                Err(TranslatorError::Cancelled)
            }
            Err(e) => {
                job.abort(JobStatus::Failed);
                error!(job_id = %job.id, error = %e, "Translation failed");
                Err(e)
            }
        }
    }

    async fn execute<F>(
        &self,
        job: &mut TranslationJob,
        on_progress: &F,
    ) -> Result<AssembledTranslation>
    where
        F: Fn(JobProgress) + Send + Sync,
    {
        let words = count_words(&job.original_text);
        let max = self.config.chunking.max_document_words;
        if words > max {
            return Err(TranslatorError::InputTooLarge { words, max });
        }

        let normalized = normalize_text(&job.original_text);
        job.chunks = ChunkBuilder::from_config(&self.config.chunking).build(&normalized);
        if job.chunks.is_empty() {
            return Err(TranslatorError::EmptyInputError);
        }

        let total = job.chunks.len();
        job.chunk_status = vec![ChunkStatus::Pending; total];
        info!(
            job_id = %job.id,
            words,
            chunks = total,
            target_language = %job.target_language,
            "Starting translation"
        );
        on_progress(job.progress());

        let limit = self.config.concurrency_limit.max(1);
        let cancel = job.cancellation_token();
        let mut in_flight: JoinSet<ChunkOutcome> = JoinSet::new();

        while job.completed_chunks() < total {
            if cancel.is_cancelled() {
                in_flight.abort_all();
                return Err(TranslatorError::Cancelled);
            }

            while let Some(index) = job.next_eligible(limit) {
                self.dispatch(job, index, &mut in_flight);
            }

            let event = tokio::select! {
                biased;
                _ = cancel.cancelled() => SchedulerEvent::Cancelled,
                settled = in_flight.join_next() => SchedulerEvent::Settled(settled),
            };

            match event {
                SchedulerEvent::Cancelled => {
                    in_flight.abort_all();
                    return Err(TranslatorError::Cancelled);
                }
                SchedulerEvent::Settled(None) => {
                    // Nothing in flight and nothing eligible: a predecessor is stuck.
                    let missing: Vec<usize> = (0..total)
                        .filter(|&i| job.chunk_status[i] != ChunkStatus::Completed)
                        .collect();
                    return Err(TranslatorError::IncompleteTranslationError { missing });
                }
                SchedulerEvent::Settled(Some(Err(join_error))) => {
                    in_flight.abort_all();
                    error!(
                        job_id = %job.id,
                        error = %join_error,
                        "Chunk task did not finish"
                    );
                    return Err(TranslatorError::InternalError(join_error.to_string()));
                }
                SchedulerEvent::Settled(Some(Ok((index, Ok(outcome))))) => {
                    job.chunk_status[index] = ChunkStatus::Completed;
                    job.retries += outcome.retries;
                    job.results.push(outcome.value);

                    let progress = job.progress();
                    debug!(
                        job_id = %job.id,
                        chunk_index = index,
                        retries = outcome.retries,
                        completed = progress.completed_chunks,
                        total,
                        "Chunk translated"
                    );
                    on_progress(progress);
                }
                SchedulerEvent::Settled(Some(Ok((index, Err(e))))) => {
                    job.chunk_status[index] = ChunkStatus::Error;
                    in_flight.abort_all();
                    if !e.is_cancelled() {
                        warn!(
                            job_id = %job.id,
                            chunk_index = index,
                            error = %e,
                            "Chunk failed, aborting job"
                        );
                    }
                    return Err(e);
                }
            }
        }

        assemble(total, job.results.clone(), &job.original_text)
    }

    fn dispatch(
        &self,
        job: &mut TranslationJob,
        index: usize,
        in_flight: &mut JoinSet<ChunkOutcome>,
    ) {
        let context = self.context.context_for(index, &job.results);
        job.chunk_status[index] = ChunkStatus::Processing;
        job.context = context.clone();

        let chunk = &job.chunks[index];
        let request = ChunkRequest {
            chunk_index: index,
            text: chunk.text.clone(),
            target_language: job.target_language.clone(),
            context,
        };
        debug!(
            job_id = %job.id,
            chunk_index = index,
            words = chunk.word_count,
            context_words = count_words(&request.context),
            "Dispatching chunk"
        );

        let translator = Arc::clone(&self.translator);
        let retry = self.retry.clone();
        let cancel = job.cancellation_token();

        in_flight.spawn(async move {
            let translator = &translator;
            let request = &request;
            let cancel_ref = &cancel;
            let outcome = retry
                .run(index, cancel_ref, move |_| async move {
                    translator.translate(request, cancel_ref).await
                })
                .await;
            (index, outcome)
        });
    }
}
