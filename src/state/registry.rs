use crate::translation::{AssembledTranslation, JobProgress, JobStatus};
use crate::utils::{Result, TranslatorError};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct JobSnapshot {
    pub job_id: String,
    pub status: JobStatus,
    pub target_language: String,
    pub word_count: usize,
    pub completed_chunks: usize,
    pub total_chunks: usize,
    pub progress: f32,
    pub start_time: u64,
    pub estimated_time_remaining: Option<u64>,
    pub message: Option<String>,
}

impl JobSnapshot {
    fn new(job_id: String, target_language: String, word_count: usize) -> Self {
        Self {
            job_id,
            status: JobStatus::Running,
            target_language,
            word_count,
            completed_chunks: 0,
            total_chunks: 0,
            progress: 0.0,
            start_time: now_secs(),
            estimated_time_remaining: None,
            message: None,
        }
    }

    pub fn update_progress(&mut self, progress: JobProgress) {
        self.completed_chunks = progress.completed_chunks;
        self.total_chunks = progress.total_chunks;
        self.progress = progress.fraction();

        if self.completed_chunks > 0 {
            let elapsed = now_secs().saturating_sub(self.start_time);
            let rate = self.completed_chunks as f64 / elapsed.max(1) as f64;
            let remaining = self.total_chunks.saturating_sub(self.completed_chunks);
            self.estimated_time_remaining = Some((remaining as f64 / rate.max(0.001)) as u64);
        }
    }
}

/// Final state of the most recently finished job.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct JobResult {
    pub job_id: String,
    pub status: JobStatus,
    pub translation: Option<AssembledTranslation>,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct JobHandle {
    pub job_id: String,
    pub cancel: CancellationToken,
}

#[derive(Debug, Default)]
struct RegistryInner {
    active: Option<JobHandle>,
    snapshot: Option<JobSnapshot>,
    result: Option<JobResult>,
}

/// Tracks the single job allowed to run at a time.
#[derive(Debug, Clone, Default)]
pub struct JobRegistry {
    inner: Arc<RwLock<RegistryInner>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the running slot. A second submission while a job runs is
    /// rejected, never queued.
    pub async fn try_begin(&self, target_language: &str, word_count: usize) -> Result<JobHandle> {
        let mut inner = self.inner.write().await;

        if let Some(active) = &inner.active {
            tracing::warn!(
                job_id = %active.job_id,
                "Rejecting translation request: a job is already running"
            );
            return Err(TranslatorError::JobAlreadyRunning(active.job_id.clone()));
        }

        let handle = JobHandle {
            job_id: Uuid::new_v4().to_string(),
            cancel: CancellationToken::new(),
        };

        inner.active = Some(handle.clone());
        inner.snapshot = Some(JobSnapshot::new(
            handle.job_id.clone(),
            target_language.to_string(),
            word_count,
        ));
        inner.result = None;

        Ok(handle)
    }

    pub async fn update_progress(&self, job_id: &str, progress: JobProgress) {
        let mut inner = self.inner.write().await;
        if let Some(snapshot) = inner.snapshot.as_mut().filter(|s| s.job_id == job_id) {
            snapshot.update_progress(progress);
        }
    }

    /// Records the terminal outcome and frees the running slot.
    pub async fn finish(&self, job_id: &str, outcome: Result<AssembledTranslation>) {
        let mut inner = self.inner.write().await;

        if inner.active.as_ref().map(|a| a.job_id.as_str()) != Some(job_id) {
            tracing::warn!(job_id, "Ignoring outcome for a job that is not active");
            return;
        }
        inner.active = None;

        let (status, translation, error) = match outcome {
            Ok(translation) => (JobStatus::Completed, Some(translation), None),
            Err(TranslatorError::Cancelled) => (JobStatus::Cancelled, None, None),
            Err(e) => (JobStatus::Failed, None, Some(e.to_string())),
        };

        if let Some(snapshot) = inner.snapshot.as_mut() {
            snapshot.status = status;
            snapshot.estimated_time_remaining = None;
            snapshot.message = error.clone();
        }

        inner.result = Some(JobResult {
            job_id: job_id.to_string(),
            status,
            translation,
            error,
        });
    }

    /// Signals the running job to stop; returns its id.
    pub async fn cancel(&self) -> Result<String> {
        let inner = self.inner.read().await;
        match &inner.active {
            Some(active) => {
                active.cancel.cancel();
                tracing::info!(job_id = %active.job_id, "Cancellation requested");
                Ok(active.job_id.clone())
            }
            None => Err(TranslatorError::JobNotFound),
        }
    }

    pub async fn is_running(&self) -> bool {
        self.inner.read().await.active.is_some()
    }

    pub async fn snapshot(&self) -> Option<JobSnapshot> {
        self.inner.read().await.snapshot.clone()
    }

    pub async fn result(&self) -> Option<JobResult> {
        self.inner.read().await.result.clone()
    }
}

fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
