//! Shared fakes for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use longform_translator::translation::{ChunkRequest, ChunkTranslator, TranslationResult};
use longform_translator::utils::{ChunkingConfig, JobConfig, RetryConfig};
use longform_translator::{Result, TranslatorError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

type Script = dyn Fn(&ChunkRequest, usize) -> Result<String> + Send + Sync;

/// Translator whose behaviour per (chunk, attempt) is scripted by a closure.
/// Records every call and the peak number of concurrent calls.
pub struct ScriptedTranslator {
    script: Box<Script>,
    delay: Duration,
    attempts: Mutex<HashMap<usize, usize>>,
    calls: Mutex<Vec<ChunkRequest>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    events: Mutex<Vec<String>>,
}

impl ScriptedTranslator {
    pub fn new<F>(script: F) -> Self
    where
        F: Fn(&ChunkRequest, usize) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            script: Box::new(script),
            delay: Duration::from_millis(5),
            attempts: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
            events: Mutex::new(Vec::new()),
        }
    }

    /// Prefixes every word with `fr:` so word counts are preserved.
    pub fn echo() -> Self {
        Self::new(|request, _| Ok(pseudo_translate(&request.text)))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<ChunkRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn attempts_for(&self, chunk_index: usize) -> usize {
        self.attempts
            .lock()
            .unwrap()
            .get(&chunk_index)
            .copied()
            .unwrap_or(0)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// `start:<i>` / `end:<i>` in the order they happened.
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChunkTranslator for ScriptedTranslator {
    async fn translate(
        &self,
        request: &ChunkRequest,
        cancel: &CancellationToken,
    ) -> Result<TranslationResult> {
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            let entry = attempts.entry(request.chunk_index).or_insert(0);
            *entry += 1;
            *entry
        };
        self.calls.lock().unwrap().push(request.clone());
        self.events
            .lock()
            .unwrap()
            .push(format!("start:{}", request.chunk_index));

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        let outcome = tokio::select! {
            _ = cancel.cancelled() => Err(TranslatorError::Cancelled),
            _ = tokio::time::sleep(self.delay) => (self.script)(request, attempt),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.events
            .lock()
            .unwrap()
            .push(format!("end:{}", request.chunk_index));

        let translated_text = outcome?;
        Ok(TranslationResult {
            chunk_index: request.chunk_index,
            original_length: request.text.split_whitespace().count(),
            translated_length: translated_text.split_whitespace().count(),
            translated_text,
        })
    }
}

pub fn pseudo_translate(text: &str) -> String {
    text.split_whitespace()
        .map(|w| format!("fr:{}", w))
        .collect::<Vec<_>>()
        .join(" ")
}

/// `paragraphs` paragraphs of `words` words each, words tagged `p<i>w<j>`.
pub fn document(paragraphs: usize, words: usize) -> String {
    (0..paragraphs)
        .map(|p| {
            (0..words)
                .map(|w| format!("p{}w{}", p, w))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Small limits so short documents span several chunks: 20-word chunks,
/// 3-word overlap, 4-word context, fast retries.
pub fn small_job_config() -> JobConfig {
    JobConfig {
        target_language: "french".to_string(),
        chunking: ChunkingConfig {
            max_chunk_size: 20,
            overlap_size: 3,
            context_size: 4,
            max_document_words: 50_000,
        },
        retry: RetryConfig {
            max_retries: 3,
            base_delay_ms: 10,
            jitter_min: 0.85,
            jitter_max: 1.15,
        },
        concurrency_limit: 2,
    }
}

pub fn transport_error() -> TranslatorError {
    TranslatorError::TransportError("connection reset by peer".to_string())
}
