use crate::utils::{Result, RetryConfig, TranslatorError};
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Bounded exponential backoff around a single fallible attempt.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: usize,
    base_delay: Duration,
    jitter_min: f64,
    jitter_max: f64,
}

#[derive(Debug, Clone)]
pub struct RetryOutcome<T> {
    pub value: T,
    pub retries: usize,
    pub delays: Vec<Duration>,
}

impl RetryPolicy {
    pub fn new(max_retries: usize, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            jitter_min: 0.85,
            jitter_max: 1.15,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_retries, config.base_delay())
            .with_jitter(config.jitter_min, config.jitter_max)
    }

    /// Jitter factors must be finite and positive; a bad lower bound falls
    /// back to `1.0` and a bad upper bound collapses onto the lower one.
    pub fn with_jitter(mut self, min: f64, max: f64) -> Self {
        let min = if min.is_finite() && min > 0.0 { min } else { 1.0 };
        let max = if max.is_finite() { max.max(min) } else { min };
        self.jitter_min = min;
        self.jitter_max = max;
        self
    }

    pub fn max_retries(&self) -> usize {
        self.max_retries
    }

    /// `2^attempt * base_delay * jitter`, jitter drawn from the configured range.
    pub fn backoff_delay(&self, attempt: usize) -> Duration {
        let jitter = if self.jitter_min < self.jitter_max {
            rand::thread_rng().gen_range(self.jitter_min..=self.jitter_max)
        } else {
            self.jitter_min
        };
        let factor = 2u32.saturating_pow(attempt as u32) as f64 * jitter;
        self.base_delay.mul_f64(factor)
    }

    /// Runs `attempt_fn` until it succeeds, the budget of `max_retries`
    /// retries is spent, or a non-retryable failure occurs.
    ///
    /// Authentication and cancellation failures return immediately. Exhausting
    /// the budget yields `RetriesExhaustedError` for `chunk_index`.
    pub async fn run<T, F, Fut>(
        &self,
        chunk_index: usize,
        cancel: &CancellationToken,
        mut attempt_fn: F,
    ) -> Result<RetryOutcome<T>>
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut delays = Vec::new();
        let mut attempt = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(TranslatorError::Cancelled);
            }

            let error = match attempt_fn(attempt).await {
                Ok(value) => {
                    return Ok(RetryOutcome {
                        value,
                        retries: attempt,
                        delays,
                    })
                }
                Err(e) => e,
            };

            if !error.is_retryable() {
                return Err(error);
            }

            if attempt >= self.max_retries {
                return Err(TranslatorError::RetriesExhaustedError {
                    chunk_index,
                    attempts: attempt + 1,
                    last_error: error.to_string(),
                });
            }

            let delay = self.backoff_delay(attempt);
            warn!(
                chunk_index,
                attempt = attempt + 1,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Chunk translation failed, retrying"
            );

            tokio::select! {
                _ = cancel.cancelled() => return Err(TranslatorError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }

            delays.push(delay);
            attempt += 1;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn transport() -> TranslatorError {
        TranslatorError::TransportError("connection reset".into())
    }

    #[test]
    fn backoff_doubles_within_jitter_bounds() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1000));
        for attempt in 0..4 {
            let nominal = 1000.0 * 2f64.powi(attempt as i32);
            let delay = policy.backoff_delay(attempt).as_secs_f64() * 1000.0;
            assert!(delay >= nominal * 0.85 - 1e-6, "attempt {attempt}: {delay}");
            assert!(delay <= nominal * 1.15 + 1e-6, "attempt {attempt}: {delay}");
        }
    }

    #[test]
    fn fixed_jitter_is_exact() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100)).with_jitter(1.0, 1.0);
        let delay = policy.backoff_delay(2);
        assert!((delay.as_secs_f64() - 0.4).abs() < 1e-9);
    }

    #[test]
    fn invalid_jitter_bounds_fall_back_to_no_jitter() {
        let base = Duration::from_millis(100);
        for (min, max) in [(-0.5, 1.15), (f64::NAN, 1.15), (0.0, f64::NAN), (1.0, f64::INFINITY)] {
            let policy = RetryPolicy::new(3, base).with_jitter(min, max);
            let delay = policy.backoff_delay(1).as_secs_f64();
            assert!(delay.is_finite() && delay > 0.0, "({min}, {max}) gave {delay}");
            assert!(delay <= 0.2 * 1.15 + 1e-9, "({min}, {max}) gave {delay}");
        }

        let config = RetryConfig {
            jitter_min: -1.0,
            jitter_max: -2.0,
            ..RetryConfig::default()
        };
        let delay = RetryPolicy::from_config(&config).backoff_delay(0);
        assert_eq!(delay, Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_third_attempt_after_two_retries() {
        let policy = RetryPolicy::default();
        let calls = AtomicUsize::new(0);
        let calls = &calls;
        let cancel = CancellationToken::new();

        let outcome = policy
            .run(0, &cancel, move |_| async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(transport())
                } else {
                    Ok("done")
                }
            })
            .await
            .unwrap();

        assert_eq!(outcome.value, "done");
        assert_eq!(outcome.retries, 2);
        assert!(outcome.delays.len() <= 3);
        assert_eq!(outcome.delays.len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausting_retries_makes_four_attempts() {
        let policy = RetryPolicy::default();
        let calls = AtomicUsize::new(0);
        let calls = &calls;
        let cancel = CancellationToken::new();

        let err = policy
            .run(7, &cancel, move |_| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(TranslatorError::HttpError {
                    status: 502,
                    message: "bad gateway".into(),
                })
            })
            .await
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        match err {
            TranslatorError::RetriesExhaustedError {
                chunk_index,
                attempts,
                last_error,
            } => {
                assert_eq!(chunk_index, 7);
                assert_eq!(attempts, 4);
                assert!(last_error.contains("bad gateway"));
            }
            other => panic!("expected RetriesExhaustedError, got {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn authentication_failure_is_not_retried() {
        let policy = RetryPolicy::default();
        let calls = AtomicUsize::new(0);
        let calls = &calls;
        let cancel = CancellationToken::new();

        let err = policy
            .run(0, &cancel, move |_| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(TranslatorError::AuthenticationError("expired".into()))
            })
            .await
            .unwrap_err();

        assert!(err.is_fatal());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_during_backoff_stops_retrying() {
        let policy = RetryPolicy::default();
        let calls = AtomicUsize::new(0);
        let cancel = CancellationToken::new();

        let err = policy
            .run(0, &cancel, |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                cancel.cancel();
                async { Err::<(), _>(transport()) }
            })
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
