//! Retry utilities for transient remote failures.

use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};

use crate::sync::{
    INITIAL_BACKOFF_MS, MAX_BACKOFF_MS, MAX_PAGE_RETRIES, ProgressCallback, SyncProgress,
};

/// Configuration for retry operations.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Minimum delay between retries.
    pub min_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Maximum number of retry attempts.
    pub max_retries: usize,
    /// Whether to add jitter to delays.
    pub with_jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(INITIAL_BACKOFF_MS),
            max_delay: Duration::from_millis(MAX_BACKOFF_MS),
            max_retries: MAX_PAGE_RETRIES as usize,
            with_jitter: true,
        }
    }
}

impl RetryConfig {
    /// Create a new retry configuration with custom values.
    #[must_use]
    pub fn new(min_delay: Duration, max_delay: Duration, max_retries: usize) -> Self {
        Self {
            min_delay,
            max_delay,
            max_retries,
            with_jitter: true,
        }
    }

    /// A configuration that never retries.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO, 0).with_jitter(false)
    }

    /// Set whether to use jitter.
    #[must_use]
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.with_jitter = jitter;
        self
    }

    /// Build an exponential backoff strategy from this configuration.
    #[must_use]
    pub fn into_backoff(self) -> ExponentialBuilder {
        let mut builder = ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_retries);

        if self.with_jitter {
            builder = builder.with_jitter();
        }

        builder
    }
}

/// Fetch one page, retrying errors that `is_transient` accepts.
///
/// Each retry is logged at debug and reported as
/// [`SyncProgress::PageFetchRetry`].
pub async fn retry_page<T, E, F, Fut, IsTransient>(
    operation: F,
    is_transient: IsTransient,
    config: &RetryConfig,
    page: u32,
    on_progress: Option<&ProgressCallback>,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    IsTransient: FnMut(&E) -> bool,
{
    let attempt = AtomicU32::new(0);
    let mut operation = operation;

    let counted = || {
        attempt.fetch_add(1, Ordering::SeqCst);
        operation()
    };

    counted
        .retry(config.clone().into_backoff())
        .notify(|err, dur| {
            let current_attempt = attempt.load(Ordering::SeqCst);
            if let Some(cb) = on_progress {
                cb(SyncProgress::PageFetchRetry {
                    page,
                    retry_after_ms: u64::try_from(dur.as_millis()).unwrap_or(u64::MAX),
                    attempt: current_attempt,
                });
            }
            tracing::debug!(
                page,
                attempt = current_attempt,
                delay_ms = dur.as_millis() as u64,
                error = %err,
                "Retrying starred page fetch"
            );
        })
        .when(is_transient)
        .await
}
