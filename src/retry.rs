//! Retry logic with exponential backoff
//!
//! Transient failures against the export API are retried by re-invoking the
//! whole submit-then-poll sequence; the poll loop itself never retries a
//! classified error. This module provides the generic backoff machinery and
//! the retryability classification for [`Error`].

use crate::config::RetryConfig;
use crate::error::Error;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Trait for errors that can be classified as retryable or not
///
/// Transient failures (server errors, rate limiting, network timeouts)
/// should return `true`. Permanent failures (validation, authorization,
/// terminal job failure) should return `false`.
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            // Server-side and rate-limit kinds may clear on a fresh attempt
            Error::RemoteJob { kind, .. } => kind.is_retryable(),
            // Network errors are retryable when they are timeouts or
            // connection-level failures
            Error::Transport(e) => e.is_timeout() || e.is_connect(),
            // The server gave up on the job; resubmitting the same request
            // needs operator investigation first
            Error::JobFailed { .. } => false,
            // Caller-side problems never fix themselves
            Error::Validation { .. } => false,
            Error::Config { .. } => false,
            // A malformed envelope means a protocol mismatch, not a blip
            Error::MalformedEnvelope { .. } => false,
            Error::Serialization(_) => false,
            // Cancellation and deadlines are decisions, not failures
            Error::Cancelled => false,
            Error::DeadlineElapsed { .. } => false,
        }
    }
}

/// Execute an async operation with exponential backoff retry logic
///
/// Returns the successful result or the last error after all retry
/// attempts are exhausted. Non-retryable errors are returned immediately.
pub async fn with_retry<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let mut attempt = 0;
    let mut delay = config.initial_delay;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    tracing::info!(attempts = attempt + 1, "operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if e.is_retryable() && attempt < config.max_attempts => {
                attempt += 1;

                tracing::warn!(
                    error = %e,
                    attempt = attempt,
                    max_attempts = config.max_attempts,
                    delay_ms = delay.as_millis(),
                    "operation failed, retrying"
                );

                let jittered_delay = if config.jitter {
                    add_jitter(delay)
                } else {
                    delay
                };

                tokio::time::sleep(jittered_delay).await;

                let next_delay =
                    Duration::from_secs_f64(delay.as_secs_f64() * config.backoff_multiplier);
                delay = next_delay.min(config.max_delay);
            }
            Err(e) => {
                if e.is_retryable() {
                    tracing::error!(
                        error = %e,
                        attempts = attempt + 1,
                        "operation failed after all retry attempts exhausted"
                    );
                } else {
                    tracing::error!(error = %e, "operation failed with non-retryable error");
                }
                return Err(e);
            }
        }
    }
}

/// Add random jitter to a delay to prevent thundering herd
///
/// Jitter is uniformly distributed between 0% and 100% of the delay, so the
/// actual delay falls between `delay` and `2 * delay`.
fn add_jitter(delay: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_factor: f64 = rng.gen_range(0.0..=1.0);
    Duration::from_secs_f64(delay.as_secs_f64() * (1.0 + jitter_factor))
}
