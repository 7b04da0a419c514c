//! Retry with exponential backoff for upstream API calls
//!
//! Transient failures are retried with exponential backoff and jitter. The
//! control flow is an explicit state machine, so the policy stays independent
//! of any particular concurrency primitive.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (not including the initial attempt)
    pub max_retries: u32,

    /// Initial backoff duration
    pub initial_backoff: Duration,

    /// Maximum backoff duration
    pub max_backoff: Duration,

    /// Backoff multiplier (typically 2.0 for exponential backoff)
    pub multiplier: f64,

    /// Add random jitter to prevent thundering herd
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(60),
            multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Calculate backoff duration for a given attempt
    pub fn backoff_duration(&self, attempt: u32) -> Duration {
        let base = self.initial_backoff.as_secs_f64() * self.multiplier.powi(attempt as i32);
        let capped = base.min(self.max_backoff.as_secs_f64());

        let final_duration = if self.jitter {
            // +/-20% jitter
            let jitter_factor = 0.8 + (rand_jitter() * 0.4);
            capped * jitter_factor
        } else {
            capped
        };

        Duration::from_secs_f64(final_duration)
    }
}

/// Simple pseudo-random jitter (0.0 to 1.0) without external dependency
fn rand_jitter() -> f64 {
    use std::time::SystemTime;
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    (nanos % 1000) as f64 / 1000.0
}

/// Retry classification for errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the operation
    Retry,
    /// Don't retry, the error is permanent
    NoRetry,
}

/// Trait for errors that can indicate whether to retry
pub trait RetryableError {
    /// Determine if this error should be retried
    fn retry_decision(&self) -> RetryDecision;
}

/// States the retry loop moves through
enum RetryState<T, E> {
    /// Run the numbered attempt (0-based)
    Attempting { attempt: u32 },
    /// Wait out the delay, then run the next attempt
    Backoff { next_attempt: u32, delay: Duration },
    /// Terminal: the operation succeeded
    Succeeded { value: T },
    /// Terminal: permanent error, or the retry budget is spent
    Failed { error: E },
}

/// Execute an async operation with retry logic
///
/// # Arguments
/// * `config` - Retry configuration
/// * `operation_name` - Name for logging purposes
/// * `operation` - The async operation to execute
///
/// # Returns
/// The result of the operation, or the last error if all retries failed
pub async fn with_retry<F, Fut, T, E>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: RetryableError + std::fmt::Display,
{
    let mut state = RetryState::Attempting { attempt: 0 };

    loop {
        state = match state {
            RetryState::Attempting { attempt } => match operation().await {
                Ok(value) => RetryState::Succeeded { value },
                Err(error) => match error.retry_decision() {
                    RetryDecision::NoRetry => {
                        debug!(
                            operation = operation_name,
                            attempt = attempt,
                            "Operation failed with non-retryable error: {}",
                            error
                        );
                        RetryState::Failed { error }
                    }
                    RetryDecision::Retry if attempt >= config.max_retries => {
                        warn!(
                            operation = operation_name,
                            attempts = attempt + 1,
                            "Operation failed after {} attempts: {}",
                            attempt + 1,
                            error
                        );
                        RetryState::Failed { error }
                    }
                    RetryDecision::Retry => {
                        let delay = config.backoff_duration(attempt);
                        warn!(
                            operation = operation_name,
                            attempt = attempt + 1,
                            max_attempts = config.max_retries + 1,
                            backoff_secs = delay.as_secs_f64(),
                            "Retrying after error: {}",
                            error
                        );
                        RetryState::Backoff {
                            next_attempt: attempt + 1,
                            delay,
                        }
                    }
                },
            },
            RetryState::Backoff {
                next_attempt,
                delay,
            } => {
                sleep(delay).await;
                RetryState::Attempting {
                    attempt: next_attempt,
                }
            }
            RetryState::Succeeded { value } => return Ok(value),
            RetryState::Failed { error } => return Err(error),
        };
    }
}
