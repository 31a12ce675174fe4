//! Bounded retry with configurable backoff around a single external call.
//!
//! Every network-touching step in the pipeline funnels through
//! [`retry_call`]: the closure performs one attempt, the error's
//! [`is_retryable`](crate::SheetcastError::is_retryable) classification
//! decides whether to back off and try again or abandon immediately.

use std::time::Duration;

use crate::{Result, SheetcastError};

/// Attempt cap applied to every retried call site (sheets fetch/clear and
/// the Instagram media publish).
pub const MAX_ATTEMPTS: usize = 5;

/// Backoff policy controlling the delay between retry attempts.
#[derive(Debug, Clone)]
pub enum BackoffPolicy {
    /// Fixed delay between retries.
    Fixed(Duration),
    /// Exponential backoff: base * 2^attempt, capped at max.
    Exponential { base: Duration, max: Duration },
    /// No delay between retries.
    None,
}

impl BackoffPolicy {
    /// Compute the delay for a given attempt number (0-indexed).
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        match self {
            BackoffPolicy::Fixed(d) => *d,
            BackoffPolicy::Exponential { base, max } => {
                let millis = base.as_millis() as u64 * 2u64.saturating_pow(attempt as u32);
                Duration::from_millis(millis).min(*max)
            }
            BackoffPolicy::None => Duration::ZERO,
        }
    }
}

impl Default for BackoffPolicy {
    /// One second doubling per attempt, so attempts 0..=4 wait
    /// 1s, 2s, 4s, 8s, 16s.
    fn default() -> Self {
        BackoffPolicy::Exponential {
            base: Duration::from_secs(1),
            max: Duration::from_secs(16),
        }
    }
}

/// Execute `f` up to `max_attempts` times.
///
/// - `Ok` is returned immediately, no further attempts are made.
/// - A retryable error sleeps for `policy.delay_for_attempt(attempt)` and
///   tries again; a retryable error on the final attempt surfaces as
///   [`SheetcastError::RetriesExhausted`].
/// - A non-retryable error is returned immediately.
pub async fn retry_call<T, F, Fut>(
    operation: &str,
    max_attempts: usize,
    policy: &BackoffPolicy,
    f: F,
) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    for attempt in 0..max_attempts {
        match f().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() => {
                if attempt + 1 == max_attempts {
                    tracing::warn!(operation, attempts = max_attempts, error = %e, "Giving up");
                    return Err(SheetcastError::RetriesExhausted {
                        operation: operation.to_string(),
                        attempts: max_attempts,
                    });
                }
                let delay = policy.delay_for_attempt(attempt);
                tracing::warn!(
                    operation,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Retryable error, backing off"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
    // max_attempts == 0; treat as immediately exhausted.
    Err(SheetcastError::RetriesExhausted {
        operation: operation.to_string(),
        attempts: max_attempts,
    })
}
