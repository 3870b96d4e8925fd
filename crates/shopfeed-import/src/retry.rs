//! Exponential backoff retry for fallible import operations.
//!
//! Transient errors (network failures, 5xx, rate limits, failed proxy
//! probes) are retried with a capped exponential delay. Final errors
//! (validation, login redirects, extraction failures) are returned
//! immediately, and the last error of an exhausted retry loop is returned
//! unchanged — callers can match on the concrete variant.

use std::future::Future;
use std::time::Duration;

use crate::error::ImportError;

/// Backoff schedule for [`retry_with_backoff`].
///
/// `retries` is the total number of attempts. The delay before retrying
/// 0-indexed attempt `i` is `min(base_delay_ms * 2^i, max_delay_ms)`, with
/// no jitter.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            base_delay_ms: 1_000,
            max_delay_ms: 10_000,
        }
    }
}

impl RetryPolicy {
    /// A policy that never sleeps, for tests.
    #[must_use]
    pub fn immediate(retries: u32) -> Self {
        Self {
            retries,
            base_delay_ms: 0,
            max_delay_ms: 0,
        }
    }

    /// Delay before the retry that follows 0-indexed attempt `attempt`.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let doubled = self.base_delay_ms.saturating_mul(1u64 << attempt.min(62));
        Duration::from_millis(doubled.min(self.max_delay_ms))
    }
}

/// Executes `operation` up to `policy.retries` times, sleeping between
/// attempts per the backoff schedule.
///
/// Non-retriable errors short-circuit without sleeping. When all attempts
/// fail, the error from the final attempt is returned as-is.
///
/// # Errors
///
/// Returns the last [`ImportError`] produced by `operation`.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: RetryPolicy,
    mut operation: F,
) -> Result<T, ImportError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ImportError>>,
{
    let attempts = policy.retries.max(1);
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !err.is_retriable() || attempt + 1 >= attempts {
                    return Err(err);
                }
                let delay = policy.delay_for_attempt(attempt);
                tracing::warn!(
                    attempt,
                    attempts,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "transient import error — retrying after backoff"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
