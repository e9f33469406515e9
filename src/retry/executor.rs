//! Bounded retry for operations that may be throttled by the server.

use super::classify::{Classification, Classify};
use crate::config::duration_ms;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry bounds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    /// Default: 3
    pub max_attempts: u32,

    /// Wait used when the server gives no usable hint.
    /// Default: 1s
    #[serde(with = "duration_ms")]
    pub default_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            default_wait: Duration::from_secs(1),
        }
    }
}

/// Why a retried operation gave up.
#[derive(Debug, PartialEq, Eq)]
pub enum RetryError<E> {
    /// A failure that is not throttling, exactly as the operation returned it.
    Failed(E),
    /// Still rate limited on the last attempt.
    Exhausted { attempts: u32, last: E },
}

impl<E> RetryError<E> {
    /// The underlying operation error.
    pub fn into_inner(self) -> E {
        match self {
            RetryError::Failed(e) => e,
            RetryError::Exhausted { last, .. } => last,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, RetryError::Exhausted { .. })
    }
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryError::Failed(e) => fmt::Display::fmt(e, f),
            RetryError::Exhausted { attempts, .. } => {
                write!(f, "operation failed after {} retries", attempts)
            }
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for RetryError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RetryError::Failed(e) => e.source(),
            RetryError::Exhausted { last, .. } => Some(last),
        }
    }
}

/// Runs an operation, retrying while the server reports rate limiting.
///
/// The executor keeps no state between calls; the only suspension is the
/// sleep between attempts.
#[derive(Clone, Debug, Default)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `operation` until it succeeds, fails with a non-throttling error,
    /// or runs out of attempts.
    ///
    /// `label` and `key` only feed the log events.
    pub async fn run<T, E, F, Fut>(
        &self,
        label: &str,
        key: &str,
        mut operation: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify + fmt::Display,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            let retry_after = match err.classify() {
                Classification::Terminal => {
                    debug!(operation = label, key, attempt, error = %err, "operation failed");
                    return Err(RetryError::Failed(err));
                }
                Classification::RateLimited { retry_after } => retry_after,
            };

            if attempt >= max_attempts {
                warn!(
                    operation = label,
                    key,
                    attempts = max_attempts,
                    error = %err,
                    "rate limited, giving up"
                );
                return Err(RetryError::Exhausted {
                    attempts: max_attempts,
                    last: err,
                });
            }

            let wait = retry_after.unwrap_or(self.policy.default_wait);
            warn!(
                operation = label,
                key,
                attempt,
                max_attempts,
                wait_ms = wait.as_millis() as u64,
                "rate limited, retrying"
            );
            tokio::time::sleep(wait).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::RemoteError;
    use tokio::time::Instant;

    fn executor() -> RetryExecutor {
        RetryExecutor::default()
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_success() {
        let mut calls = 0;
        let start = Instant::now();

        let result: Result<u32, RetryError<String>> = executor()
            .run("get", "k", || {
                calls += 1;
                async { Ok(7) }
            })
            .await;

        assert_eq!(result, Ok(7));
        assert_eq!(calls, 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_bound_and_waits() {
        let mut calls = 0;
        let start = Instant::now();

        let result: Result<(), _> = executor()
            .run("delete", "k", || {
                calls += 1;
                async { Err("rate limited. Try again in 2 seconds".to_string()) }
            })
            .await;

        assert_eq!(calls, 3);
        let err = result.unwrap_err();
        assert!(err.is_exhausted());
        assert_eq!(err.to_string(), "operation failed after 3 retries");
        assert_eq!(err.into_inner(), "rate limited. Try again in 2 seconds");

        // Two waits, none after the final attempt.
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(4));
        assert!(elapsed < Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_short_circuit() {
        let mut calls = 0;

        let result: Result<(), _> = executor()
            .run("delete", "k", || {
                calls += 1;
                async { Err(RemoteError::other("permission denied")) }
            })
            .await;

        assert_eq!(calls, 1);
        assert_eq!(
            result,
            Err(RetryError::Failed(RemoteError::other("permission denied")))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_wait_fallback() {
        let mut calls = 0;
        let start = Instant::now();

        let result: Result<(), _> = executor()
            .run("delete", "k", || {
                calls += 1;
                let outcome = if calls < 2 {
                    Err("429 Too Many Requests".to_string())
                } else {
                    Ok(())
                };
                async move { outcome }
            })
            .await;

        assert!(result.is_ok());
        assert_eq!(calls, 2);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(1));
        assert!(elapsed < Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_attempts_still_runs_once() {
        let executor = RetryExecutor::new(RetryPolicy {
            max_attempts: 0,
            ..Default::default()
        });
        let mut calls = 0;

        let result: Result<(), _> = executor
            .run("delete", "k", || {
                calls += 1;
                async { Err("rate limited".to_string()) }
            })
            .await;

        assert_eq!(calls, 1);
        assert!(matches!(result, Err(RetryError::Exhausted { attempts: 1, .. })));
    }
}
