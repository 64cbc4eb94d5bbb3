//! Bounded retry of transient network failures.
//!
//! Retry is applied as an explicit combinator wrapped around each logical
//! request, parameterized by a [`RetryPolicy`]. Only failures classified as
//! transient by [`ClientError::is_transient`] are retried; HTTP status errors
//! and envelope-level failures surface immediately.

use std::future::Future;
use std::time::Duration;

use log::warn;

use super::error::ClientError;

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_MIN_DELAY: Duration = Duration::from_secs(2);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(10);

/// Bounds and backoff schedule for retrying transient network failures.
///
/// The default policy makes 3 attempts total (1 initial + 2 retries) with
/// exponential backoff starting at 2 seconds, doubling per attempt and
/// capped at 10 seconds.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total number of attempts, including the initial one.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each subsequent retry.
    pub min_delay: Duration,
    /// Upper bound on the backoff delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            min_delay: DEFAULT_MIN_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Default backoff schedule with a custom attempt bound.
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        // attempt is 1-based; shift capped to keep the multiplication sane.
        let factor = 1u32 << (attempt.saturating_sub(1)).min(16);
        self.min_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Runs `op` up to `policy.max_attempts` times, sleeping between attempts.
///
/// Retries only transient transport failures. The last error is returned
/// unchanged once attempts are exhausted; non-transient errors are returned
/// on first occurrence. Every retry is logged with the attempt number and
/// the triggering error.
pub(crate) async fn retry_transient<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut op: F,
) -> Result<T, ClientError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < max_attempts => {
                warn!(
                    operation = operation,
                    attempt = attempt,
                    error:% = err;
                    "Transient network error, retrying"
                );
                tokio::time::sleep(policy.delay_for(attempt)).await;
                attempt += 1;
            },
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    /// Produces a real transport-level connect error by dialing a port
    /// nothing listens on.
    async fn connect_error() -> ClientError {
        let client = reqwest::Client::new();
        let err = client
            .get("http://127.0.0.1:9/unreachable")
            .send()
            .await
            .expect_err("port 9 should refuse connections");
        ClientError::Transport(err)
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            min_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(20),
        }
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for(3), Duration::from_secs(8));
        assert_eq!(policy.delay_for(4), Duration::from_secs(10));
        assert_eq!(policy.delay_for(9), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn transient_errors_exhaust_the_attempt_bound() {
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let result: Result<(), _> = retry_transient(&fast_policy(), "test", || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(connect_error().await)
        })
        .await;

        let err = result.unwrap_err();
        assert!(err.is_transient(), "the last transient error must surface unchanged");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_transient_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let result: Result<(), _> = retry_transient(&fast_policy(), "test", || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ClientError::Rejected {
                message: "bad filter".to_string(),
            })
        })
        .await;

        assert!(matches!(result, Err(ClientError::Rejected { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn success_after_transient_failure_is_returned() {
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let result = retry_transient(&fast_policy(), "test", || async move {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(connect_error().await)
            } else {
                Ok(42u32)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
