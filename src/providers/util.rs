use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::core::config::RetryConfig;

/// Fixed-delay retry schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Values below 1 act as 1.
    pub attempts: usize,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            attempts: config.attempts,
            delay: Duration::from_millis(config.delay_ms),
        }
    }
}

/// The last error seen by [`with_retry`] and how many attempts were made.
#[derive(Debug)]
pub struct RetryError<E> {
    pub attempts: usize,
    pub error: E,
}

/// Retries an async operation while `is_transient` classifies its error as
/// retryable.
///
/// # Parameters
/// - `operation`: Closure returning a future
/// - `policy`: Total attempts and the fixed delay between them
/// - `is_transient`: Decides whether an error is worth another attempt
///
/// # Returns
/// Either the successful result or the error that ended the attempts
pub async fn with_retry<F, Fut, T, E, C>(
    mut operation: F,
    policy: &RetryPolicy,
    is_transient: C,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    C: Fn(&E) -> bool,
{
    let max_attempts = policy.attempts.max(1);
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(val) => return Ok(val),
            Err(err) => {
                if !is_transient(&err) {
                    debug!("Attempt {}/{} failed permanently: {}", attempt, max_attempts, err);
                    return Err(RetryError {
                        attempts: attempt,
                        error: err,
                    });
                }
                if attempt >= max_attempts {
                    warn!("Giving up after {} attempts: {}", attempt, err);
                    return Err(RetryError {
                        attempts: attempt,
                        error: err,
                    });
                }
                debug!(
                    "Attempt {}/{} failed: {}. Retrying in {:?}...",
                    attempt, max_attempts, err, policy.delay
                );
                attempt += 1;
                tokio::time::sleep(policy.delay).await;
            }
        }
    }
}

/// Network-level failures worth retrying: timeouts, refused or dropped
/// connections and interrupted transfers. HTTP status errors are final.
pub fn is_transient(err: &reqwest::Error) -> bool {
    if err.is_status() || err.is_builder() || err.is_decode() {
        return false;
    }
    err.is_timeout() || err.is_connect() || err.is_request() || err.is_body()
}
