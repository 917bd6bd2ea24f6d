//! Bounded exponential backoff for remote calls

use crate::config::RetryConfig;
use crate::remote::RemoteError;
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
            multiplier: 2,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            multiplier: config.multiplier.max(1),
        }
    }
}

impl RetryPolicy {
    /// Single attempt
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay after the given failed attempt (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff.saturating_mul(factor)
    }

    /// Run `call` until it succeeds, fails with a non-retryable error, or the
    /// attempts are used up
    pub async fn run<T, F, Fut>(&self, operation: &'static str, mut call: F) -> Result<T, RemoteError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RemoteError>>,
    {
        let mut attempt = 1;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_attempts => {
                    let delay = self.backoff(attempt);
                    tracing::warn!(
                        operation,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Remote call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_backoff_grows() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_secs(1));
        assert_eq!(policy.backoff(2), Duration::from_secs(2));
        assert_eq!(policy.backoff(3), Duration::from_secs(4));
    }

    #[test]
    fn test_from_config() {
        let config = RetryConfig {
            max_attempts: 0,
            initial_backoff_ms: 250,
            multiplier: 3,
        };
        let policy = RetryPolicy::from(&config);
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.backoff(2), Duration::from_millis(750));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_are_retried() {
        let calls = &AtomicU32::new(0);
        let started = tokio::time::Instant::now();

        let result = RetryPolicy::default()
            .run("fetch", move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(RemoteError::Network("timeout".into()))
                } else {
                    Ok(42)
                }
            })
            .await;

        assert_eq!(result, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts() {
        let calls = &AtomicU32::new(0);

        let result: Result<(), _> = RetryPolicy::default()
            .run("persist", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(RemoteError::Server {
                    status: 502,
                    message: "bad gateway".into(),
                })
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auth_errors_are_not_retried() {
        let calls = &AtomicU32::new(0);

        let result: Result<(), _> = RetryPolicy::default()
            .run("check_version", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(RemoteError::Unauthorized("expired".into()))
            })
            .await;

        assert_eq!(result, Err(RemoteError::Unauthorized("expired".into())));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
