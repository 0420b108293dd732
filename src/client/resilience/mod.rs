//! Retry policy for upstream requests.
//!
//! Each attempt ends in a typed [`AttemptOutcome`]: success, a terminal
//! failure, or a retryable failure with the wait before the next attempt.
//! The wait comes from the server's `Retry-After` hint when present,
//! otherwise from [`ExponentialBackoff`].

mod backoff;

pub use backoff::ExponentialBackoff;

use std::future::Future;
use std::time::Duration;

use crate::{Error, Result};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_BACKOFF_MIN: Duration = Duration::from_millis(500);
pub const DEFAULT_BACKOFF_MAX: Duration = Duration::from_secs(5);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub backoff_min: Duration,
    pub backoff_max: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_min: DEFAULT_BACKOFF_MIN,
            backoff_max: DEFAULT_BACKOFF_MAX,
        }
    }
}

impl RetryConfig {
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait this long, then attempt again.
    Retry(Duration),
    /// Surface the error to the caller unchanged.
    GiveUp,
}

/// Result of a single attempt.
#[derive(Debug)]
pub enum AttemptOutcome<T> {
    Success(T),
    Terminal(Error),
    Retryable { error: Error, wait: Duration },
}

#[derive(Clone, Debug)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: ExponentialBackoff,
}

impl RetryPolicy {
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            backoff: ExponentialBackoff::new(config.backoff_min, config.backoff_max),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn backoff(&self) -> &ExponentialBackoff {
        &self.backoff
    }

    /// Decide what follows the failure of attempt number `attempt` (1-based).
    pub fn decide(&self, error: &Error, attempt: u32) -> RetryDecision {
        if !error.is_retryable() || attempt >= self.max_attempts {
            return RetryDecision::GiveUp;
        }
        let wait = error
            .retry_after()
            .unwrap_or_else(|| self.backoff.delay_for(attempt));
        RetryDecision::Retry(wait)
    }

    pub fn classify<T>(&self, result: Result<T>, attempt: u32) -> AttemptOutcome<T> {
        match result {
            Ok(value) => AttemptOutcome::Success(value),
            Err(error) => match self.decide(&error, attempt) {
                RetryDecision::GiveUp => AttemptOutcome::Terminal(error),
                RetryDecision::Retry(wait) => AttemptOutcome::Retryable { error, wait },
            },
        }
    }

    /// Run `operation` until it succeeds, fails terminally, or attempts run out.
    ///
    /// The operation receives the 1-based attempt number. Waits are sequential
    /// sleeps of the calling task.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match self.classify(operation(attempt).await, attempt) {
                AttemptOutcome::Success(value) => return Ok(value),
                AttemptOutcome::Terminal(error) => return Err(error),
                AttemptOutcome::Retryable { error, wait } => {
                    tracing::warn!(
                        error = %error,
                        attempt,
                        max_attempts = self.max_attempts,
                        wait_ms = wait.as_millis() as u64,
                        "Retryable failure, waiting before next attempt"
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(&RetryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(&RetryConfig {
            max_attempts,
            backoff_min: Duration::from_millis(1),
            backoff_max: Duration::from_millis(2),
        })
    }

    fn server_error() -> Error {
        Error::Server {
            status: 503,
            message: "unavailable".into(),
            retry_after: None,
        }
    }

    #[test]
    fn test_default_config() {
        let config = RetryConfig::default();
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.backoff_min, Duration::from_millis(500));
        assert_eq!(config.backoff_max, Duration::from_secs(5));
        assert_eq!(RetryConfig::no_retry().max_attempts, 1);
    }

    #[test]
    fn test_retry_after_is_used_exactly() {
        let policy = RetryPolicy::default();
        let error = Error::RateLimit {
            retry_after: Some(Duration::from_secs(2)),
        };
        assert_eq!(
            policy.decide(&error, 1),
            RetryDecision::Retry(Duration::from_secs(2))
        );

        let hinted = Error::Server {
            status: 503,
            message: String::new(),
            retry_after: Some(Duration::from_millis(1500)),
        };
        assert_eq!(
            policy.decide(&hinted, 3),
            RetryDecision::Retry(Duration::from_millis(1500))
        );
    }

    #[test]
    fn test_backoff_without_hint_is_bounded() {
        let policy = RetryPolicy::default();
        for attempt in 1..5 {
            match policy.decide(&server_error(), attempt) {
                RetryDecision::Retry(wait) => {
                    assert!(wait >= Duration::from_millis(500));
                    assert!(wait <= Duration::from_secs(5));
                }
                RetryDecision::GiveUp => panic!("attempt {} should retry", attempt),
            }
        }
    }

    #[test]
    fn test_gives_up_on_last_attempt() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.decide(&server_error(), 5), RetryDecision::GiveUp);
    }

    #[test]
    fn test_non_retryable_errors_give_up_immediately() {
        let policy = RetryPolicy::default();
        for error in [
            Error::auth("denied"),
            Error::not_found("gone"),
            Error::Request {
                status: 400,
                message: String::new(),
            },
            Error::Protocol("html".into()),
        ] {
            assert_eq!(policy.decide(&error, 1), RetryDecision::GiveUp);
        }
    }

    #[tokio::test]
    async fn test_run_retries_until_success() {
        let calls = AtomicU32::new(0);
        let result = fast_policy(5)
            .run(|attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 3 {
                        Err(server_error())
                    } else {
                        Ok(attempt)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_run_surfaces_last_error_after_exhaustion() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = fast_policy(5)
            .run(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(server_error()) }
            })
            .await;

        assert!(matches!(result, Err(Error::Server { status: 503, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_run_does_not_retry_terminal_errors() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = fast_policy(5)
            .run(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(Error::auth("denied")) }
            })
            .await;

        assert!(matches!(result, Err(Error::Auth { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
