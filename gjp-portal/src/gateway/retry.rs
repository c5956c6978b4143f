//! Bounded retry for backend calls
//!
//! A fixed number of attempts with a fixed delay between them. Which errors
//! are worth another attempt is decided by the caller.

use gjp_common::config::RetryConfig;
use std::future::Future;
use std::time::{Duration, Instant};

/// How many times to try and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first; never below 1
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::ZERO,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Policy for ordinary backend calls
    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, Duration::from_millis(config.delay_ms))
    }

    /// Policy for login, which waits between attempts
    pub fn login_from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.login_delay_ms),
        )
    }

    /// Single attempt, no retry
    pub fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or the attempt budget is spent.
    ///
    /// # Arguments
    /// * `operation_name` - Name for logging (e.g. "make_submission")
    /// * `should_retry` - Decides whether an error is worth another attempt
    /// * `operation` - Async closure performing one attempt
    pub async fn run<F, Fut, T, E, P>(
        &self,
        operation_name: &str,
        should_retry: P,
        mut operation: F,
    ) -> RetryOutcome<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
        P: Fn(&E) -> bool,
    {
        let start_time = Instant::now();
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            if attempt > 1 {
                tracing::debug!(operation = operation_name, attempt, "Retrying backend call");
            }

            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!(
                            operation = operation_name,
                            attempt,
                            elapsed_ms = start_time.elapsed().as_millis(),
                            "Backend call succeeded after retry"
                        );
                    }
                    return RetryOutcome::Succeeded {
                        value,
                        attempts: attempt,
                    };
                }
                Err(err) => {
                    if !should_retry(&err) {
                        tracing::debug!(
                            operation = operation_name,
                            attempt,
                            error = %err,
                            "Backend call failed with non-retryable error"
                        );
                        return RetryOutcome::Failed {
                            error: err,
                            attempts: attempt,
                        };
                    }

                    if attempt >= self.max_attempts {
                        tracing::error!(
                            operation = operation_name,
                            attempt,
                            elapsed_ms = start_time.elapsed().as_millis(),
                            error = %err,
                            "Backend call failed: retries exhausted"
                        );
                        return RetryOutcome::Failed {
                            error: err,
                            attempts: attempt,
                        };
                    }

                    tracing::warn!(
                        operation = operation_name,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = self.delay.as_millis(),
                        error = %err,
                        "Backend call failed, will retry"
                    );

                    if !self.delay.is_zero() {
                        tokio::time::sleep(self.delay).await;
                    }
                }
            }
        }
    }
}

/// Result of a retried operation, with the number of attempts made
#[derive(Debug)]
pub enum RetryOutcome<T, E> {
    Succeeded { value: T, attempts: u32 },
    Failed { error: E, attempts: u32 },
}

impl<T, E> RetryOutcome<T, E> {
    pub fn attempts(&self) -> u32 {
        match self {
            RetryOutcome::Succeeded { attempts, .. } | RetryOutcome::Failed { attempts, .. } => {
                *attempts
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RetryOutcome::Succeeded { .. })
    }

    pub fn into_result(self) -> Result<T, E> {
        match self {
            RetryOutcome::Succeeded { value, .. } => Ok(value),
            RetryOutcome::Failed { error, .. } => Err(error),
        }
    }
}
