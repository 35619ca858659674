//! Retry logic.
//!
//! # Responsibilities
//! - Determine if a request may be retried (idempotent methods only)
//! - Execute attempts with exponential backoff between them
//! - Hand only the terminal outcome back to the caller (and the breaker)
//!
//! # Design Decisions
//! - Never retry POST/PATCH (non-idempotent)
//! - Connection errors, timeouts and non-2xx are retryable
//! - Circuit-open and invalid-request errors are never retried

use reqwest::Method;
use std::future::Future;

use crate::config::ClientConfig;
use crate::observability::metrics;
use crate::resilience::backoff::BackoffPolicy;
use crate::resilience::error::ClientError;

/// Whether the method may be sent more than once.
pub fn is_retryable_method(method: &Method) -> bool {
    method.is_idempotent()
}

/// Attempt budget and backoff for one client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per logical call, including the first.
    pub max_attempts: u32,
    pub backoff: BackoffPolicy,
}

impl RetryPolicy {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            max_attempts: config.max_retries.max(1),
            backoff: BackoffPolicy::from_config(config),
        }
    }

    /// Attempts allowed for a request with the given method.
    pub fn attempts_for(&self, method: &Method) -> u32 {
        if is_retryable_method(method) {
            self.max_attempts
        } else {
            1
        }
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or
    /// `attempts` is exhausted. `op` receives the 1-based attempt number.
    pub async fn run<T, F, Fut>(&self, service: &str, attempts: u32, mut op: F) -> Result<T, ClientError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        let attempts = attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < attempts && e.is_retryable() => {
                    let delay = self.backoff.delay(attempt);
                    tracing::info!(
                        service = %service,
                        attempt = attempt,
                        delay = ?delay,
                        error = %e,
                        "Retrying request"
                    );
                    metrics::record_retry(service);
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    if attempt > 1 {
                        tracing::debug!(service = %service, attempts = attempt, error = %e, "Retries exhausted");
                    }
                    return Err(e);
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ClientConfig::default())
    }
}
