//! Timeout enforcement.
//!
//! # Responsibilities
//! - Apply connect and per-attempt request timeouts to the HTTP client
//! - Derive a hard deadline for one whole poll (attempts + backoff)
//! - Wrap futures with a deadline, mapping expiry to `ClientError::Timeout`

use std::future::Future;
use std::time::Duration;

use crate::config::ClientConfig;
use crate::resilience::backoff::BackoffPolicy;
use crate::resilience::error::ClientError;

/// Slack added on top of the computed worst case.
const DEADLINE_GRACE: Duration = Duration::from_millis(500);

/// Connect and request timeouts applied to each attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutPolicy {
    pub connect: Duration,
    pub request: Duration,
}

impl TimeoutPolicy {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            connect: config.connect_timeout(),
            request: config.request_timeout(),
        }
    }

    /// Configure a reqwest client builder with these timeouts.
    pub fn apply(&self, builder: reqwest::ClientBuilder) -> reqwest::ClientBuilder {
        builder.connect_timeout(self.connect).timeout(self.request)
    }
}

/// Worst-case duration of one logical call under `config`.
pub fn poll_deadline(config: &ClientConfig) -> Duration {
    let attempts = config.max_retries.max(1);
    let requests = config.request_timeout().saturating_mul(attempts);
    let backoff = BackoffPolicy::from_config(config).worst_case_total(attempts);
    requests + backoff + DEADLINE_GRACE
}

/// Run `fut` with a hard deadline.
pub async fn with_deadline<T, F>(deadline: Duration, fut: F) -> Result<T, ClientError>
where
    F: Future<Output = Result<T, ClientError>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(ClientError::Timeout { after: deadline }),
    }
}
