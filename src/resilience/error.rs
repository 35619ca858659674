//! Failure taxonomy surfaced by the resilient client.

use std::time::Duration;
use thiserror::Error;

/// Terminal outcome of a failed client call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Network unreachable, connection refused or reset, unreadable body.
    #[error("connection failed: {0}")]
    Connection(String),

    /// An attempt exceeded its connect or request timeout.
    #[error("timed out after {}ms", .after.as_millis())]
    Timeout { after: Duration },

    /// The service answered with a non-2xx status.
    #[error("HTTP status {code}")]
    HttpStatus { code: u16 },

    /// The circuit is open; no attempt was made.
    #[error("circuit open for '{service}'")]
    CircuitOpen { service: String },

    /// The request could not be built (bad path or URL).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ClientError {
    /// True when the failure came from the breaker rather than the network.
    /// Callers must not retry these at a higher layer either.
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, ClientError::CircuitOpen { .. })
    }

    /// Whether another attempt may change the outcome.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClientError::Connection(_) | ClientError::Timeout { .. } | ClientError::HttpStatus { .. }
        )
    }

    /// Whether the failure counts against the circuit breaker.
    pub fn trips_breaker(&self) -> bool {
        self.is_retryable()
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientError::Connection(_) => "connection",
            ClientError::Timeout { .. } => "timeout",
            ClientError::HttpStatus { .. } => "http_status",
            ClientError::CircuitOpen { .. } => "circuit_open",
            ClientError::InvalidRequest(_) => "invalid_request",
        }
    }

    /// Classify a transport error; `timeout` is the limit that applied.
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            ClientError::Timeout { after: timeout }
        } else if let Some(status) = err.status() {
            ClientError::HttpStatus { code: status.as_u16() }
        } else if err.is_builder() {
            ClientError::InvalidRequest(err.to_string())
        } else {
            ClientError::Connection(err.to_string())
        }
    }
}

/// Result type for client calls.
pub type ClientResult<T> = Result<T, ClientError>;
