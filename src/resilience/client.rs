//! Resilient HTTP client for a single service endpoint.
//!
//! # Responsibilities
//! - Build request URLs against one base URL
//! - Gate every logical call through the circuit breaker
//! - Retry attempts with backoff; only the terminal outcome reaches the breaker
//! - Apply connect/request timeouts per attempt

use reqwest::Method;
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use url::Url;

use crate::config::{ClientConfig, ConfigError};
use crate::observability::metrics;
use crate::resilience::circuit_breaker::{BreakerSettings, CircuitBreaker, CircuitSnapshot, CircuitState};
use crate::resilience::error::{ClientError, ClientResult};
use crate::resilience::retries::RetryPolicy;
use crate::resilience::timeouts::TimeoutPolicy;

const USER_AGENT: &str = concat!("health-sentinel/", env!("CARGO_PKG_VERSION"));

/// Description of one outbound call.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceRequest {
    pub method: Method,
    /// Path relative to the client's base URL, starting with '/'.
    pub path: String,
    pub body: Option<serde_json::Value>,
    /// Overrides the client's request timeout for each attempt.
    pub timeout: Option<Duration>,
}

impl ServiceRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            timeout: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self::new(Method::POST, path).with_body(body)
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A 2xx response from the final attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceResponse {
    pub status: u16,
    pub body: String,
    /// Time taken by the attempt that succeeded.
    pub latency: Duration,
}

impl ServiceResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// HTTP client with retry/backoff and a circuit breaker.
#[derive(Debug)]
pub struct ResilientClient {
    name: String,
    base_url: Url,
    http: reqwest::Client,
    breaker: CircuitBreaker,
    retry: RetryPolicy,
    timeouts: TimeoutPolicy,
}

impl ResilientClient {
    /// Create a client for `base_url` with the given policy.
    pub fn new(name: impl Into<String>, base_url: Url, config: &ClientConfig) -> Result<Self, ConfigError> {
        let timeouts = TimeoutPolicy::from_config(config);
        let http = timeouts
            .apply(reqwest::Client::builder())
            .user_agent(USER_AGENT)
            .no_proxy()
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        let name = name.into();
        Ok(Self {
            breaker: CircuitBreaker::new(name.clone(), BreakerSettings::from_config(config)),
            name,
            base_url,
            http,
            retry: RetryPolicy::from_config(config),
            timeouts,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.breaker.state()
    }

    pub fn circuit(&self) -> CircuitSnapshot {
        self.breaker.snapshot()
    }

    /// Execute one logical call.
    ///
    /// Fails fast with `CircuitOpen` when the breaker refuses the call. Retries
    /// are invisible to the breaker; it only sees the terminal outcome.
    pub async fn execute(&self, request: &ServiceRequest) -> ClientResult<ServiceResponse> {
        let url = self.url_for(&request.path)?;
        let permit = self.breaker.try_acquire()?;

        let attempts = self.retry.attempts_for(&request.method);
        let url = &url;
        let result = self
            .retry
            .run(&self.name, attempts, |attempt| self.send_once(url, request, attempt))
            .await;

        match &result {
            Ok(_) => permit.succeed(),
            Err(e) if e.trips_breaker() => {
                metrics::record_client_failure(&self.name, e.kind());
                permit.fail();
            }
            Err(_) => permit.release(),
        }
        result
    }

    /// GET `path`.
    pub async fn get(&self, path: &str) -> ClientResult<ServiceResponse> {
        self.execute(&ServiceRequest::get(path)).await
    }

    fn url_for(&self, path: &str) -> ClientResult<Url> {
        if !path.starts_with('/') {
            return Err(ClientError::InvalidRequest(format!(
                "path '{}' must start with '/'",
                path
            )));
        }
        self.base_url
            .join(path)
            .map_err(|e| ClientError::InvalidRequest(format!("cannot join '{}': {}", path, e)))
    }

    async fn send_once(&self, url: &Url, request: &ServiceRequest, attempt: u32) -> ClientResult<ServiceResponse> {
        let timeout = request.timeout.unwrap_or(self.timeouts.request);
        let started = Instant::now();

        let mut builder = self
            .http
            .request(request.method.clone(), url.clone())
            .timeout(timeout);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(service = %self.name, attempt = attempt, status = %status, "Non-success status");
            return Err(ClientError::HttpStatus {
                code: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ClientError::from_reqwest(e, timeout))?;

        Ok(ServiceResponse {
            status: status.as_u16(),
            body,
            latency: started.elapsed(),
        })
    }
}
