//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the sentinel.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the health sentinel.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SentinelConfig {
    /// Declared services, in registry order.
    pub services: Vec<ServiceConfig>,

    /// Resilient client policy shared by every per-service client.
    pub client: ClientConfig,

    /// Polling loop settings.
    pub monitor: MonitorConfig,

    /// Read-only status API.
    pub status_api: StatusApiConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// A declared service to poll.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Unique service identifier.
    pub id: String,

    /// Human-readable name (defaults to the id).
    #[serde(default)]
    pub display_name: Option<String>,

    /// Base URL (scheme + host), e.g. "http://127.0.0.1".
    pub base_url: String,

    /// Port the health endpoint listens on.
    pub port: u16,

    /// Path of the health endpoint.
    #[serde(default = "default_health_path")]
    pub health_path: String,

    /// Whether this service being down escalates severity.
    #[serde(default)]
    pub critical: bool,

    /// Latency above this budget marks the service degraded.
    #[serde(default = "default_latency_budget_ms")]
    pub latency_budget_ms: u64,
}

fn default_health_path() -> String {
    "/health".to_string()
}

fn default_latency_budget_ms() -> u64 {
    1000
}

/// Circuit breaker, retry and timeout policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Consecutive failed calls before the circuit opens.
    pub failure_threshold: u32,

    /// Seconds an open circuit waits before admitting a probe.
    pub recovery_timeout_secs: u64,

    /// Attempts per logical call (1 = no retry).
    pub max_retries: u32,

    /// Connection establishment timeout per attempt.
    pub connect_timeout_ms: u64,

    /// Total request timeout per attempt.
    pub request_timeout_ms: u64,

    /// First backoff delay; doubles on each further attempt.
    pub backoff_base_ms: u64,

    /// Upper bound for a single backoff delay.
    pub backoff_max_ms: u64,

    /// Random jitter added to each delay, as a percentage (0 disables).
    pub jitter_percent: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout_secs: 30,
            max_retries: 3,
            connect_timeout_ms: 2_000,
            request_timeout_ms: 5_000,
            backoff_base_ms: 1_000,
            backoff_max_ms: 30_000,
            jitter_percent: 0,
        }
    }
}

impl ClientConfig {
    pub fn recovery_timeout(&self) -> Duration {
        Duration::from_secs(self.recovery_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Polling loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Seconds between poll cycles.
    pub interval_secs: u64,

    /// Hard deadline for one service's poll, including retries.
    /// Derived from the client policy when unset.
    pub poll_deadline_ms: Option<u64>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_secs: 15,
            poll_deadline_ms: None,
        }
    }
}

/// Status API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StatusApiConfig {
    /// Serve the latest report over HTTP.
    pub enabled: bool,

    /// Bind address for the status API.
    pub bind_address: String,

    /// Request timeout for status API handlers in seconds.
    pub request_timeout_secs: u64,
}

impl Default for StatusApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "127.0.0.1:8090".to_string(),
            request_timeout_secs: 10,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error), overridden by RUST_LOG.
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable the Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
