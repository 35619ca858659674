//! System-wide summary of one poll cycle.

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::health::{ServiceHealth, ServiceStatus};
use crate::registry::ServiceDescriptor;

/// Overall verdict. Any critical service down is always `Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Healthy,
    Degraded,
    Critical,
}

impl Severity {
    /// Process exit code for command-line callers.
    pub fn exit_code(self) -> i32 {
        match self {
            Severity::Healthy => 0,
            Severity::Degraded => 1,
            Severity::Critical => 2,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Healthy => "healthy",
            Severity::Degraded => "degraded",
            Severity::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// Aggregate over one cycle. Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthSummary {
    pub total: usize,
    pub healthy_count: usize,
    pub degraded_count: usize,
    pub down_count: usize,
    pub unknown_count: usize,
    /// Mean over entries that have a latency; `None` if none do.
    pub avg_latency_ms: Option<f64>,
    /// Critical services that are down, in registry order.
    pub critical_down: Vec<String>,
    /// Every service is exactly `Healthy`.
    pub all_healthy: bool,
    pub severity: Severity,
}

/// Summarize `results` against the registry they were polled from.
///
/// An empty registry or result set is a configuration error, not a
/// zero-valued summary.
pub fn summarize(registry: &[ServiceDescriptor], results: &[ServiceHealth]) -> Result<HealthSummary, ConfigError> {
    if registry.is_empty() || results.is_empty() {
        return Err(ConfigError::EmptyRegistry);
    }

    let count = |status: ServiceStatus| results.iter().filter(|r| r.status == status).count();

    let latencies: Vec<f64> = results.iter().filter_map(|r| r.latency_ms).collect();
    let avg_latency_ms = if latencies.is_empty() {
        None
    } else {
        Some(latencies.iter().sum::<f64>() / latencies.len() as f64)
    };

    let critical_down: Vec<String> = registry
        .iter()
        .filter(|service| service.is_critical)
        .filter(|service| {
            results
                .iter()
                .any(|r| r.service_id == service.id && r.status == ServiceStatus::Down)
        })
        .map(|service| service.id.clone())
        .collect();

    let all_healthy = results.iter().all(ServiceHealth::is_healthy);

    let severity = if !critical_down.is_empty() {
        Severity::Critical
    } else if !all_healthy {
        Severity::Degraded
    } else {
        Severity::Healthy
    };

    Ok(HealthSummary {
        total: results.len(),
        healthy_count: count(ServiceStatus::Healthy),
        degraded_count: count(ServiceStatus::Degraded),
        down_count: count(ServiceStatus::Down),
        unknown_count: count(ServiceStatus::Unknown),
        avg_latency_ms,
        critical_down,
        all_healthy,
        severity,
    })
}
