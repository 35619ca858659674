//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! check_all (aggregator.rs):
//!     fan out one GET per registry entry through its ResilientClient
//!     → probe.rs (decode body, classify Healthy/Degraded/Down)
//!     → fan in, registry order
//!     → summary.rs (counts, average latency, critical escalation)
//!
//! monitor.rs:
//!     Periodic timer → check_all → publish HealthReport
//! ```
//!
//! # Design Decisions
//! - Individual service failures never raise; they become `Down` entries
//! - Only configuration problems are errors
//! - One slow service never delays the others (per-service deadline)

pub mod aggregator;
pub mod monitor;
pub mod probe;
pub mod summary;

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

use crate::resilience::CircuitState;

pub use aggregator::{HealthAggregator, HealthReport};
pub use monitor::{HealthMonitor, LatestReport};
pub use probe::HealthProbeResponse;
pub use summary::{summarize, HealthSummary, Severity};

/// Classification of one service after a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Healthy,
    Degraded,
    Down,
    /// Never polled.
    Unknown,
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ServiceStatus::Healthy => "healthy",
            ServiceStatus::Degraded => "degraded",
            ServiceStatus::Down => "down",
            ServiceStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Result of polling one service. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub service_id: String,
    pub status: ServiceStatus,
    /// Latency of the successful attempt; `None` when no response arrived.
    pub latency_ms: Option<f64>,
    /// Why the service is down.
    pub error: Option<String>,
    /// Why the service is degraded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    /// Breaker state right after the poll.
    pub circuit: CircuitState,
    #[serde(with = "unix_millis")]
    pub checked_at: SystemTime,
}

impl ServiceHealth {
    /// Placeholder for a service that has not been polled yet.
    pub fn unknown(service_id: impl Into<String>, circuit: CircuitState) -> Self {
        Self {
            service_id: service_id.into(),
            status: ServiceStatus::Unknown,
            latency_ms: None,
            error: None,
            detail: None,
            http_status: None,
            circuit,
            checked_at: SystemTime::now(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == ServiceStatus::Healthy
    }
}

/// Serialize `SystemTime` as milliseconds since the Unix epoch.
pub(crate) mod unix_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    pub fn serialize<S: Serializer>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = time
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        serializer.serialize_u64(millis as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SystemTime, D::Error> {
        let millis = u64::deserialize(deserializer)?;
        Ok(UNIX_EPOCH + Duration::from_millis(millis))
    }
}
