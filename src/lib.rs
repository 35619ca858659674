//! Health Sentinel Library

pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod registry;
pub mod resilience;

pub use config::{load_config, ConfigError, SentinelConfig};
pub use health::{HealthAggregator, HealthMonitor, HealthReport, HealthSummary, Severity};
pub use http::StatusServer;
pub use lifecycle::Shutdown;
pub use registry::{ClientPool, Registry, ServiceDescriptor};
pub use resilience::{ClientError, ResilientClient};
