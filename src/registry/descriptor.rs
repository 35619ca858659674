//! Static description of one polled service.

use serde::Serialize;
use url::Url;

use crate::config::{ServiceConfig, ValidationError};

/// A declared service. Immutable once the registry is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceDescriptor {
    /// Unique key.
    pub id: String,
    pub display_name: String,
    /// Base URL as configured (scheme + host).
    pub base_url: String,
    pub port: u16,
    pub health_path: String,
    pub is_critical: bool,
    pub expected_latency_budget_ms: u64,
    /// Pre-calculated origin (`base_url` with `port` applied).
    #[serde(skip)]
    origin: Url,
}

impl ServiceDescriptor {
    pub fn new(
        id: impl Into<String>,
        base_url: &str,
        port: u16,
        health_path: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let id = id.into();
        let invalid = |reason: String| ValidationError::InvalidService {
            id: id.clone(),
            reason,
        };

        let mut origin = Url::parse(base_url).map_err(|e| invalid(format!("invalid base_url: {}", e)))?;
        if origin.cannot_be_a_base() || origin.host_str().is_none() {
            return Err(invalid("base_url has no host".to_string()));
        }
        if port == 0 {
            return Err(invalid("port must be non-zero".to_string()));
        }
        origin
            .set_port(Some(port))
            .map_err(|_| invalid("cannot apply port to base_url".to_string()))?;

        let health_path = health_path.into();
        if !health_path.starts_with('/') {
            return Err(invalid("health_path must start with '/'".to_string()));
        }

        Ok(Self {
            display_name: id.clone(),
            id,
            base_url: base_url.to_string(),
            port,
            health_path,
            is_critical: false,
            expected_latency_budget_ms: 1000,
            origin,
        })
    }

    pub fn from_config(config: &ServiceConfig) -> Result<Self, ValidationError> {
        let mut descriptor = Self::new(
            config.id.clone(),
            &config.base_url,
            config.port,
            config.health_path.clone(),
        )?;
        if let Some(name) = &config.display_name {
            descriptor.display_name = name.clone();
        }
        descriptor.is_critical = config.critical;
        descriptor.expected_latency_budget_ms = config.latency_budget_ms;
        Ok(descriptor)
    }

    pub fn critical(mut self, is_critical: bool) -> Self {
        self.is_critical = is_critical;
        self
    }

    pub fn latency_budget_ms(mut self, budget_ms: u64) -> Self {
        self.expected_latency_budget_ms = budget_ms;
        self
    }

    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    /// Scheme, host and port the service's client talks to.
    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Full URL of the health endpoint.
    pub fn health_url(&self) -> String {
        let mut url = self.origin.clone();
        url.set_path(&self.health_path);
        url.to_string()
    }
}
