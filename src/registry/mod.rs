//! Service registry.
//!
//! # Data Flow
//! ```text
//! [[services]] config entries
//!     → descriptor.rs (validated ServiceDescriptor, origin pre-computed)
//!     → Registry (ordered, unique ids, never empty)
//!     → pool.rs (one ResilientClient per service, built once)
//! ```
//!
//! # Design Decisions
//! - Registry order is the output order of every report
//! - The pool is injected into the aggregator; no global client cache

pub mod descriptor;
pub mod pool;

use std::collections::HashSet;

use crate::config::{ConfigError, ServiceConfig, ValidationError};
use crate::config::validation::validate_services;

pub use descriptor::ServiceDescriptor;
pub use pool::ClientPool;

/// Ordered, non-empty set of services with unique ids.
#[derive(Debug, Clone)]
pub struct Registry {
    services: Vec<ServiceDescriptor>,
}

impl Registry {
    pub fn new(services: Vec<ServiceDescriptor>) -> Result<Self, ConfigError> {
        if services.is_empty() {
            return Err(ConfigError::EmptyRegistry);
        }

        let mut seen = HashSet::new();
        let duplicates: Vec<_> = services
            .iter()
            .filter(|s| !seen.insert(s.id.as_str()))
            .map(|s| ValidationError::DuplicateServiceId(s.id.clone()))
            .collect();
        if !duplicates.is_empty() {
            return Err(ConfigError::Validation(duplicates));
        }

        Ok(Self { services })
    }

    pub fn from_configs(configs: &[ServiceConfig]) -> Result<Self, ConfigError> {
        validate_services(configs)?;
        let services = configs
            .iter()
            .map(ServiceDescriptor::from_config)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ConfigError::Validation(vec![e]))?;
        Self::new(services)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ServiceDescriptor> {
        self.services.iter()
    }

    pub fn as_slice(&self) -> &[ServiceDescriptor] {
        &self.services
    }

    pub fn get(&self, id: &str) -> Option<&ServiceDescriptor> {
        self.services.iter().find(|s| s.id == id)
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl<'a> IntoIterator for &'a Registry {
    type Item = &'a ServiceDescriptor;
    type IntoIter = std::slice::Iter<'a, ServiceDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
