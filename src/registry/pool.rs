//! Per-service client pool.
//!
//! # Responsibilities
//! - Own one long-lived `ResilientClient` per declared service
//! - Preserve circuit state across poll cycles
//!
//! Built once at startup and read-only afterwards; only each client's own
//! breaker state changes.

use std::collections::HashMap;

use crate::config::{ClientConfig, ConfigError};
use crate::registry::Registry;
use crate::resilience::ResilientClient;

#[derive(Debug, Default)]
pub struct ClientPool {
    clients: HashMap<String, ResilientClient>,
}

impl ClientPool {
    /// Create one client per registry entry, all sharing `config`'s policy.
    pub fn build(registry: &Registry, config: &ClientConfig) -> Result<Self, ConfigError> {
        let mut clients = HashMap::with_capacity(registry.len());
        for service in registry.iter() {
            let client = ResilientClient::new(service.id.clone(), service.origin().clone(), config)?;
            clients.insert(service.id.clone(), client);
        }

        tracing::debug!(clients = clients.len(), "Client pool built");
        Ok(Self { clients })
    }

    /// Add or replace the client for one service before the pool is shared.
    pub fn insert(&mut self, client: ResilientClient) {
        self.clients.insert(client.name().to_string(), client);
    }

    pub fn get(&self, service_id: &str) -> Option<&ResilientClient> {
        self.clients.get(service_id)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Fail unless every registry entry has a client.
    pub fn ensure_covers(&self, registry: &Registry) -> Result<(), ConfigError> {
        match registry.iter().find(|s| !self.clients.contains_key(&s.id)) {
            Some(missing) => Err(ConfigError::MissingClient(missing.id.clone())),
            None => Ok(()),
        }
    }
}
