//! Concurrent multi-service health aggregation.
//!
//! # Responsibilities
//! - Poll every registry entry concurrently through its long-lived client
//! - Bound each poll with its own deadline (bulkhead isolation)
//! - Convert every client failure into a `Down` entry
//! - Assemble results in registry order and summarize them

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant, SystemTime};
use tracing::Instrument;
use uuid::Uuid;

use crate::config::{ClientConfig, ConfigError, SentinelConfig};
use crate::health::probe::classify;
use crate::health::summary::{summarize, HealthSummary};
use crate::health::{unix_millis, ServiceHealth, ServiceStatus};
use crate::observability::metrics;
use crate::registry::{ClientPool, Registry, ServiceDescriptor};
use crate::resilience::timeouts::{poll_deadline, with_deadline};
use crate::resilience::{CircuitState, ServiceRequest};

/// Everything one poll cycle produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub cycle_id: Uuid,
    #[serde(with = "unix_millis")]
    pub started_at: SystemTime,
    pub duration_ms: u64,
    /// Registry order.
    pub results: Vec<ServiceHealth>,
    pub summary: HealthSummary,
}

/// Polls a fixed registry through a pool of per-service clients.
#[derive(Debug)]
pub struct HealthAggregator {
    registry: Registry,
    pool: ClientPool,
    poll_deadline: Duration,
}

impl HealthAggregator {
    /// Assemble an aggregator from a registry and a pool covering it.
    pub fn new(registry: Registry, pool: ClientPool, poll_deadline: Duration) -> Result<Self, ConfigError> {
        pool.ensure_covers(&registry)?;
        Ok(Self {
            registry,
            pool,
            poll_deadline,
        })
    }

    /// Build the pool for `registry` with one shared client policy.
    pub fn with_policy(registry: Registry, policy: &ClientConfig) -> Result<Self, ConfigError> {
        let pool = ClientPool::build(&registry, policy)?;
        Self::new(registry, pool, poll_deadline(policy))
    }

    /// Build registry, pool and deadline from a loaded configuration.
    pub fn from_config(config: &SentinelConfig) -> Result<Self, ConfigError> {
        let registry = Registry::from_configs(&config.services)?;
        let pool = ClientPool::build(&registry, &config.client)?;
        let deadline = config
            .monitor
            .poll_deadline_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| poll_deadline(&config.client));
        Self::new(registry, pool, deadline)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn pool(&self) -> &ClientPool {
        &self.pool
    }

    pub fn poll_deadline(&self) -> Duration {
        self.poll_deadline
    }

    /// Poll every service once. Never fails for individual services.
    pub async fn check_all(&self) -> Vec<ServiceHealth> {
        join_all(self.registry.iter().map(|service| self.poll(service))).await
    }

    /// Summarize results produced from this aggregator's registry.
    pub fn summarize(&self, results: &[ServiceHealth]) -> Result<HealthSummary, ConfigError> {
        summarize(self.registry.as_slice(), results)
    }

    /// One full cycle: poll, summarize, log and record metrics.
    pub async fn run_cycle(&self) -> Result<HealthReport, ConfigError> {
        let cycle_id = Uuid::new_v4();
        let span = tracing::info_span!("health_cycle", cycle_id = %cycle_id);

        async {
            let started_at = SystemTime::now();
            let started = Instant::now();

            let results = self.check_all().await;
            let summary = self.summarize(&results)?;
            let elapsed = started.elapsed();

            metrics::record_cycle(elapsed, summary.critical_down.len());
            tracing::info!(
                severity = %summary.severity,
                healthy = summary.healthy_count,
                degraded = summary.degraded_count,
                down = summary.down_count,
                critical_down = ?summary.critical_down,
                duration_ms = elapsed.as_millis() as u64,
                "Health cycle complete"
            );

            Ok::<_, ConfigError>(HealthReport {
                cycle_id,
                started_at,
                duration_ms: elapsed.as_millis() as u64,
                results,
                summary,
            })
        }
        .instrument(span)
        .await
    }

    /// Entries for every service before its first poll.
    pub fn pending(&self) -> Vec<ServiceHealth> {
        self.registry
            .iter()
            .map(|service| ServiceHealth::unknown(service.id.clone(), self.circuit_state(&service.id)))
            .collect()
    }

    /// Current breaker state of a service's client.
    pub fn circuit_state(&self, service_id: &str) -> CircuitState {
        self.pool
            .get(service_id)
            .map(|client| client.circuit_state())
            .unwrap_or_default()
    }

    async fn poll(&self, service: &ServiceDescriptor) -> ServiceHealth {
        let Some(client) = self.pool.get(&service.id) else {
            return ServiceHealth {
                service_id: service.id.clone(),
                status: ServiceStatus::Down,
                latency_ms: None,
                error: Some(format!("no client registered for '{}'", service.id)),
                detail: None,
                http_status: None,
                circuit: CircuitState::default(),
                checked_at: SystemTime::now(),
            };
        };

        let request = ServiceRequest::get(service.health_path.clone());
        let outcome = with_deadline(self.poll_deadline, client.execute(&request)).await;
        let c = classify(service, &outcome);

        let health = ServiceHealth {
            service_id: service.id.clone(),
            status: c.status,
            latency_ms: c.latency_ms,
            error: c.error,
            detail: c.detail,
            http_status: c.http_status,
            circuit: client.circuit_state(),
            checked_at: SystemTime::now(),
        };

        match health.status {
            ServiceStatus::Healthy => tracing::debug!(
                service = %service.id,
                latency_ms = ?health.latency_ms,
                "Service healthy"
            ),
            ServiceStatus::Degraded => tracing::info!(
                service = %service.id,
                latency_ms = ?health.latency_ms,
                detail = ?health.detail,
                "Service degraded"
            ),
            ServiceStatus::Down | ServiceStatus::Unknown => tracing::warn!(
                service = %service.id,
                critical = service.is_critical,
                circuit = %health.circuit,
                error = ?health.error,
                "Service down"
            ),
        }

        if let Ok(response) = &outcome {
            metrics::record_probe_latency(&service.id, response.latency);
        }
        metrics::record_service_status(&service.id, health.status);

        health
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::ResilientClient;

    fn registry() -> Registry {
        Registry::new(vec![
            ServiceDescriptor::new("core", "http://127.0.0.1", 1, "/health")
                .unwrap()
                .critical(true),
            ServiceDescriptor::new("maba", "http://127.0.0.1", 2, "/health").unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn test_pool_must_cover_registry() {
        let registry = registry();
        let mut pool = ClientPool::default();
        let core = registry.get("core").unwrap();
        pool.insert(ResilientClient::new("core", core.origin().clone(), &ClientConfig::default()).unwrap());

        let err = HealthAggregator::new(registry, pool, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingClient(id) if id == "maba"));
    }

    #[test]
    fn test_pending_entries_are_unknown() {
        let aggregator = HealthAggregator::with_policy(registry(), &ClientConfig::default()).unwrap();
        let pending = aggregator.pending();
        assert_eq!(pending.len(), 2);
        assert!(pending.iter().all(|h| h.status == ServiceStatus::Unknown));
        assert_eq!(pending[0].service_id, "core");
    }

    #[test]
    fn test_from_config_uses_explicit_deadline() {
        let mut config: SentinelConfig = toml::from_str(
            r#"
            [[services]]
            id = "core"
            base_url = "http://127.0.0.1"
            port = 8000
            "#,
        )
        .unwrap();
        config.monitor.poll_deadline_ms = Some(2500);

        let aggregator = HealthAggregator::from_config(&config).unwrap();
        assert_eq!(aggregator.poll_deadline(), Duration::from_millis(2500));
        assert_eq!(aggregator.registry().len(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_services_are_down_not_errors() {
        let policy = ClientConfig {
            max_retries: 1,
            connect_timeout_ms: 200,
            request_timeout_ms: 200,
            ..ClientConfig::default()
        };
        let aggregator = HealthAggregator::with_policy(registry(), &policy).unwrap();

        let report = aggregator.run_cycle().await.unwrap();
        let ids: Vec<_> = report.results.iter().map(|h| h.service_id.as_str()).collect();
        assert_eq!(ids, vec!["core", "maba"]);
        assert!(report.results.iter().all(|h| h.status == ServiceStatus::Down));
        assert!(report.results.iter().all(|h| h.error.is_some()));
        assert_eq!(report.summary.critical_down, vec!["core".to_string()]);
    }
}
