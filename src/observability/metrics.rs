//! Metrics collection and exposition.
//!
//! # Metrics
//! - `health_service_status` (gauge): 1=healthy, 0.5=degraded, 0=down, -1=unknown
//! - `health_probe_latency_seconds` (histogram): health endpoint latency
//! - `health_circuit_state` (gauge): 0=closed, 1=half-open, 2=open
//! - `health_client_retries_total` (counter): retries by service
//! - `health_client_failures_total` (counter): terminal failures by service, kind
//! - `health_circuit_rejections_total` (counter): fast-failed calls
//! - `health_cycle_duration_seconds` (histogram): wall time of one poll cycle
//! - `health_critical_down` (gauge): critical services down in the last cycle

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

use crate::health::ServiceStatus;
use crate::resilience::circuit_breaker::CircuitState;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    let builder = PrometheusBuilder::new().with_http_listener(addr);
    match builder.install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_service_status(service: &str, status: ServiceStatus) {
    let value = match status {
        ServiceStatus::Healthy => 1.0,
        ServiceStatus::Degraded => 0.5,
        ServiceStatus::Down => 0.0,
        ServiceStatus::Unknown => -1.0,
    };
    gauge!("health_service_status", "service" => service.to_string()).set(value);
}

pub fn record_probe_latency(service: &str, latency: Duration) {
    histogram!("health_probe_latency_seconds", "service" => service.to_string())
        .record(latency.as_secs_f64());
}

pub fn record_circuit_state(service: &str, state: CircuitState) {
    let value = match state {
        CircuitState::Closed => 0.0,
        CircuitState::HalfOpen => 1.0,
        CircuitState::Open => 2.0,
    };
    gauge!("health_circuit_state", "service" => service.to_string()).set(value);
}

pub fn record_retry(service: &str) {
    counter!("health_client_retries_total", "service" => service.to_string()).increment(1);
}

pub fn record_client_failure(service: &str, kind: &'static str) {
    counter!("health_client_failures_total", "service" => service.to_string(), "kind" => kind)
        .increment(1);
}

pub fn record_circuit_rejection(service: &str) {
    counter!("health_circuit_rejections_total", "service" => service.to_string()).increment(1);
}

pub fn record_cycle(duration: Duration, critical_down: usize) {
    histogram!("health_cycle_duration_seconds").record(duration.as_secs_f64());
    gauge!("health_critical_down").set(critical_down as f64);
}
