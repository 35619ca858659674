//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the registry and client pool from validated configuration
//! - Start background tasks (monitor loop, metrics exporter, status API)
//! - Wait for a signal, then drain tasks in order
//!
//! # Design Decisions
//! - Fail fast: any configuration error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Shutdown has a deadline: tasks still running after it are abandoned

use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use crate::config::SentinelConfig;
use crate::health::{HealthAggregator, HealthMonitor};
use crate::http::{StatusServer, StatusState};
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics;

const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Run the sentinel until SIGINT/SIGTERM.
pub async fn run(config: SentinelConfig) -> Result<(), Box<dyn std::error::Error>> {
    let aggregator = Arc::new(HealthAggregator::from_config(&config)?);
    let critical = aggregator.registry().iter().filter(|s| s.is_critical).count();
    tracing::info!(
        services = aggregator.registry().len(),
        critical = critical,
        poll_deadline_ms = aggregator.poll_deadline().as_millis() as u64,
        "Registry loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    let monitor = HealthMonitor::new(aggregator.clone(), Duration::from_secs(config.monitor.interval_secs));
    let latest = monitor.latest();

    let mut tasks = vec![tokio::spawn(monitor.run(shutdown.subscribe()))];

    if config.status_api.enabled {
        let listener = TcpListener::bind(&config.status_api.bind_address).await?;
        let server = StatusServer::new(&config.status_api, StatusState { aggregator, latest });
        let rx = shutdown.subscribe();
        tasks.push(tokio::spawn(async move {
            if let Err(e) = server.run(listener, rx).await {
                tracing::error!(error = %e, "Status API failed");
            }
        }));
    }

    signals::wait_for_shutdown_signal().await;
    shutdown.trigger();

    if tokio::time::timeout(DRAIN_TIMEOUT, join_all(tasks)).await.is_err() {
        tracing::warn!(timeout_secs = DRAIN_TIMEOUT.as_secs(), "Tasks did not drain before deadline");
    }
    Ok(())
}
