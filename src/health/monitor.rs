//! Periodic health monitoring.
//!
//! # Responsibilities
//! - Run a poll cycle every interval until shutdown
//! - Publish the latest report for readers (status API, CLI)
//! - Log severity changes between cycles

use arc_swap::ArcSwapOption;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::health::aggregator::{HealthAggregator, HealthReport};
use crate::health::summary::Severity;

/// Shared slot holding the most recent report.
pub type LatestReport = Arc<ArcSwapOption<HealthReport>>;

pub struct HealthMonitor {
    aggregator: Arc<HealthAggregator>,
    interval: Duration,
    latest: LatestReport,
}

impl HealthMonitor {
    pub fn new(aggregator: Arc<HealthAggregator>, interval: Duration) -> Self {
        Self {
            aggregator,
            interval,
            latest: Arc::new(ArcSwapOption::empty()),
        }
    }

    /// Handle for readers of the latest report.
    pub fn latest(&self) -> LatestReport {
        self.latest.clone()
    }

    /// Run one cycle and publish it. Returns the new severity.
    pub async fn tick(&self) -> Option<Severity> {
        match self.aggregator.run_cycle().await {
            Ok(report) => {
                let severity = report.summary.severity;
                let previous = self
                    .latest
                    .swap(Some(Arc::new(report)))
                    .map(|r| r.summary.severity);

                match previous {
                    Some(prev) if prev != severity => {
                        if severity > prev {
                            tracing::warn!(from = %prev, to = %severity, "System health worsened");
                        } else {
                            tracing::info!(from = %prev, to = %severity, "System health improved");
                        }
                    }
                    _ => {}
                }
                Some(severity)
            }
            Err(e) => {
                tracing::error!(error = %e, "Health cycle failed");
                None
            }
        }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            services = self.aggregator.registry().len(),
            "Health monitor starting"
        );

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
