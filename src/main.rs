//! Health Sentinel
//!
//! Polls a fixed registry of backend services through per-service resilient
//! clients and publishes a system-wide verdict.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────┐
//!   │                        HEALTH SENTINEL                        │
//!   │                                                               │
//!   │  ┌──────────┐   ┌────────────┐   ┌───────────────────────┐   │
//!   │  │  config  │──▶│  registry  │──▶│ client pool           │   │
//!   │  │  (toml)  │   │ + validate │   │ (one ResilientClient  │   │
//!   │  └──────────┘   └────────────┘   │  per service)         │   │
//!   │                                  └──────────┬────────────┘   │
//!   │                                             │                │
//!   │  ┌──────────────┐   ┌──────────────────┐    ▼                │
//!   │  │   monitor    │──▶│   aggregator     │── fan-out ──────────┼──▶ /health
//!   │  │ (interval)   │   │ join_all + sum.  │◀─ fan-in ───────────┼─── backends
//!   │  └──────┬───────┘   └──────────────────┘                     │
//!   │         │ latest report                                      │
//!   │         ▼                                                    │
//!   │  ┌──────────────┐   ┌──────────────┐   ┌──────────────────┐  │
//!   │  │  status API  │   │ observability│   │    lifecycle     │  │
//!   │  │   (axum)     │   │ logs/metrics │   │ signals/shutdown │  │
//!   │  └──────────────┘   └──────────────┘   └──────────────────┘  │
//!   └──────────────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;

use health_sentinel::config::load_config;
use health_sentinel::lifecycle::startup;
use health_sentinel::observability::logging;

#[derive(Parser)]
#[command(name = "health-sentinel")]
#[command(about = "Continuously monitor a fleet of backend services", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "sentinel.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    logging::init(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        services = config.services.len(),
        interval_secs = config.monitor.interval_secs,
        "health-sentinel starting"
    );

    startup::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
