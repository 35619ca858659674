//! Read-only status API.
//!
//! # Responsibilities
//! - Serve the latest `HealthReport` published by the monitor
//! - Expose per-service health and the summary verdict
//! - Liveness endpoint for the sentinel itself
//!
//! # Routes
//! - `GET /healthz`: sentinel liveness
//! - `GET /status`: latest report (503 with pending entries before the first cycle)
//! - `GET /status/summary`: latest summary
//! - `GET /status/services/{id}`: one service's latest health

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::StatusApiConfig;
use crate::health::{HealthAggregator, LatestReport, ServiceHealth};

/// State injected into handlers.
#[derive(Clone)]
pub struct StatusState {
    pub aggregator: Arc<HealthAggregator>,
    pub latest: LatestReport,
}

#[derive(Serialize)]
struct PendingStatus {
    state: &'static str,
    results: Vec<ServiceHealth>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// HTTP server for the status API.
pub struct StatusServer {
    router: Router,
}

impl StatusServer {
    pub fn new(config: &StatusApiConfig, state: StatusState) -> Self {
        Self {
            router: Self::build_router(config, state),
        }
    }

    #[allow(deprecated)]
    fn build_router(config: &StatusApiConfig, state: StatusState) -> Router {
        Router::new()
            .route("/healthz", get(liveness))
            .route("/status", get(get_status))
            .route("/status/summary", get(get_summary))
            .route("/status/services/{id}", get(get_service))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
            .layer(TraceLayer::new_for_http())
    }

    /// Serve until the shutdown signal fires.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Status API starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("Status API stopped");
        Ok(())
    }
}

async fn liveness() -> &'static str {
    "ok"
}

async fn get_status(State(state): State<StatusState>) -> Response {
    match state.latest.load_full() {
        Some(report) => Json(report.as_ref().clone()).into_response(),
        None => pending(&state),
    }
}

async fn get_summary(State(state): State<StatusState>) -> Response {
    match state.latest.load_full() {
        Some(report) => Json(report.summary.clone()).into_response(),
        None => pending(&state),
    }
}

async fn get_service(State(state): State<StatusState>, Path(id): Path<String>) -> Response {
    if state.aggregator.registry().get(&id).is_none() {
        let body = ErrorBody {
            error: format!("unknown service '{}'", id),
        };
        return (StatusCode::NOT_FOUND, Json(body)).into_response();
    }

    let latest = state
        .latest
        .load_full()
        .and_then(|report| report.results.iter().find(|h| h.service_id == id).cloned());

    match latest {
        Some(health) => Json(health).into_response(),
        None => Json(ServiceHealth::unknown(id.clone(), state.aggregator.circuit_state(&id))).into_response(),
    }
}

fn pending(state: &StatusState) -> Response {
    let body = PendingStatus {
        state: "pending",
        results: state.aggregator.pending(),
    };
    (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response()
}
