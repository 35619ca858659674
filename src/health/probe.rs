//! Health endpoint response decoding and per-service classification.
//!
//! Services self-report with loosely shaped bodies such as
//! `{"status": "healthy"}`, `{"status": "degraded", ...}` or nothing at all.
//! Any 2xx is accepted; only an explicit non-healthy `status` degrades it.

use serde_json::Value;

use crate::health::ServiceStatus;
use crate::registry::ServiceDescriptor;
use crate::resilience::{ClientError, ServiceResponse};

/// Self-reported status values that count as healthy.
const HEALTHY_WORDS: &[&str] = &["healthy", "ok", "up", "pass"];

/// What a service said about itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthProbeResponse {
    Healthy,
    /// Carries the reported status string.
    Degraded(String),
    /// Empty, non-JSON, or no string `status` field.
    Unrecognized,
}

impl HealthProbeResponse {
    pub fn decode(body: &str) -> Self {
        let body = body.trim();
        if body.is_empty() {
            return HealthProbeResponse::Unrecognized;
        }

        let status = match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(map)) => match map.get("status") {
                Some(Value::String(s)) => s.trim().to_string(),
                _ => return HealthProbeResponse::Unrecognized,
            },
            _ => return HealthProbeResponse::Unrecognized,
        };

        if HEALTHY_WORDS.iter().any(|w| status.eq_ignore_ascii_case(w)) {
            HealthProbeResponse::Healthy
        } else {
            HealthProbeResponse::Degraded(status)
        }
    }
}

/// Status plus the human-readable reason behind it.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub status: ServiceStatus,
    pub latency_ms: Option<f64>,
    pub http_status: Option<u16>,
    pub error: Option<String>,
    pub detail: Option<String>,
}

/// Classify the terminal outcome of one health poll.
pub fn classify(service: &ServiceDescriptor, outcome: &Result<ServiceResponse, ClientError>) -> Classification {
    match outcome {
        Ok(response) => classify_response(service, response),
        Err(e) => Classification {
            status: ServiceStatus::Down,
            latency_ms: None,
            http_status: match e {
                ClientError::HttpStatus { code } => Some(*code),
                _ => None,
            },
            error: Some(e.to_string()),
            detail: None,
        },
    }
}

fn classify_response(service: &ServiceDescriptor, response: &ServiceResponse) -> Classification {
    let latency_ms = response.latency.as_secs_f64() * 1000.0;
    let budget_ms = service.expected_latency_budget_ms as f64;

    let mut reasons = Vec::new();
    if latency_ms > budget_ms {
        reasons.push(format!(
            "latency {:.0}ms exceeds budget {}ms",
            latency_ms, service.expected_latency_budget_ms
        ));
    }
    if let HealthProbeResponse::Degraded(reported) = HealthProbeResponse::decode(&response.body) {
        reasons.push(format!("service reports '{}'", reported));
    }

    let (status, detail) = if reasons.is_empty() {
        (ServiceStatus::Healthy, None)
    } else {
        (ServiceStatus::Degraded, Some(reasons.join("; ")))
    };

    Classification {
        status,
        latency_ms: Some(latency_ms),
        http_status: Some(response.status),
        error: None,
        detail,
    }
}
