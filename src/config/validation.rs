//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Reject empty registries and duplicate service ids
//! - Validate value ranges (thresholds > 0, ports valid, URLs parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SentinelConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use thiserror::Error;
use url::Url;

use crate::config::schema::{ClientConfig, SentinelConfig, ServiceConfig};

/// A single semantic problem found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("service registry is empty")]
    EmptyRegistry,

    #[error("duplicate service id '{0}'")]
    DuplicateServiceId(String),

    #[error("service '{id}': {reason}")]
    InvalidService { id: String, reason: String },

    #[error("client policy: {0}")]
    InvalidPolicy(String),
}

/// Validate the whole configuration.
pub fn validate_config(config: &SentinelConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    collect_service_errors(&config.services, &mut errors);
    collect_policy_errors(&config.client, &mut errors);

    if config.monitor.interval_secs == 0 {
        errors.push(ValidationError::InvalidPolicy(
            "monitor.interval_secs must be greater than 0".to_string(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate only the service registry.
pub fn validate_services(services: &[ServiceConfig]) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    collect_service_errors(services, &mut errors);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate only the client policy.
pub fn validate_policy(policy: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    collect_policy_errors(policy, &mut errors);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn collect_service_errors(services: &[ServiceConfig], errors: &mut Vec<ValidationError>) {
    if services.is_empty() {
        errors.push(ValidationError::EmptyRegistry);
        return;
    }

    let mut seen = HashSet::new();
    for service in services {
        let invalid = |reason: &str| ValidationError::InvalidService {
            id: service.id.clone(),
            reason: reason.to_string(),
        };

        if service.id.trim().is_empty() {
            errors.push(invalid("id must not be empty"));
        } else if !seen.insert(service.id.as_str()) {
            errors.push(ValidationError::DuplicateServiceId(service.id.clone()));
        }

        match Url::parse(&service.base_url) {
            Ok(url) if url.scheme() != "http" && url.scheme() != "https" => {
                errors.push(invalid("base_url must use http or https"));
            }
            Ok(url) if url.host_str().is_none() => {
                errors.push(invalid("base_url has no host"));
            }
            Ok(_) => {}
            Err(e) => errors.push(invalid(&format!("invalid base_url: {}", e))),
        }

        if service.port == 0 {
            errors.push(invalid("port must be non-zero"));
        }
        if !service.health_path.starts_with('/') {
            errors.push(invalid("health_path must start with '/'"));
        }
        if service.latency_budget_ms == 0 {
            errors.push(invalid("latency_budget_ms must be greater than 0"));
        }
    }
}

fn collect_policy_errors(policy: &ClientConfig, errors: &mut Vec<ValidationError>) {
    let mut invalid = |msg: &str| errors.push(ValidationError::InvalidPolicy(msg.to_string()));

    if policy.failure_threshold == 0 {
        invalid("failure_threshold must be greater than 0");
    }
    if policy.max_retries == 0 {
        invalid("max_retries must be at least 1");
    }
    if policy.connect_timeout_ms == 0 || policy.request_timeout_ms == 0 {
        invalid("timeouts must be greater than 0");
    }
    if policy.backoff_max_ms < policy.backoff_base_ms {
        invalid("backoff_max_ms must not be below backoff_base_ms");
    }
    if policy.jitter_percent > 100 {
        invalid("jitter_percent must be within 0..=100");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(id: &str) -> ServiceConfig {
        ServiceConfig {
            id: id.to_string(),
            display_name: None,
            base_url: "http://127.0.0.1".to_string(),
            port: 8000,
            health_path: "/health".to_string(),
            critical: false,
            latency_budget_ms: 500,
        }
    }

    #[test]
    fn test_empty_registry_rejected() {
        let errors = validate_services(&[]).unwrap_err();
        assert_eq!(errors, vec![ValidationError::EmptyRegistry]);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let errors = validate_services(&[service("core"), service("core")]).unwrap_err();
        assert_eq!(errors, vec![ValidationError::DuplicateServiceId("core".into())]);
    }

    #[test]
    fn test_collects_all_errors() {
        let mut bad = service("bad");
        bad.base_url = "not a url".into();
        bad.port = 0;
        bad.health_path = "health".into();

        let errors = validate_services(&[bad]).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors[0].to_string().starts_with("service 'bad': invalid base_url"));
    }

    #[test]
    fn test_policy_ranges() {
        let policy = ClientConfig {
            failure_threshold: 0,
            max_retries: 0,
            ..ClientConfig::default()
        };
        let errors = validate_policy(&policy).unwrap_err();
        assert_eq!(errors.len(), 2);

        assert!(validate_policy(&ClientConfig::default()).is_ok());
    }

    #[test]
    fn test_full_config_valid() {
        let config = SentinelConfig {
            services: vec![service("core"), service("maba")],
            ..SentinelConfig::default()
        };
        assert!(validate_config(&config).is_ok());
    }
}
