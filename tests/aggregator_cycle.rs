//! End-to-end poll cycles against loopback backends.

use std::time::{Duration, Instant};

use health_sentinel::config::load_config;
use health_sentinel::health::{HealthAggregator, ServiceStatus, Severity};
use health_sentinel::registry::{ClientPool, Registry};
use health_sentinel::resilience::CircuitState;

mod common;

#[tokio::test]
async fn test_critical_service_down_escalates() {
    let core = common::start_mock_backend(500, "boom").await;
    let maba = common::start_mock_backend(200, r#"{"status":"healthy"}"#).await;

    let registry = Registry::new(vec![
        common::service("core", &core).critical(true),
        common::service("maba", &maba),
    ])
    .unwrap();
    let aggregator = HealthAggregator::with_policy(registry, &common::fast_policy()).unwrap();

    let report = aggregator.run_cycle().await.unwrap();
    let summary = &report.summary;

    assert_eq!(summary.total, 2);
    assert_eq!(summary.down_count, 1);
    assert_eq!(summary.healthy_count, 1);
    assert_eq!(summary.critical_down, vec!["core".to_string()]);
    assert!(!summary.all_healthy);
    assert_eq!(summary.severity, Severity::Critical);
    assert_eq!(summary.severity.exit_code(), 2);

    let core_health = &report.results[0];
    assert_eq!(core_health.status, ServiceStatus::Down);
    assert_eq!(core_health.http_status, Some(500));
    assert_eq!(core_health.latency_ms, None);
    assert!(core_health.error.as_deref().unwrap().contains("500"));

    let maba_health = &report.results[1];
    assert_eq!(maba_health.status, ServiceStatus::Healthy);
    assert!(maba_health.latency_ms.is_some());
    assert_eq!(summary.avg_latency_ms, maba_health.latency_ms);
}

#[tokio::test]
async fn test_slow_services_poll_concurrently() {
    let delay = Duration::from_millis(400);
    let a = common::start_slow_backend(delay, 200, r#"{"status":"ok"}"#).await;
    let b = common::start_slow_backend(delay, 200, r#"{"status":"ok"}"#).await;
    let c = common::start_slow_backend(delay, 200, r#"{"status":"ok"}"#).await;

    let registry = Registry::new(vec![
        common::service("a", &a),
        common::service("b", &b),
        common::service("c", &c),
    ])
    .unwrap();
    let aggregator = HealthAggregator::with_policy(registry, &common::fast_policy()).unwrap();

    let started = Instant::now();
    let results = aggregator.check_all().await;
    let elapsed = started.elapsed();

    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|h| h.status == ServiceStatus::Healthy));
    // Sequential polling would take at least 1200ms.
    assert!(elapsed < Duration::from_millis(1000), "cycle took {:?}", elapsed);
}

#[tokio::test]
async fn test_results_follow_registry_order() {
    let slow = common::start_slow_backend(Duration::from_millis(300), 200, "{}").await;
    let fast = common::start_mock_backend(200, "{}").await;
    let medium = common::start_slow_backend(Duration::from_millis(100), 200, "{}").await;

    let registry = Registry::new(vec![
        common::service("slow", &slow),
        common::service("fast", &fast),
        common::service("medium", &medium),
    ])
    .unwrap();
    let aggregator = HealthAggregator::with_policy(registry, &common::fast_policy()).unwrap();

    let report = aggregator.run_cycle().await.unwrap();
    let ids: Vec<_> = report.results.iter().map(|h| h.service_id.as_str()).collect();
    assert_eq!(ids, vec!["slow", "fast", "medium"]);
}

#[tokio::test]
async fn test_slow_response_is_degraded_by_budget() {
    let backend = common::start_slow_backend(Duration::from_millis(150), 200, r#"{"status":"ok"}"#).await;
    let registry = Registry::new(vec![common::service("search", &backend).latency_budget_ms(50)]).unwrap();
    let aggregator = HealthAggregator::with_policy(registry, &common::fast_policy()).unwrap();

    let report = aggregator.run_cycle().await.unwrap();
    let health = &report.results[0];

    assert_eq!(health.status, ServiceStatus::Degraded);
    assert!(health.latency_ms.unwrap() >= 150.0);
    assert!(health.detail.as_deref().unwrap().contains("exceeds budget 50ms"));
    assert_eq!(report.summary.degraded_count, 1);
    assert_eq!(report.summary.severity, Severity::Degraded);
}

#[tokio::test]
async fn test_self_reported_degradation() {
    let backend = common::start_mock_backend(200, r#"{"status":"degraded"}"#).await;
    let registry = Registry::new(vec![common::service("billing", &backend).critical(true)]).unwrap();
    let aggregator = HealthAggregator::with_policy(registry, &common::fast_policy()).unwrap();

    let report = aggregator.run_cycle().await.unwrap();
    let health = &report.results[0];

    assert_eq!(health.status, ServiceStatus::Degraded);
    assert!(health.detail.as_deref().unwrap().contains("degraded"));
    // Degraded critical services do not escalate.
    assert!(report.summary.critical_down.is_empty());
    assert_eq!(report.summary.severity, Severity::Degraded);
}

#[tokio::test]
async fn test_unrecognized_body_counts_as_healthy() {
    let backend = common::start_mock_backend(200, "pong").await;
    let registry = Registry::new(vec![common::service("legacy", &backend)]).unwrap();
    let aggregator = HealthAggregator::with_policy(registry, &common::fast_policy()).unwrap();

    let report = aggregator.run_cycle().await.unwrap();
    assert_eq!(report.results[0].status, ServiceStatus::Healthy);
    assert!(report.summary.all_healthy);
    assert_eq!(report.summary.severity.exit_code(), 0);
}

#[tokio::test]
async fn test_poll_deadline_bounds_a_hung_service() {
    let hung = common::start_slow_backend(Duration::from_secs(5), 200, "{}").await;
    let fine = common::start_mock_backend(200, "{}").await;

    let registry = Registry::new(vec![common::service("hung", &hung), common::service("fine", &fine)]).unwrap();
    let policy = health_sentinel::config::ClientConfig {
        request_timeout_ms: 10_000,
        ..common::fast_policy()
    };
    let pool = ClientPool::build(&registry, &policy).unwrap();
    let aggregator = HealthAggregator::new(registry, pool, Duration::from_millis(300)).unwrap();

    let started = Instant::now();
    let report = aggregator.run_cycle().await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(2));

    assert_eq!(report.results[0].status, ServiceStatus::Down);
    assert!(report.results[0].error.as_deref().unwrap().contains("timed out"));
    assert_eq!(report.results[1].status, ServiceStatus::Healthy);
}

#[tokio::test]
async fn test_poll_deadline_failures_open_circuit() {
    let hung = common::start_slow_backend(Duration::from_secs(5), 200, "{}").await;
    let registry = Registry::new(vec![common::service("hung", &hung)]).unwrap();
    let policy = health_sentinel::config::ClientConfig {
        failure_threshold: 2,
        recovery_timeout_secs: 30,
        request_timeout_ms: 10_000,
        ..common::fast_policy()
    };
    let pool = ClientPool::build(&registry, &policy).unwrap();
    let aggregator = HealthAggregator::new(registry, pool, Duration::from_millis(200)).unwrap();

    let first = aggregator.check_all().await;
    assert_eq!(first[0].status, ServiceStatus::Down);
    assert_eq!(first[0].circuit, CircuitState::Closed);
    assert_eq!(aggregator.pool().get("hung").unwrap().circuit().failure_count, 1);

    let second = aggregator.check_all().await;
    assert_eq!(second[0].circuit, CircuitState::Open);

    let third = aggregator.check_all().await;
    assert_eq!(third[0].status, ServiceStatus::Down);
    assert!(third[0].error.as_deref().unwrap().contains("circuit open"));
    assert_eq!(hung.hits(), 2);
}

#[tokio::test]
async fn test_hung_service_never_recovers_across_cycles() {
    let hung = common::start_slow_backend(Duration::from_secs(10), 200, "{}").await;
    let registry = Registry::new(vec![common::service("hung", &hung).critical(true)]).unwrap();
    let policy = health_sentinel::config::ClientConfig {
        failure_threshold: 1,
        recovery_timeout_secs: 1,
        request_timeout_ms: 10_000,
        ..common::fast_policy()
    };
    let pool = ClientPool::build(&registry, &policy).unwrap();
    let aggregator = HealthAggregator::new(registry, pool, Duration::from_millis(150)).unwrap();

    for cycle in 0..5 {
        if cycle > 0 {
            tokio::time::sleep(Duration::from_millis(1_100)).await;
        }
        let report = aggregator.run_cycle().await.unwrap();
        let health = &report.results[0];
        assert_eq!(health.status, ServiceStatus::Down, "cycle {}", cycle);
        assert_eq!(health.circuit, CircuitState::Open, "cycle {}", cycle);
        assert!(health.error.as_deref().unwrap().contains("timed out"), "cycle {}", cycle);
        assert_eq!(report.summary.critical_down, vec!["hung".to_string()]);
    }

    let snapshot = aggregator.pool().get("hung").unwrap().circuit();
    assert_eq!(snapshot.state, CircuitState::Open);
    // Closed → Open, then HalfOpen → Open on each of the four later cycles.
    assert_eq!(snapshot.transitions, 9);
    assert_eq!(hung.hits(), 5);
}

#[tokio::test]
async fn test_cycle_from_config_file() {
    let core = common::start_mock_backend(200, r#"{"status":"UP"}"#).await;
    let maba = common::start_mock_backend(503, "").await;

    let toml = format!(
        r#"
[client]
max_retries = 1
backoff_base_ms = 10

[[services]]
id = "core"
display_name = "Core API"
base_url = "http://127.0.0.1"
port = {}
critical = true

[[services]]
id = "maba"
base_url = "http://127.0.0.1"
port = {}
health_path = "/status"
"#,
        core.port(),
        maba.port()
    );

    let path = std::env::temp_dir().join(format!("sentinel-{}.toml", uuid::Uuid::new_v4()));
    std::fs::write(&path, toml).unwrap();
    let config = load_config(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    let aggregator = HealthAggregator::from_config(&config).unwrap();
    assert_eq!(aggregator.registry().get("core").unwrap().display_name, "Core API");

    let report = aggregator.run_cycle().await.unwrap();
    assert_eq!(report.results[0].status, ServiceStatus::Healthy);
    assert_eq!(report.results[1].status, ServiceStatus::Down);
    assert_eq!(report.results[1].http_status, Some(503));
    assert!(report.summary.critical_down.is_empty());
    assert_eq!(report.summary.severity, Severity::Degraded);
    assert_eq!(maba.hits(), 1);
}
