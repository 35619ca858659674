//! Circuit breaker for service protection.
//!
//! # States
//! - Closed: normal operation, requests pass through
//! - Open: service assumed down, requests fail fast
//! - Half-Open: testing if service recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: failure_count >= threshold
//! Open → Half-Open: on first access after recovery timeout
//! Half-Open → Closed: probe request succeeds
//! Half-Open → Open: probe request fails (or is abandoned)
//! ```
//!
//! All state lives behind one mutex so the counter increment and the
//! threshold check are a single step. The lock is never held across an await.
//!
//! Every transition bumps a generation counter and each permit carries the
//! generation it was issued in. Outcomes from an older generation are stale
//! and never move the circuit.

use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

use crate::config::ClientConfig;
use crate::observability::metrics;
use crate::resilience::error::ClientError;

/// Circuit breaker states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    #[default]
    Closed,
    Open,
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
            CircuitState::HalfOpen => write!(f, "half-open"),
        }
    }
}

/// Breaker thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerSettings {
    pub failure_threshold: u32,
    pub recovery_timeout: Duration,
}

impl BreakerSettings {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            failure_threshold: config.failure_threshold.max(1),
            recovery_timeout: config.recovery_timeout(),
        }
    }
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self::from_config(&ClientConfig::default())
    }
}

/// Mutable state owned by one client.
#[derive(Debug, Default)]
struct ClientState {
    failure_count: u32,
    last_failure_time: Option<Instant>,
    state: CircuitState,
    probe_in_flight: bool,
    transitions: u64,
    generation: u64,
}

/// Point-in-time copy of the breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitSnapshot {
    pub state: CircuitState,
    pub failure_count: u32,
    pub last_failure_time: Option<Instant>,
    pub transitions: u64,
}

/// Per-service circuit breaker.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    settings: BreakerSettings,
    inner: Mutex<ClientState>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, settings: BreakerSettings) -> Self {
        Self {
            name: name.into(),
            settings,
            inner: Mutex::new(ClientState::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn settings(&self) -> BreakerSettings {
        self.settings
    }

    /// Stored state, without applying a pending recovery transition.
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    pub fn snapshot(&self) -> CircuitSnapshot {
        let inner = self.lock();
        CircuitSnapshot {
            state: inner.state,
            failure_count: inner.failure_count,
            last_failure_time: inner.last_failure_time,
            transitions: inner.transitions,
        }
    }

    /// Ask permission for one logical call.
    ///
    /// Returns `CircuitOpen` without touching the failure counter while the
    /// circuit is open, or while the single half-open probe is in flight.
    pub fn try_acquire(&self) -> Result<CircuitPermit<'_>, ClientError> {
        let now = Instant::now();
        let mut inner = self.lock();

        if inner.state == CircuitState::Open {
            let recovered = inner
                .last_failure_time
                .map_or(true, |at| now.saturating_duration_since(at) >= self.settings.recovery_timeout);
            if recovered {
                self.transition(&mut inner, CircuitState::HalfOpen);
            }
        }

        let state = inner.state;
        let generation = inner.generation;
        match state {
            CircuitState::Closed => Ok(CircuitPermit::new(self, false, generation)),
            CircuitState::HalfOpen if !inner.probe_in_flight => {
                inner.probe_in_flight = true;
                tracing::debug!(service = %self.name, "Admitting half-open probe");
                Ok(CircuitPermit::new(self, true, generation))
            }
            CircuitState::HalfOpen | CircuitState::Open => {
                drop(inner);
                metrics::record_circuit_rejection(&self.name);
                Err(ClientError::CircuitOpen {
                    service: self.name.clone(),
                })
            }
        }
    }

    fn record_success(&self, probe: bool, generation: u64) {
        let mut inner = self.lock();
        if inner.generation != generation {
            tracing::debug!(service = %self.name, "Ignoring stale success");
            return;
        }

        let state = inner.state;
        match state {
            CircuitState::HalfOpen if probe => {
                inner.failure_count = 0;
                inner.probe_in_flight = false;
                self.transition(&mut inner, CircuitState::Closed);
            }
            CircuitState::Closed => inner.failure_count = 0,
            CircuitState::HalfOpen | CircuitState::Open => {}
        }
    }

    fn record_failure(&self, probe: bool, generation: u64) {
        let now = Instant::now();
        let mut inner = self.lock();
        if inner.generation != generation {
            tracing::debug!(service = %self.name, "Ignoring stale failure");
            return;
        }

        let state = inner.state;
        match state {
            CircuitState::HalfOpen if probe => {
                inner.failure_count = inner.failure_count.saturating_add(1);
                inner.last_failure_time = Some(now);
                inner.probe_in_flight = false;
                self.transition(&mut inner, CircuitState::Open);
            }
            CircuitState::Closed => {
                inner.failure_count = inner.failure_count.saturating_add(1);
                inner.last_failure_time = Some(now);
                if inner.failure_count >= self.settings.failure_threshold {
                    self.transition(&mut inner, CircuitState::Open);
                }
            }
            CircuitState::HalfOpen | CircuitState::Open => {}
        }
    }

    fn release_probe(&self, generation: u64) {
        let mut inner = self.lock();
        if inner.generation == generation {
            inner.probe_in_flight = false;
        }
    }

    fn transition(&self, inner: &mut ClientState, to: CircuitState) {
        let from = inner.state;
        inner.state = to;
        inner.transitions += 1;
        inner.generation += 1;

        match to {
            CircuitState::Open => tracing::warn!(
                service = %self.name,
                from = %from,
                failures = inner.failure_count,
                recovery_secs = self.settings.recovery_timeout.as_secs(),
                "Circuit opened"
            ),
            _ => tracing::info!(service = %self.name, from = %from, to = %to, "Circuit state changed"),
        }
        metrics::record_circuit_state(&self.name, to);
    }

    fn lock(&self) -> MutexGuard<'_, ClientState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Permission to run one call; report the outcome with `succeed`/`fail`.
///
/// Dropping an unreported permit counts as a failure. A call cancelled by
/// a deadline is a timeout, and a cancelled probe cannot wedge the breaker
/// in Half-Open.
#[derive(Debug)]
pub struct CircuitPermit<'a> {
    breaker: &'a CircuitBreaker,
    probe: bool,
    generation: u64,
    settled: bool,
}

impl<'a> CircuitPermit<'a> {
    fn new(breaker: &'a CircuitBreaker, probe: bool, generation: u64) -> Self {
        Self {
            breaker,
            probe,
            generation,
            settled: false,
        }
    }

    pub fn is_probe(&self) -> bool {
        self.probe
    }

    pub fn succeed(mut self) {
        self.settled = true;
        self.breaker.record_success(self.probe, self.generation);
    }

    pub fn fail(mut self) {
        self.settled = true;
        self.breaker.record_failure(self.probe, self.generation);
    }

    /// Release without an outcome that affects the breaker.
    pub fn release(mut self) {
        self.settled = true;
        if self.probe {
            self.breaker.release_probe(self.generation);
        }
    }
}

impl Drop for CircuitPermit<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        if self.probe {
            tracing::warn!(service = %self.breaker.name, "Half-open probe abandoned");
        } else {
            tracing::debug!(service = %self.breaker.name, "Call abandoned before completion");
        }
        self.breaker.record_failure(self.probe, self.generation);
    }
}
