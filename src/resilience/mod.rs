//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Logical call on a ResilientClient (client.rs):
//!     → circuit_breaker.rs (fail fast if open, admit one half-open probe)
//!     → retries.rs (attempt, back off via backoff.rs, attempt again)
//!         → timeouts.rs (connect/request timeout per attempt)
//!     → terminal outcome recorded once on the breaker
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - Retries only for idempotent requests (GET, HEAD, etc.)
//! - Per-service circuit breaker prevents hammering a failing service
//! - Failures are typed values (`ClientError`), never panics

pub mod backoff;
pub mod circuit_breaker;
pub mod client;
pub mod error;
pub mod retries;
pub mod timeouts;

pub use circuit_breaker::{CircuitBreaker, CircuitSnapshot, CircuitState};
pub use client::{ResilientClient, ServiceRequest, ServiceResponse};
pub use error::{ClientError, ClientResult};
