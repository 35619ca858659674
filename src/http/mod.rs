//! HTTP surface of the sentinel.
//!
//! # Data Flow
//! ```text
//! Caller (dashboard, alerting, health-cli)
//!     → server.rs (axum router, trace + timeout layers)
//!     → latest HealthReport published by the monitor
//! ```
//!
//! # Design Decisions
//! - Read-only: handlers never trigger polls
//! - Before the first cycle every service reports `unknown`

pub mod server;

pub use server::{StatusServer, StatusState};
