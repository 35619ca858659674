//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → SentinelConfig (validated, immutable)
//!     → registry built once at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the registry never changes at runtime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::ClientConfig;
pub use schema::LogFormat;
pub use schema::MonitorConfig;
pub use schema::ObservabilityConfig;
pub use schema::SentinelConfig;
pub use schema::ServiceConfig;
pub use schema::StatusApiConfig;
pub use validation::ValidationError;
