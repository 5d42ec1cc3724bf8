//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! host.toml
//!     → host.<environment>.toml (optional overlay)
//!     → SERVICE_HOST__* environment variables
//!     → --set key=value overrides
//!     → loader.rs (merge into one toml::Table)
//!     → schema.rs (typed HostConfig via serde)
//!     → validation.rs (semantic checks)
//!     → Configuration (validated, immutable)
//!     → registered in the ServiceRegistry for every consumer
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no hot reload
//! - All fields have defaults to allow minimal (or absent) config files
//! - Unknown sections are kept so service registration can read them
//! - Validation separates syntactic (serde) from semantic checks

pub mod configuration;
pub mod loader;
pub mod schema;
pub mod validation;

pub use configuration::Configuration;
pub use loader::{load_config, load_configuration, ConfigError, ConfigSource};
pub use schema::HostConfig;
pub use schema::HostOptions;
pub use schema::LogFormat;
pub use schema::LoggingConfig;
pub use schema::TaskFaultBehavior;
pub use schema::WorkerConfig;
