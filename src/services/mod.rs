//! Service registration.
//!
//! # Data Flow
//! ```text
//! startup.rs
//!     → ServiceCollection (Configuration, AppArgs)
//!     → install_services (application bindings)
//!     → add_hosted_task(Worker)
//!     → Host::new adds Shutdown, then build()
//!     → ServiceRegistry (frozen) → hosted task factories
//! ```
//!
//! # Design Decisions
//! - No global container: the registry is an explicit value passed by reference
//! - Bindings are keyed by type name or by an explicit name
//! - Hosted tasks are created after the registry is frozen, so their
//!   dependencies are resolved from the final set of bindings

pub mod collection;
pub mod registry;

pub use collection::ServiceCollection;
pub use registry::ServiceRegistry;

use thiserror::Error;

/// Errors raised while building or resolving services.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("service '{0}' is not registered")]
    Missing(String),

    #[error("service '{name}' is not a {expected}")]
    TypeMismatch { name: String, expected: &'static str },

    #[error("hosted task '{0}' is registered more than once")]
    DuplicateTask(String),

    #[error("failed to create hosted task #{index}: {reason}")]
    Factory { index: usize, reason: String },
}

/// Process arguments after `--`, handed to the application untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppArgs(pub Vec<String>);

/// Application service bindings.
///
/// Add bindings here; the host, the configuration and the default worker are
/// wired by [`startup`](crate::lifecycle::startup).
pub fn install_services(services: ServiceCollection) -> ServiceCollection {
    services
}
