//! Start-up error types and process exit codes.

use thiserror::Error;

use crate::config::ConfigError;
use crate::observability::logging::LoggingError;
use crate::services::ServiceError;

/// Normal shutdown.
pub const EXIT_OK: u8 = 0;
/// A background task faulted and stopped the host.
pub const EXIT_TASK_FAULT: u8 = 1;
/// Configuration or service wiring failed before any task ran.
pub const EXIT_STARTUP: u8 = 2;
/// A task ignored cancellation and was aborted after the shutdown timeout.
pub const EXIT_SHUTDOWN_TIMEOUT: u8 = 3;

/// Errors that prevent the host from starting.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("service registration failed: {0}")]
    Service(#[from] ServiceError),

    #[error("logging setup failed: {0}")]
    Logging(#[from] LoggingError),
}

impl HostError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> u8 {
        EXIT_STARTUP
    }
}
