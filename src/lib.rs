//! Service host library.
//!
//! Bootstraps a long-running process: layered configuration, an explicit
//! service registry, hosted background tasks, and graceful shutdown through
//! cooperative cancellation.

pub mod cli;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod observability;
pub mod services;
pub mod tasks;

pub use config::HostConfig;
pub use error::HostError;
pub use lifecycle::{Host, RunReport, Shutdown};
pub use services::{ServiceCollection, ServiceRegistry};
pub use tasks::{BackgroundTask, TaskState, Worker};
