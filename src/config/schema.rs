//! Configuration schema definitions.
//!
//! These are the settings the host itself reads. Everything else in the
//! configuration tree stays available through [`Configuration`](super::Configuration)
//! for the service registration extension point.

use serde::{Deserialize, Serialize};

/// Typed host settings extracted from the merged configuration tree.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct HostConfig {
    /// Run loop and shutdown behaviour.
    pub host: HostOptions,

    /// Settings for the default background worker.
    pub worker: WorkerConfig,

    /// Log filter and output format.
    pub logging: LoggingConfig,
}

/// What the host does when a background task faults.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskFaultBehavior {
    /// Log the fault and begin an orderly shutdown with a non-zero exit.
    #[default]
    StopHost,
    /// Log the fault and keep the remaining tasks running.
    ///
    /// Opts out of the non-zero exit for faults: a faulted task no longer
    /// affects the exit status, which stays 0 unless a task is aborted at
    /// the shutdown deadline.
    Ignore,
}

/// Host run loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct HostOptions {
    /// Name used in log spans and metric labels.
    pub name: String,

    /// Grace period for tasks to observe cancellation before they are aborted.
    pub shutdown_timeout_ms: u64,

    /// Stop the host once every hosted task has finished on its own.
    pub stop_when_idle: bool,

    /// Reaction to an unhandled task fault.
    pub task_fault_behavior: TaskFaultBehavior,
}

impl Default for HostOptions {
    fn default() -> Self {
        Self {
            name: "service-host".to_string(),
            shutdown_timeout_ms: 30_000,
            stop_when_idle: true,
            task_fault_behavior: TaskFaultBehavior::StopHost,
        }
    }
}

/// Default worker configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct WorkerConfig {
    /// How long the worker waits before completing, in milliseconds.
    pub delay_ms: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self { delay_ms: 10 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable, for development.
    #[default]
    Pretty,
    /// One JSON object per line, for log aggregation.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (e.g. `info` or `service_host=debug`). `RUST_LOG` wins.
    pub level: String,

    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}
