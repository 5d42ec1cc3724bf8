//! Background task subsystem.
//!
//! # Data Flow
//! ```text
//! Host::run
//!     → spawn BackgroundTask::execute(child token) once per task
//!     → TaskStates: Created → Running → {Completed, Cancelled, Faulted}
//!     → RunReport
//! ```
//!
//! # Design Decisions
//! - Tasks receive a child token: they observe shutdown but cannot trigger it through it
//! - A task that returns `Ok` after cancellation is `Cancelled`, not `Completed`
//! - Errors and panics are both `Faulted`; the host decides what happens next

pub mod worker;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;

pub use worker::Worker;

/// A long-running unit of work managed by the host.
#[async_trait]
pub trait BackgroundTask: Send + Sync {
    /// Unique name used for logs, metrics and state tracking.
    fn name(&self) -> &str;

    /// Run until the work is done or `cancel` fires.
    ///
    /// Called exactly once. Every suspension point should also await `cancel`
    /// so the task stops promptly when the host shuts down.
    async fn execute(&self, cancel: CancellationToken) -> anyhow::Result<()>;
}

/// Lifecycle state of a hosted task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    Created,
    Running,
    Completed,
    Cancelled,
    Faulted,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Cancelled | TaskState::Faulted
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskState::Created => "created",
            TaskState::Running => "running",
            TaskState::Completed => "completed",
            TaskState::Cancelled => "cancelled",
            TaskState::Faulted => "faulted",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared, concurrently readable table of task states.
#[derive(Debug, Clone, Default)]
pub struct TaskStates {
    inner: Arc<DashMap<String, TaskState>>,
}

impl TaskStates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<TaskState> {
        self.inner.get(name).map(|entry| *entry.value())
    }

    /// Move `name` to `state`. Terminal states are never left.
    pub fn set(&self, name: &str, state: TaskState) {
        let mut entry = self
            .inner
            .entry(name.to_string())
            .or_insert(TaskState::Created);
        if entry.is_terminal() {
            return;
        }
        *entry = state;
    }

    /// All tasks and their states, sorted by name.
    pub fn snapshot(&self) -> Vec<(String, TaskState)> {
        let mut states: Vec<_> = self
            .inner
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        states.sort_by(|a, b| a.0.cmp(&b.0));
        states
    }

    /// Number of tasks currently in `Running`.
    pub fn running(&self) -> usize {
        self.inner
            .iter()
            .filter(|entry| *entry.value() == TaskState::Running)
            .count()
    }
}
