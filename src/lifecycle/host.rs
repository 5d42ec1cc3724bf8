//! The host: owns the registry and hosted tasks, and runs them until shutdown.
//!
//! # Responsibilities
//! - Spawn every hosted task once, with a child cancellation token
//! - Track task states and classify how each task finished
//! - Turn signals, explicit requests, faults or idleness into one shutdown
//! - Drain tasks within the shutdown timeout, aborting any that ignore it
//!
//! # Design Decisions
//! - Faults never escape the run loop; they become a `RunReport` entry
//! - The exit status is derived from the report, not from the trigger alone

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::{Id, JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::{HostOptions, TaskFaultBehavior};
use crate::error::{HostError, EXIT_OK, EXIT_SHUTDOWN_TIMEOUT, EXIT_TASK_FAULT};
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals;
use crate::observability::metrics;
use crate::services::{ServiceCollection, ServiceRegistry};
use crate::tasks::{BackgroundTask, TaskState, TaskStates};

/// Why the host began shutting down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownTrigger {
    /// An OS signal (`SIGINT`, `SIGTERM`).
    Signal(&'static str),
    /// [`Shutdown::trigger`] was called.
    Requested,
    /// The named task faulted under `task_fault_behavior = "stop_host"`.
    TaskFault(String),
    /// Every hosted task finished on its own.
    TasksCompleted,
}

impl ShutdownTrigger {
    /// Short label for logs and metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            ShutdownTrigger::Signal(_) => "signal",
            ShutdownTrigger::Requested => "requested",
            ShutdownTrigger::TaskFault(_) => "task_fault",
            ShutdownTrigger::TasksCompleted => "tasks_completed",
        }
    }
}

impl fmt::Display for ShutdownTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownTrigger::Signal(name) => write!(f, "signal {}", name),
            ShutdownTrigger::Requested => write!(f, "shutdown requested"),
            ShutdownTrigger::TaskFault(task) => write!(f, "task '{}' faulted", task),
            ShutdownTrigger::TasksCompleted => write!(f, "all tasks completed"),
        }
    }
}

/// Final state of one hosted task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    pub name: String,
    pub state: TaskState,
    /// Error chain or panic message for faulted tasks.
    pub error: Option<String>,
}

/// Outcome of [`Host::run`].
#[derive(Debug, Clone)]
pub struct RunReport {
    pub trigger: ShutdownTrigger,
    /// Tasks in the order they finished.
    pub tasks: Vec<TaskReport>,
    /// Tasks aborted because they outlived the shutdown timeout.
    pub forced: Vec<String>,
    pub fault_behavior: TaskFaultBehavior,
}

impl RunReport {
    pub fn task(&self, name: &str) -> Option<&TaskReport> {
        self.tasks.iter().find(|t| t.name == name)
    }

    /// Process exit status: forced termination first, then faults, else success.
    pub fn exit_code(&self) -> u8 {
        if !self.forced.is_empty() {
            return EXIT_SHUTDOWN_TIMEOUT;
        }
        let faulted = self.tasks.iter().any(|t| t.state == TaskState::Faulted);
        if faulted && self.fault_behavior == TaskFaultBehavior::StopHost {
            EXIT_TASK_FAULT
        } else {
            EXIT_OK
        }
    }

    pub fn is_clean(&self) -> bool {
        self.exit_code() == EXIT_OK
    }
}

/// Process-wide host: service registry, hosted tasks and the shutdown signal.
pub struct Host {
    id: Uuid,
    options: HostOptions,
    registry: Arc<ServiceRegistry>,
    tasks: Vec<Arc<dyn BackgroundTask>>,
    shutdown: Shutdown,
    states: TaskStates,
}

impl Host {
    /// Freeze `services` into a registry and instantiate the hosted tasks.
    ///
    /// The host's [`Shutdown`] handle is bound into the registry before it is
    /// built, so tasks and services can request shutdown themselves.
    pub fn new(services: ServiceCollection, options: HostOptions) -> Result<Self, HostError> {
        let shutdown = Shutdown::new();
        let (registry, tasks) = services.add(shutdown.clone()).build()?;

        let states = TaskStates::new();
        for task in &tasks {
            states.set(task.name(), TaskState::Created);
        }

        tracing::debug!(
            services = ?registry.names(),
            tasks = ?registry.hosted_tasks(),
            "Service registry built"
        );

        Ok(Self {
            id: Uuid::new_v4(),
            options,
            registry: Arc::new(registry),
            tasks,
            shutdown,
            states,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn options(&self) -> &HostOptions {
        &self.options
    }

    pub fn registry(&self) -> Arc<ServiceRegistry> {
        self.registry.clone()
    }

    /// Handle that stops the host when triggered.
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Live view of task states, usable while [`run`](Self::run) is in progress.
    pub fn task_states(&self) -> TaskStates {
        self.states.clone()
    }

    /// Run until SIGINT/SIGTERM, an explicit request, a fault, or idleness.
    pub async fn run(self) -> RunReport {
        self.run_until(signals::wait_for_shutdown_signal()).await
    }

    /// Run with `external` standing in for OS signals.
    pub async fn run_until<F>(self, external: F) -> RunReport
    where
        F: Future<Output = ShutdownTrigger>,
    {
        let span = tracing::info_span!("host", name = %self.options.name, host_id = %self.id);
        self.run_inner(external).instrument(span).await
    }

    async fn run_inner<F>(self, external: F) -> RunReport
    where
        F: Future<Output = ShutdownTrigger>,
    {
        let Host {
            options,
            registry: _registry,
            tasks,
            shutdown,
            states,
            ..
        } = self;

        let host_name = options.name.as_str();
        let mut set: JoinSet<(anyhow::Result<()>, bool)> = JoinSet::new();
        let mut names: HashMap<Id, String> = HashMap::new();
        let mut reports = Vec::with_capacity(tasks.len());

        tracing::info!(tasks = tasks.len(), "Host starting");

        for task in tasks {
            let name = task.name().to_string();
            let token = shutdown.child_token();
            let span = tracing::info_span!("task", task = %name);
            states.set(&name, TaskState::Running);
            let handle = set.spawn(run_task(task, token).instrument(span));
            names.insert(handle.id(), name);
        }
        metrics::record_tasks_running(host_name, states.running());

        tokio::pin!(external);
        let trigger = loop {
            // A request cancels every task token, so tasks may drain before the
            // request itself is observed.
            if shutdown.is_triggered() {
                break ShutdownTrigger::Requested;
            }
            if set.is_empty() && options.stop_when_idle {
                break ShutdownTrigger::TasksCompleted;
            }

            tokio::select! {
                biased;
                _ = shutdown.triggered() => break ShutdownTrigger::Requested,
                trigger = &mut external => break trigger,
                Some(joined) = set.join_next_with_id() => {
                    let report = finish(joined, &names, &states, host_name);
                    if report.state == TaskState::Faulted
                        && options.task_fault_behavior == TaskFaultBehavior::StopHost
                    {
                        let task = report.name.clone();
                        reports.push(report);
                        break ShutdownTrigger::TaskFault(task);
                    }
                    reports.push(report);
                }
            }
        };

        metrics::record_shutdown_initiated(host_name, trigger.reason());
        match &trigger {
            ShutdownTrigger::TaskFault(_) => {
                tracing::warn!(trigger = trigger.reason(), "Shutdown initiated: {}", trigger);
            }
            _ => {
                tracing::info!(trigger = trigger.reason(), "Shutdown initiated: {}", trigger);
            }
        }
        shutdown.trigger();

        let timeout = Duration::from_millis(options.shutdown_timeout_ms);
        let deadline = tokio::time::Instant::now() + timeout;
        let started = Instant::now();
        let mut forced = Vec::new();

        loop {
            let next = tokio::time::timeout_at(deadline, set.join_next_with_id()).await;
            match next {
                Ok(Some(joined)) => reports.push(finish(joined, &names, &states, host_name)),
                Ok(None) => break,
                Err(_) => {
                    tracing::warn!(
                        timeout_ms = options.shutdown_timeout_ms,
                        remaining = set.len(),
                        "Shutdown timeout reached, aborting remaining tasks"
                    );
                    set.abort_all();
                    while let Some(joined) = set.join_next_with_id().await {
                        let aborted = matches!(&joined, Err(e) if e.is_cancelled());
                        let report = finish(joined, &names, &states, host_name);
                        if aborted {
                            forced.push(report.name.clone());
                        }
                        reports.push(report);
                    }
                    break;
                }
            }
        }

        metrics::record_shutdown_duration(host_name, started.elapsed().as_secs_f64());
        metrics::record_tasks_running(host_name, 0);

        let report = RunReport {
            trigger,
            tasks: reports,
            forced,
            fault_behavior: options.task_fault_behavior,
        };

        if report.is_clean() {
            tracing::info!(
                drain_ms = started.elapsed().as_millis() as u64,
                "Host stopped"
            );
        } else {
            tracing::warn!(
                exit_code = report.exit_code(),
                forced = ?report.forced,
                "Host stopped with failures"
            );
        }

        report
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("id", &self.id)
            .field("options", &self.options)
            .field("registry", &self.registry)
            .field("tasks", &self.registry.hosted_tasks())
            .finish()
    }
}

/// Execute `task` and note whether cancellation had been requested when it returned.
async fn run_task(
    task: Arc<dyn BackgroundTask>,
    token: CancellationToken,
) -> (anyhow::Result<()>, bool) {
    let result = task.execute(token.clone()).await;
    (result, token.is_cancelled())
}

fn finish(
    joined: Result<(Id, (anyhow::Result<()>, bool)), JoinError>,
    names: &HashMap<Id, String>,
    states: &TaskStates,
    host: &str,
) -> TaskReport {
    let (id, outcome) = match joined {
        Ok((id, outcome)) => (id, Ok(outcome)),
        Err(e) => (e.id(), Err(e)),
    };
    let name = names.get(&id).cloned().unwrap_or_else(|| id.to_string());

    let (state, error) = match outcome {
        Ok((Ok(()), true)) => (TaskState::Cancelled, None),
        Ok((Ok(()), false)) => (TaskState::Completed, None),
        Ok((Err(e), _)) => (TaskState::Faulted, Some(format!("{:#}", e))),
        Err(e) if e.is_cancelled() => (
            TaskState::Faulted,
            Some("aborted after shutdown timeout".to_string()),
        ),
        Err(e) => (TaskState::Faulted, Some(panic_message(e))),
    };

    match &error {
        Some(message) => tracing::error!(task = %name, error = %message, "Task faulted"),
        None => tracing::info!(task = %name, state = %state, "Task finished"),
    }

    states.set(&name, state);
    metrics::record_task_finished(host, &name, state.as_str());
    metrics::record_tasks_running(host, states.running());

    TaskReport { name, state, error }
}

fn panic_message(err: JoinError) -> String {
    match err.try_into_panic() {
        Ok(payload) => {
            if let Some(message) = payload.downcast_ref::<&str>() {
                format!("panicked: {}", message)
            } else if let Some(message) = payload.downcast_ref::<String>() {
                format!("panicked: {}", message)
            } else {
                "panicked".to_string()
            }
        }
        Err(err) => err.to_string(),
    }
}
