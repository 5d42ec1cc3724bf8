//! Metrics collection.
//!
//! # Metrics
//! - `host_tasks_running` (gauge): hosted tasks currently executing
//! - `host_task_finished_total` (counter): finished tasks by task, state
//! - `host_shutdown_initiated_total` (counter): shutdowns by trigger
//! - `host_shutdown_duration_seconds` (histogram): time from trigger to drained
//!
//! # Design Decisions
//! - Emitted through the `metrics` facade; no exporter is installed by the host
//! - Labels carry the host name so several hosts can share a recorder

pub(crate) const METRIC_TASKS_RUNNING: &str = "host_tasks_running";
pub(crate) const METRIC_TASK_FINISHED: &str = "host_task_finished_total";
pub(crate) const METRIC_SHUTDOWN_INITIATED: &str = "host_shutdown_initiated_total";
pub(crate) const METRIC_SHUTDOWN_DURATION: &str = "host_shutdown_duration_seconds";

pub(crate) fn record_tasks_running(host: &str, running: usize) {
    metrics::gauge!(METRIC_TASKS_RUNNING, "host" => host.to_string()).set(running as f64);
}

pub(crate) fn record_task_finished(host: &str, task: &str, state: &str) {
    metrics::counter!(
        METRIC_TASK_FINISHED,
        "host" => host.to_string(),
        "task" => task.to_string(),
        "state" => state.to_string()
    )
    .increment(1);
}

pub(crate) fn record_shutdown_initiated(host: &str, trigger: &str) {
    metrics::counter!(
        METRIC_SHUTDOWN_INITIATED,
        "host" => host.to_string(),
        "trigger" => trigger.to_string()
    )
    .increment(1);
}

pub(crate) fn record_shutdown_duration(host: &str, duration_secs: f64) {
    metrics::histogram!(METRIC_SHUTDOWN_DURATION, "host" => host.to_string())
        .record(duration_secs);
}
