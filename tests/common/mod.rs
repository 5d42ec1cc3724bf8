//! Shared tasks and helpers for host integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use service_host::config::{HostOptions, TaskFaultBehavior};
use service_host::BackgroundTask;
use tokio_util::sync::CancellationToken;

/// Host options with a short shutdown timeout so failures surface quickly.
pub fn options(shutdown_timeout_ms: u64) -> HostOptions {
    HostOptions {
        name: "test-host".to_string(),
        shutdown_timeout_ms,
        stop_when_idle: true,
        task_fault_behavior: TaskFaultBehavior::StopHost,
    }
}

/// Fails with `boom` after a short delay, unless cancelled first.
pub struct FailingTask {
    pub delay: Duration,
}

#[async_trait]
impl BackgroundTask for FailingTask {
    fn name(&self) -> &str {
        "failing"
    }

    async fn execute(&self, cancel: CancellationToken) -> anyhow::Result<()> {
        tokio::select! {
            _ = cancel.cancelled() => Ok(()),
            _ = tokio::time::sleep(self.delay) => anyhow::bail!("boom"),
        }
    }
}

/// Panics as soon as it runs.
pub struct PanickingTask;

#[async_trait]
impl BackgroundTask for PanickingTask {
    fn name(&self) -> &str {
        "panicking"
    }

    async fn execute(&self, _cancel: CancellationToken) -> anyhow::Result<()> {
        panic!("task exploded");
    }
}

/// Ignores cancellation entirely.
pub struct StubbornTask;

#[async_trait]
impl BackgroundTask for StubbornTask {
    fn name(&self) -> &str {
        "stubborn"
    }

    async fn execute(&self, _cancel: CancellationToken) -> anyhow::Result<()> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(())
    }
}

/// Runs until cancelled.
pub struct WaitForCancel;

#[async_trait]
impl BackgroundTask for WaitForCancel {
    fn name(&self) -> &str {
        "waiter"
    }

    async fn execute(&self, cancel: CancellationToken) -> anyhow::Result<()> {
        cancel.cancelled().await;
        Ok(())
    }
}

/// Counts how many times it is executed.
pub struct CountingTask {
    pub runs: Arc<AtomicUsize>,
}

#[async_trait]
impl BackgroundTask for CountingTask {
    fn name(&self) -> &str {
        "counting"
    }

    async fn execute(&self, _cancel: CancellationToken) -> anyhow::Result<()> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
