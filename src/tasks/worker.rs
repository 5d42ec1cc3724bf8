//! Default background worker.

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::config::{Configuration, WorkerConfig};
use crate::services::{ServiceError, ServiceRegistry};
use crate::tasks::BackgroundTask;

/// Placeholder application task: waits a short, configured delay and returns.
///
/// Replace the body of [`execute`](BackgroundTask::execute) with real work
/// (polling loops, queue consumers, timers), keeping `cancel` in every `select!`.
#[derive(Debug, Clone)]
pub struct Worker {
    delay: Duration,
}

impl Worker {
    pub const NAME: &'static str = "worker";

    pub fn new(config: &WorkerConfig) -> Self {
        Self {
            delay: Duration::from_millis(config.delay_ms),
        }
    }

    /// Build from the [`Configuration`] bound in `registry`.
    pub fn from_registry(registry: &ServiceRegistry) -> Result<Self, ServiceError> {
        let configuration = registry.require::<Configuration>()?;
        Ok(Self::new(&configuration.settings().worker))
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

#[async_trait]
impl BackgroundTask for Worker {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn execute(&self, cancel: CancellationToken) -> anyhow::Result<()> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("Worker cancelled before delay elapsed");
            }
            _ = tokio::time::sleep(self.delay) => {
                tracing::debug!(delay_ms = self.delay.as_millis() as u64, "Worker finished");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HostConfig;
    use crate::services::ServiceCollection;
    use std::time::Instant;

    #[tokio::test]
    async fn test_completes_after_delay() {
        let worker = Worker::new(&WorkerConfig { delay_ms: 30 });
        let cancel = CancellationToken::new();

        let start = Instant::now();
        worker.execute(cancel.clone()).await.unwrap();

        assert!(start.elapsed() >= Duration::from_millis(30));
        assert!(!cancel.is_cancelled());
    }

    #[tokio::test]
    async fn test_already_cancelled_returns_promptly() {
        let worker = Worker::new(&WorkerConfig { delay_ms: 60_000 });
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = tokio::time::timeout(Duration::from_secs(1), worker.execute(cancel)).await;
        assert!(matches!(result, Ok(Ok(()))));
    }

    #[tokio::test]
    async fn test_cancel_during_wait() {
        let worker = Worker::new(&WorkerConfig { delay_ms: 60_000 });
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let result = tokio::time::timeout(Duration::from_secs(2), worker.execute(cancel)).await;
        assert!(matches!(result, Ok(Ok(()))));
    }

    #[test]
    fn test_from_registry_reads_configuration() {
        let mut settings = HostConfig::default();
        settings.worker.delay_ms = 250;
        let (registry, _) = ServiceCollection::new()
            .add(Configuration::from_settings(settings))
            .build()
            .unwrap();

        let worker = Worker::from_registry(&registry).unwrap();
        assert_eq!(worker.delay(), Duration::from_millis(250));
    }

    #[test]
    fn test_from_registry_requires_configuration() {
        let registry = ServiceRegistry::default();
        assert!(matches!(
            Worker::from_registry(&registry),
            Err(ServiceError::Missing(_))
        ));
    }
}
