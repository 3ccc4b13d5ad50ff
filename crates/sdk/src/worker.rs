//! Capture → handle → release loop for worker processes

use crate::client::NinhydrinClient;
use crate::error::{Result, SdkError};
use crate::types::{Task, TaskStatus};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const DEFAULT_BATCH_SIZE: u32 = 10;
const DEFAULT_IDLE_INTERVAL: Duration = Duration::from_secs(1);
const DEFAULT_ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Work performed for one leased task
///
/// `Ok` releases the task as `done`, `Err` as `failed`. A handler that runs
/// past the task timeout loses the lease; the server turns it into `timeout`.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn handle(&self, task: &Task) -> anyhow::Result<()>;
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub namespace_id: String,
    /// Capture limit per round
    pub batch_size: u32,
    /// Pause after an empty capture
    pub idle_interval: Duration,
    /// Pause after a failed round trip
    pub error_backoff: Duration,
}

impl WorkerConfig {
    pub fn new(namespace_id: impl Into<String>) -> Self {
        Self {
            namespace_id: namespace_id.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            idle_interval: DEFAULT_IDLE_INTERVAL,
            error_backoff: DEFAULT_ERROR_BACKOFF,
        }
    }

    pub fn with_batch_size(mut self, batch_size: u32) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_idle_interval(mut self, interval: Duration) -> Self {
        self.idle_interval = interval;
        self
    }

    pub fn with_error_backoff(mut self, backoff: Duration) -> Self {
        self.error_backoff = backoff;
        self
    }
}

/// Outcome of one capture round
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub captured: usize,
    pub done: u64,
    pub failed: u64,
}

pub struct TaskWorker {
    client: NinhydrinClient,
    handler: Arc<dyn TaskHandler>,
    config: WorkerConfig,
}

impl TaskWorker {
    pub fn new(
        client: NinhydrinClient,
        handler: Arc<dyn TaskHandler>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            client,
            handler,
            config,
        }
    }

    /// Capture one batch, run the handler on each task in order, then
    /// release the successes and the failures as two batches.
    pub async fn run_once(&self) -> Result<WorkerStats> {
        let tasks = self
            .client
            .tasks()
            .capture(&self.config.namespace_id, self.config.batch_size)
            .await?;

        let mut stats = WorkerStats {
            captured: tasks.len(),
            ..Default::default()
        };
        if tasks.is_empty() {
            return Ok(stats);
        }

        let mut done = Vec::new();
        let mut failed = Vec::new();
        for task in tasks {
            match self.handler.handle(&task).await {
                Ok(()) => done.push(task.id),
                Err(e) => {
                    warn!(task_id = %task.id, error = %e, "Task handler failed");
                    failed.push(task.id);
                }
            }
        }

        // Both groups are always attempted; the first error wins
        let done_result = self.release_group(TaskStatus::Done, &done).await;
        let failed_result = self.release_group(TaskStatus::Failed, &failed).await;
        if let (Err(_), Err(e)) = (&done_result, &failed_result) {
            warn!(error = %e, "Releasing failed tasks also failed");
        }
        stats.done = done_result?;
        stats.failed = failed_result?;

        debug!(
            namespace_id = %self.config.namespace_id,
            captured = stats.captured,
            done = stats.done,
            failed = stats.failed,
            "Worker round finished"
        );
        Ok(stats)
    }

    /// Release `ids` as `status`. A task deleted mid-round fails the whole
    /// batch with `NotFound`; the rest are then released one at a time and
    /// the missing ones skipped.
    async fn release_group(&self, status: TaskStatus, ids: &[String]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let tasks = self.client.tasks();
        match tasks.release(status, ids).await {
            Err(SdkError::NotFound(message)) => {
                warn!(
                    %status,
                    error = %message,
                    "Batch release hit a missing task, retrying per task"
                );
                let mut released = 0;
                for id in ids {
                    match tasks.release(status, std::slice::from_ref(id)).await {
                        Ok(n) => released += n,
                        Err(SdkError::NotFound(_)) => {
                            debug!(task_id = %id, "Task removed before release")
                        }
                        Err(e) => return Err(e),
                    }
                }
                Ok(released)
            }
            other => other,
        }
    }

    /// Loop until `shutdown` resolves. Errors are logged and retried after
    /// `error_backoff`; a round in flight always finishes first.
    pub async fn run(self, shutdown: impl Future<Output = ()>) {
        tokio::pin!(shutdown);
        info!(namespace_id = %self.config.namespace_id, "Worker started");

        loop {
            let pause = match self.run_once().await {
                Ok(stats) if stats.captured > 0 => Duration::ZERO,
                Ok(_) => self.config.idle_interval,
                Err(e) => {
                    warn!(error = %e, "Worker round failed");
                    self.config.error_backoff
                }
            };

            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(pause) => {}
            }
        }

        info!(namespace_id = %self.config.namespace_id, "Worker stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ClientConfig;

    struct Noop;

    #[async_trait]
    impl TaskHandler for Noop {
        async fn handle(&self, _task: &Task) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_worker_config_defaults() {
        let config = WorkerConfig::new("emails").with_batch_size(50);
        assert_eq!(config.batch_size, 50);
        assert_eq!(config.idle_interval, DEFAULT_IDLE_INTERVAL);
        assert_eq!(config.error_backoff, DEFAULT_ERROR_BACKOFF);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown_while_server_is_down() {
        let client = NinhydrinClient::new(
            ClientConfig::new("http://127.0.0.1:9")
                .with_request_timeout(Duration::from_millis(100)),
        )
        .unwrap();
        let worker = TaskWorker::new(
            client,
            Arc::new(Noop),
            WorkerConfig::new("ns-1").with_error_backoff(Duration::from_secs(60)),
        );

        // Already-resolved shutdown: exits after the first (failing) round
        tokio::time::timeout(Duration::from_secs(5), worker.run(async {}))
            .await
            .unwrap();
    }
}
