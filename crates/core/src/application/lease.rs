// Lease Manager - Capture, Release and reconciliation over the task store

use crate::application::registry::ResourceRegistry;
use crate::domain::{LeasePolicy, Namespace, ReconcileStats, Task, TaskId, TaskStatus};
use crate::error::{AppError, Result};
use crate::port::{TaskRepository, TimeProvider};
use std::sync::Arc;
use tracing::{debug, info};

/// Grants time-bounded leases on idle tasks and takes them back
pub struct LeaseManager {
    task_repo: Arc<dyn TaskRepository>,
    namespaces: ResourceRegistry<Namespace>,
    time_provider: Arc<dyn TimeProvider>,
    policy: LeasePolicy,
}

impl LeaseManager {
    /// Create a new lease manager
    ///
    /// # Arguments
    /// * `task_repo` - Task repository (owns the atomic lease transitions)
    /// * `namespaces` - Namespace registry, used to reject unknown namespaces
    /// * `time_provider` - Clock for lease start and expiry
    /// * `policy` - Lease timeout, retry and batch defaults
    pub fn new(
        task_repo: Arc<dyn TaskRepository>,
        namespaces: ResourceRegistry<Namespace>,
        time_provider: Arc<dyn TimeProvider>,
        policy: LeasePolicy,
    ) -> Self {
        Self {
            task_repo,
            namespaces,
            time_provider,
            policy,
        }
    }

    pub fn policy(&self) -> &LeasePolicy {
        &self.policy
    }

    /// Lease up to `limit` idle tasks of a namespace.
    ///
    /// Stale leases in the namespace are reconciled first, in the same atomic
    /// unit. An empty result is not an error.
    ///
    /// # Errors
    /// - `AppError::Validation` if `limit` is 0
    /// - `AppError::NotFound` if the namespace does not exist
    pub async fn capture(&self, namespace_id: &str, limit: u32) -> Result<Vec<Task>> {
        if limit == 0 {
            return Err(AppError::Validation(
                "capture limit must be greater than 0".to_string(),
            ));
        }
        if !self.namespaces.exists(namespace_id).await? {
            return Err(AppError::NotFound(format!(
                "Namespace {} not found",
                namespace_id
            )));
        }

        let effective = limit.min(self.policy.max_capture_batch);
        if effective < limit {
            debug!(
                requested = limit,
                clamped = effective,
                "Capture limit clamped to max batch"
            );
        }

        let now = self.time_provider.now_millis();
        let tasks = self
            .task_repo
            .capture(namespace_id, effective, now, &self.policy)
            .await?;

        if !tasks.is_empty() {
            info!(
                namespace_id = %namespace_id,
                leased = tasks.len(),
                "Tasks captured"
            );
        }
        Ok(tasks)
    }

    /// Set `status` on every listed task in one atomic unit.
    ///
    /// Neither lease ownership nor the current status is checked.
    ///
    /// # Errors
    /// - `AppError::Validation` for an empty batch or a non-release status
    /// - `AppError::NotFound` if any ID is unknown; nothing is applied
    pub async fn release(&self, status: TaskStatus, ids: &[TaskId]) -> Result<u64> {
        if ids.is_empty() {
            return Err(AppError::Validation(
                "release requires at least one task id".to_string(),
            ));
        }
        if !status.is_release_target() {
            return Err(AppError::Validation(format!(
                "cannot release tasks as {}",
                status
            )));
        }

        let now = self.time_provider.now_millis();
        let released = self.task_repo.release(status, ids, now).await?;

        info!(status = %status, released, "Tasks released");
        Ok(released)
    }

    /// Sweep every namespace: expire, requeue, exhaust
    pub async fn reconcile_all(&self) -> Result<ReconcileStats> {
        let now = self.time_provider.now_millis();
        self.task_repo.reconcile(None, now, &self.policy).await
    }
}
