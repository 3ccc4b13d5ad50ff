// Task Repository Port (Interface)

use crate::domain::{LeasePolicy, ReconcileStats, Task, TaskId, TaskStatus};
use crate::error::Result;
use async_trait::async_trait;

/// Repository interface for Task persistence and the lease transitions.
///
/// `capture`, `release` and `reconcile` are each a single atomic unit:
/// concurrent callers never observe a half-applied batch.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Insert a new task
    ///
    /// # Errors
    /// - `AppError::Conflict` if the ID exists
    /// - `AppError::NotFound` if the namespace does not exist
    async fn insert(&self, task: &Task) -> Result<()>;

    /// Find task by ID
    async fn find_by_id(&self, id: &str) -> Result<Option<Task>>;

    /// All tasks of a namespace in insertion order
    async fn list_by_namespace(&self, namespace_id: &str) -> Result<Vec<Task>>;

    /// Delete task by ID regardless of status, returns false if it did not exist
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Reconcile the namespace, then lease up to `limit` idle tasks with budget left.
    ///
    /// Leased tasks come back post-update (`in_progress`, one retry spent,
    /// `updated_at = now_millis`) in insertion order.
    async fn capture(
        &self,
        namespace_id: &str,
        limit: u32,
        now_millis: i64,
        policy: &LeasePolicy,
    ) -> Result<Vec<Task>>;

    /// Set `status` on every task in `ids`, all or nothing.
    ///
    /// # Errors
    /// - `AppError::NotFound` naming the first missing ID; nothing is applied
    async fn release(&self, status: TaskStatus, ids: &[TaskId], now_millis: i64) -> Result<u64>;

    /// Expire stale leases, requeue and exhaust per policy.
    /// `namespace_id = None` sweeps every namespace.
    async fn reconcile(
        &self,
        namespace_id: Option<&str>,
        now_millis: i64,
        policy: &LeasePolicy,
    ) -> Result<ReconcileStats>;
}
