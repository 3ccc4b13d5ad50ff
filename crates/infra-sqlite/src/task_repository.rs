// SQLite TaskRepository Implementation

use async_trait::async_trait;
use ninhydrin_core::domain::{
    LeasePolicy, Namespace, ReconcileStats, Resource, Task, TaskId, TaskStatus,
};
use ninhydrin_core::error::{AppError, Result};
use ninhydrin_core::port::TaskRepository;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::debug;

use crate::error::map_sqlx_error;

const TASK_COLUMNS: &str = "seq, id, namespace_id, timeout, retries_left, updated_at, status";

pub struct SqliteTaskRepository {
    pool: SqlitePool,
}

impl SqliteTaskRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Expire, requeue, exhaust. Runs inside the caller's transaction and starts
/// with a write, so the transaction holds the write lock from the first statement.
async fn reconcile_in_tx(
    tx: &mut Transaction<'_, Sqlite>,
    namespace_id: Option<&str>,
    now_millis: i64,
    policy: &LeasePolicy,
) -> Result<ReconcileStats> {
    let mut stats = ReconcileStats::default();

    stats.expired = sqlx::query(
        r#"
        UPDATE tasks
        SET status = ?, updated_at = ?
        WHERE status = ?
          AND namespace_id = COALESCE(?, namespace_id)
          AND updated_at + (CASE WHEN timeout > 0 THEN timeout ELSE ? END) * 1000 <= ?
        "#,
    )
    .bind(TaskStatus::Timeout.as_str())
    .bind(now_millis)
    .bind(TaskStatus::InProgress.as_str())
    .bind(namespace_id)
    .bind(i64::from(policy.default_timeout_secs))
    .bind(now_millis)
    .execute(&mut **tx)
    .await
    .map_err(map_sqlx_error)?
    .rows_affected();

    if policy.requeue_on_failure {
        stats.requeued = sqlx::query(
            r#"
            UPDATE tasks
            SET status = ?, updated_at = ?
            WHERE status IN (?, ?)
              AND retries_left > 0
              AND namespace_id = COALESCE(?, namespace_id)
            "#,
        )
        .bind(TaskStatus::Idle.as_str())
        .bind(now_millis)
        .bind(TaskStatus::Failed.as_str())
        .bind(TaskStatus::Timeout.as_str())
        .bind(namespace_id)
        .execute(&mut **tx)
        .await
        .map_err(map_sqlx_error)?
        .rows_affected();
    }

    stats.exhausted = sqlx::query(
        r#"
        UPDATE tasks
        SET status = ?, updated_at = ?
        WHERE status = ?
          AND retries_left = 0
          AND namespace_id = COALESCE(?, namespace_id)
        "#,
    )
    .bind(TaskStatus::Exhausted.as_str())
    .bind(now_millis)
    .bind(TaskStatus::Idle.as_str())
    .bind(namespace_id)
    .execute(&mut **tx)
    .await
    .map_err(map_sqlx_error)?
    .rows_affected();

    Ok(stats)
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    async fn insert(&self, task: &Task) -> Result<()> {
        // Namespace check and insert in one statement
        let result = sqlx::query(
            r#"
            INSERT INTO tasks (id, namespace_id, timeout, retries_left, updated_at, status)
            SELECT ?, ?, ?, ?, ?, ?
            WHERE EXISTS (SELECT 1 FROM resources WHERE kind = ? AND id = ?)
            "#,
        )
        .bind(&task.id)
        .bind(&task.namespace_id)
        .bind(i64::from(task.timeout))
        .bind(i64::from(task.retries_left))
        .bind(task.updated_at)
        .bind(task.status.as_str())
        .bind(Namespace::KIND)
        .bind(&task.namespace_id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Namespace {} not found",
                task.namespace_id
            )));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Task>> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {} FROM tasks WHERE id = ?",
            TASK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(TaskRow::into_task).transpose()
    }

    async fn list_by_namespace(&self, namespace_id: &str) -> Result<Vec<Task>> {
        let rows: Vec<TaskRow> = sqlx::query_as(&format!(
            "SELECT {} FROM tasks WHERE namespace_id = ? ORDER BY seq ASC",
            TASK_COLUMNS
        ))
        .bind(namespace_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(TaskRow::into_task).collect()
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn capture(
        &self,
        namespace_id: &str,
        limit: u32,
        now_millis: i64,
        policy: &LeasePolicy,
    ) -> Result<Vec<Task>> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let stats = reconcile_in_tx(&mut tx, Some(namespace_id), now_millis, policy).await?;
        if !stats.is_empty() {
            debug!(
                namespace_id = %namespace_id,
                expired = stats.expired,
                requeued = stats.requeued,
                exhausted = stats.exhausted,
                "Reconciled before capture"
            );
        }

        // Select and mark in one statement: no other capture can see these rows as idle
        let mut rows: Vec<TaskRow> = sqlx::query_as(&format!(
            r#"
            UPDATE tasks
            SET status = ?, retries_left = retries_left - 1, updated_at = ?
            WHERE seq IN (
                SELECT seq FROM tasks
                WHERE namespace_id = ? AND status = ? AND retries_left > 0
                ORDER BY seq ASC
                LIMIT ?
            )
            RETURNING {}
            "#,
            TASK_COLUMNS
        ))
        .bind(TaskStatus::InProgress.as_str())
        .bind(now_millis)
        .bind(namespace_id)
        .bind(TaskStatus::Idle.as_str())
        .bind(i64::from(limit))
        .fetch_all(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;

        // RETURNING order is unspecified
        rows.sort_by_key(|row| row.seq);
        rows.into_iter().map(TaskRow::into_task).collect()
    }

    async fn release(&self, status: TaskStatus, ids: &[TaskId], now_millis: i64) -> Result<u64> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        let mut released = 0;

        for id in ids {
            let affected = sqlx::query("UPDATE tasks SET status = ?, updated_at = ? WHERE id = ?")
                .bind(status.as_str())
                .bind(now_millis)
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?
                .rows_affected();

            if affected == 0 {
                tx.rollback().await.map_err(map_sqlx_error)?;
                return Err(AppError::NotFound(format!("Task {} not found", id)));
            }
            released += affected;
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(released)
    }

    async fn reconcile(
        &self,
        namespace_id: Option<&str>,
        now_millis: i64,
        policy: &LeasePolicy,
    ) -> Result<ReconcileStats> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        let stats = reconcile_in_tx(&mut tx, namespace_id, now_millis, policy).await?;
        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(stats)
    }
}

/// SQLite row representation
#[derive(Debug, sqlx::FromRow)]
struct TaskRow {
    seq: i64,
    id: String,
    namespace_id: String,
    timeout: i64,
    retries_left: i64,
    updated_at: i64,
    status: String,
}

impl TaskRow {
    fn into_task(self) -> Result<Task> {
        let status = self.status.parse::<TaskStatus>()?;
        let timeout = column_u32("timeout", self.timeout)?;
        let retries_left = column_u32("retries_left", self.retries_left)?;

        Ok(Task {
            id: self.id,
            namespace_id: self.namespace_id,
            timeout,
            retries_left,
            updated_at: self.updated_at,
            status,
        })
    }
}

fn column_u32(column: &str, value: i64) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| AppError::Database(format!("Column {} out of range: {}", column, value)))
}
