// SQLite ResourceRepository Implementation
//
// Every registry kind lives in `resources`, keyed by (kind, id), with the
// record serialized as JSON in `body`.

use async_trait::async_trait;
use ninhydrin_core::domain::{Namespace, Resource};
use ninhydrin_core::error::{AppError, Result};
use ninhydrin_core::port::ResourceRepository;
use sqlx::SqlitePool;

use crate::error::map_sqlx_error;

pub struct SqliteRegistryRepository {
    pool: SqlitePool,
}

impl SqliteRegistryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl<R: Resource> ResourceRepository<R> for SqliteRegistryRepository {
    async fn insert(&self, resource: &R) -> Result<()> {
        let body = serde_json::to_string(resource)?;

        sqlx::query("INSERT INTO resources (kind, id, body) VALUES (?, ?, ?)")
            .bind(R::KIND)
            .bind(resource.id())
            .bind(body)
            .execute(&self.pool)
            .await
            .map_err(|e| match map_sqlx_error(e) {
                AppError::Conflict(_) => AppError::Conflict(format!(
                    "{} {} already exists",
                    R::KIND,
                    resource.id()
                )),
                other => other,
            })?;

        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<R>> {
        let body: Option<String> =
            sqlx::query_scalar("SELECT body FROM resources WHERE kind = ? AND id = ?")
                .bind(R::KIND)
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        body.map(|b| serde_json::from_str(&b).map_err(AppError::from))
            .transpose()
    }

    async fn list(&self) -> Result<Vec<R>> {
        let bodies: Vec<String> =
            sqlx::query_scalar("SELECT body FROM resources WHERE kind = ? ORDER BY seq ASC")
                .bind(R::KIND)
                .fetch_all(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        bodies
            .iter()
            .map(|b| serde_json::from_str(b).map_err(AppError::from))
            .collect()
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        // A namespace that still owns tasks is never deleted
        let deleted = sqlx::query(
            r#"
            DELETE FROM resources
            WHERE kind = ? AND id = ?
              AND (kind <> ? OR NOT EXISTS (SELECT 1 FROM tasks WHERE namespace_id = resources.id))
            "#,
        )
        .bind(R::KIND)
        .bind(id)
        .bind(Namespace::KIND)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?
        .rows_affected();

        if deleted > 0 {
            tx.commit().await.map_err(map_sqlx_error)?;
            return Ok(true);
        }

        let exists: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM resources WHERE kind = ? AND id = ?")
                .bind(R::KIND)
                .bind(id)
                .fetch_one(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
        tx.rollback().await.map_err(map_sqlx_error)?;

        if exists > 0 {
            return Err(AppError::Conflict(format!(
                "Namespace {} still owns tasks",
                id
            )));
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, run_migrations, SqliteTaskRepository};
    use ninhydrin_core::domain::{Pool, Tag, Task, Worker};
    use ninhydrin_core::port::TaskRepository;

    async fn setup_test_db() -> (SqliteRegistryRepository, SqliteTaskRepository) {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        (
            SqliteRegistryRepository::new(pool.clone()),
            SqliteTaskRepository::new(pool),
        )
    }

    #[tokio::test]
    async fn test_insert_find_list() {
        let (repo, _) = setup_test_db().await;
        let gpu = Pool {
            id: "gpu".to_string(),
            description: Some("GPU boxes".to_string()),
            tag_ids: vec!["cuda".to_string(), "a100".to_string()],
        };

        repo.insert(&gpu).await.unwrap();
        repo.insert(&Tag {
            id: "cuda".to_string(),
        })
        .await
        .unwrap();

        let found = ResourceRepository::<Pool>::find_by_id(&repo, "gpu").await.unwrap();
        assert_eq!(found, Some(gpu.clone()));

        let pools = ResourceRepository::<Pool>::list(&repo).await.unwrap();
        assert_eq!(pools, vec![gpu]);
        let workers = ResourceRepository::<Worker>::list(&repo).await.unwrap();
        assert!(workers.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_conflicts_within_kind_only() {
        let (repo, _) = setup_test_db().await;
        repo.insert(&Namespace::new("shared")).await.unwrap();

        let err = repo.insert(&Namespace::new("shared")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        repo.insert(&Worker {
            id: "shared".to_string(),
            tag_ids: vec![],
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_list_keeps_insertion_order() {
        let (repo, _) = setup_test_db().await;
        for id in ["c", "a", "b"] {
            repo.insert(&Namespace::new(id)).await.unwrap();
        }

        let ids: Vec<String> = ResourceRepository::<Namespace>::list(&repo)
            .await
            .unwrap()
            .into_iter()
            .map(|ns| ns.id)
            .collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[tokio::test]
    async fn test_namespace_delete_restricted_by_tasks() {
        let (repo, tasks) = setup_test_db().await;
        repo.insert(&Namespace::new("ns-1")).await.unwrap();
        tasks
            .insert(&Task::new("t1", "ns-1", 10, 1, 0))
            .await
            .unwrap();

        let err = ResourceRepository::<Namespace>::delete(&repo, "ns-1")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        tasks.delete("t1").await.unwrap();
        assert!(ResourceRepository::<Namespace>::delete(&repo, "ns-1")
            .await
            .unwrap());
        assert!(!ResourceRepository::<Namespace>::delete(&repo, "ns-1")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_delete_other_kind_ignores_tasks() {
        let (repo, tasks) = setup_test_db().await;
        repo.insert(&Namespace::new("x")).await.unwrap();
        repo.insert(&Tag {
            id: "x".to_string(),
        })
        .await
        .unwrap();
        tasks.insert(&Task::new("t1", "x", 10, 1, 0)).await.unwrap();

        assert!(ResourceRepository::<Tag>::delete(&repo, "x").await.unwrap());
        let ns = ResourceRepository::<Namespace>::find_by_id(&repo, "x")
            .await
            .unwrap();
        assert!(ns.is_some());
    }
}
