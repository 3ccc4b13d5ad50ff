// Task Service - Task Store use cases (register, list, read, delete)

pub mod register;

pub use register::RegisterTaskRequest;

use crate::application::registry::ResourceRegistry;
use crate::domain::{LeasePolicy, Namespace, Task};
use crate::error::{AppError, Result};
use crate::port::{IdProvider, TaskRepository, TimeProvider};
use std::sync::Arc;
use tracing::info;

/// Task Service
pub struct TaskService {
    task_repo: Arc<dyn TaskRepository>,
    namespaces: ResourceRegistry<Namespace>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
    policy: LeasePolicy,
}

impl TaskService {
    pub fn new(
        task_repo: Arc<dyn TaskRepository>,
        namespaces: ResourceRegistry<Namespace>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
        policy: LeasePolicy,
    ) -> Self {
        Self {
            task_repo,
            namespaces,
            id_provider,
            time_provider,
            policy,
        }
    }

    /// Register a new task, returns its ID
    pub async fn register(&self, req: RegisterTaskRequest) -> Result<String> {
        let namespace_id = req.namespace_id.clone();
        let id = register::execute(
            self.task_repo.as_ref(),
            self.id_provider.as_ref(),
            self.time_provider.as_ref(),
            &self.policy,
            req,
        )
        .await?;

        info!(task_id = %id, namespace_id = %namespace_id, "Task registered");
        Ok(id)
    }

    /// All tasks of a namespace in insertion order
    pub async fn list(&self, namespace_id: &str) -> Result<Vec<Task>> {
        if !self.namespaces.exists(namespace_id).await? {
            return Err(AppError::NotFound(format!(
                "Namespace {} not found",
                namespace_id
            )));
        }
        self.task_repo.list_by_namespace(namespace_id).await
    }

    pub async fn read(&self, id: &str) -> Result<Task> {
        self.task_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Task {} not found", id)))
    }

    /// Delete regardless of status
    pub async fn delete(&self, id: &str) -> Result<()> {
        if !self.task_repo.delete(id).await? {
            return Err(AppError::NotFound(format!("Task {} not found", id)));
        }
        info!(task_id = %id, "Task deleted");
        Ok(())
    }
}
