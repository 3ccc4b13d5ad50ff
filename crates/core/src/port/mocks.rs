// ============================================================================
// In-Memory Implementations for Testing
// ============================================================================
//
// One mutex guards tasks and registry records together, so every repository
// call is atomic the same way a single store transaction is.

use crate::domain::{
    LeasePolicy, Namespace, ReconcileStats, Resource, Task, TaskId, TaskStatus,
};
use crate::error::{AppError, Result};
use crate::port::{ResourceRepository, TaskRepository};
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};

struct StoredResource {
    kind: &'static str,
    id: String,
    body: serde_json::Value,
}

#[derive(Default)]
struct State {
    tasks: Vec<Task>,
    resources: Vec<StoredResource>,
}

/// In-memory task store + registry
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| AppError::Internal("in-memory store lock poisoned".to_string()))
    }
}

impl State {
    fn has_resource(&self, kind: &str, id: &str) -> bool {
        self.resources.iter().any(|r| r.kind == kind && r.id == id)
    }
}

#[async_trait]
impl TaskRepository for InMemoryStore {
    async fn insert(&self, task: &Task) -> Result<()> {
        let mut state = self.lock()?;
        if !state.has_resource(Namespace::KIND, &task.namespace_id) {
            return Err(AppError::NotFound(format!(
                "Namespace {} not found",
                task.namespace_id
            )));
        }
        if state.tasks.iter().any(|t| t.id == task.id) {
            return Err(AppError::Conflict(format!("Task {} already exists", task.id)));
        }
        state.tasks.push(task.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Task>> {
        let state = self.lock()?;
        Ok(state.tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn list_by_namespace(&self, namespace_id: &str) -> Result<Vec<Task>> {
        let state = self.lock()?;
        Ok(state
            .tasks
            .iter()
            .filter(|t| t.namespace_id == namespace_id)
            .cloned()
            .collect())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut state = self.lock()?;
        let before = state.tasks.len();
        state.tasks.retain(|t| t.id != id);
        Ok(state.tasks.len() < before)
    }

    async fn capture(
        &self,
        namespace_id: &str,
        limit: u32,
        now_millis: i64,
        policy: &LeasePolicy,
    ) -> Result<Vec<Task>> {
        let mut state = self.lock()?;
        let mut leased = Vec::new();

        for task in state
            .tasks
            .iter_mut()
            .filter(|t| t.namespace_id == namespace_id)
        {
            task.reconcile(now_millis, policy);
            if leased.len() < limit as usize && task.is_capturable() {
                task.capture(now_millis)?;
                leased.push(task.clone());
            }
        }

        Ok(leased)
    }

    async fn release(&self, status: TaskStatus, ids: &[TaskId], now_millis: i64) -> Result<u64> {
        let mut state = self.lock()?;

        if let Some(missing) = ids
            .iter()
            .find(|id| !state.tasks.iter().any(|t| &t.id == *id))
        {
            return Err(AppError::NotFound(format!("Task {} not found", missing)));
        }

        let mut released = 0;
        for id in ids {
            if let Some(task) = state.tasks.iter_mut().find(|t| &t.id == id) {
                task.release(status, now_millis)?;
                released += 1;
            }
        }
        Ok(released)
    }

    async fn reconcile(
        &self,
        namespace_id: Option<&str>,
        now_millis: i64,
        policy: &LeasePolicy,
    ) -> Result<ReconcileStats> {
        let mut state = self.lock()?;
        let mut stats = ReconcileStats::default();

        for task in state
            .tasks
            .iter_mut()
            .filter(|t| namespace_id.map_or(true, |ns| t.namespace_id == ns))
        {
            let outcome = task.reconcile(now_millis, policy);
            stats.expired += u64::from(outcome.expired);
            stats.requeued += u64::from(outcome.requeued);
            stats.exhausted += u64::from(outcome.exhausted);
        }

        Ok(stats)
    }
}

#[async_trait]
impl<R: Resource> ResourceRepository<R> for InMemoryStore {
    async fn insert(&self, resource: &R) -> Result<()> {
        let body = serde_json::to_value(resource)?;
        let mut state = self.lock()?;
        if state.has_resource(R::KIND, resource.id()) {
            return Err(AppError::Conflict(format!(
                "{} {} already exists",
                R::KIND,
                resource.id()
            )));
        }
        state.resources.push(StoredResource {
            kind: R::KIND,
            id: resource.id().to_string(),
            body,
        });
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<R>> {
        let state = self.lock()?;
        state
            .resources
            .iter()
            .find(|r| r.kind == R::KIND && r.id == id)
            .map(|r| serde_json::from_value(r.body.clone()).map_err(AppError::from))
            .transpose()
    }

    async fn list(&self) -> Result<Vec<R>> {
        let state = self.lock()?;
        state
            .resources
            .iter()
            .filter(|r| r.kind == R::KIND)
            .map(|r| serde_json::from_value(r.body.clone()).map_err(AppError::from))
            .collect()
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut state = self.lock()?;
        if !state.has_resource(R::KIND, id) {
            return Ok(false);
        }
        if R::KIND == Namespace::KIND && state.tasks.iter().any(|t| t.namespace_id == id) {
            return Err(AppError::Conflict(format!(
                "Namespace {} still owns tasks",
                id
            )));
        }
        state.resources.retain(|r| !(r.kind == R::KIND && r.id == id));
        Ok(true)
    }
}
