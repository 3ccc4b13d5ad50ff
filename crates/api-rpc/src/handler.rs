//! RPC Method Handlers
//!
//! Thin adapters from wire types to the application services.

use crate::error::to_rpc_error;
use crate::types::{
    CaptureRequest, DeleteResponse, IdRequest, IdResponse, ListResponse, NamespaceRequest,
    RegisterTaskRequest, ReleaseRequest, ReleaseResponse,
};
use jsonrpsee::types::ErrorObjectOwned;
use ninhydrin_core::application::{LeaseManager, ResourceRegistry, TaskService};
use ninhydrin_core::domain::{Namespace, Pool, Resource, Tag, Task, Worker};
use std::sync::Arc;

pub type RpcResult<T> = Result<T, ErrorObjectOwned>;

/// Resolves the registry that backs a given record kind
pub trait RegistryAccess<R: Resource> {
    fn registry(&self) -> &ResourceRegistry<R>;
}

/// RPC Handler with injected dependencies
pub struct RpcHandler {
    leases: Arc<LeaseManager>,
    tasks: Arc<TaskService>,
    namespaces: ResourceRegistry<Namespace>,
    pools: ResourceRegistry<Pool>,
    tags: ResourceRegistry<Tag>,
    workers: ResourceRegistry<Worker>,
}

impl RegistryAccess<Namespace> for RpcHandler {
    fn registry(&self) -> &ResourceRegistry<Namespace> {
        &self.namespaces
    }
}

impl RegistryAccess<Pool> for RpcHandler {
    fn registry(&self) -> &ResourceRegistry<Pool> {
        &self.pools
    }
}

impl RegistryAccess<Tag> for RpcHandler {
    fn registry(&self) -> &ResourceRegistry<Tag> {
        &self.tags
    }
}

impl RegistryAccess<Worker> for RpcHandler {
    fn registry(&self) -> &ResourceRegistry<Worker> {
        &self.workers
    }
}

impl RpcHandler {
    pub fn new(
        leases: Arc<LeaseManager>,
        tasks: Arc<TaskService>,
        namespaces: ResourceRegistry<Namespace>,
        pools: ResourceRegistry<Pool>,
        tags: ResourceRegistry<Tag>,
        workers: ResourceRegistry<Worker>,
    ) -> Self {
        Self {
            leases,
            tasks,
            namespaces,
            pools,
            tags,
            workers,
        }
    }

    /// `<kind>.register.v1`
    pub async fn register<R: Resource>(&self, resource: R) -> RpcResult<IdResponse>
    where
        Self: RegistryAccess<R>,
    {
        let id = <Self as RegistryAccess<R>>::registry(self)
            .register(resource)
            .await
            .map_err(to_rpc_error)?;
        Ok(IdResponse { id })
    }

    /// `<kind>.list.v1`
    pub async fn list<R: Resource>(&self) -> RpcResult<ListResponse<R>>
    where
        Self: RegistryAccess<R>,
    {
        let list = <Self as RegistryAccess<R>>::registry(self)
            .list()
            .await
            .map_err(to_rpc_error)?;
        Ok(ListResponse { list })
    }

    /// `<kind>.read.v1`
    pub async fn read<R: Resource>(&self, req: IdRequest) -> RpcResult<R>
    where
        Self: RegistryAccess<R>,
    {
        <Self as RegistryAccess<R>>::registry(self)
            .read(&req.id)
            .await
            .map_err(to_rpc_error)
    }

    /// `<kind>.delete.v1`
    pub async fn delete<R: Resource>(&self, req: IdRequest) -> RpcResult<DeleteResponse>
    where
        Self: RegistryAccess<R>,
    {
        <Self as RegistryAccess<R>>::registry(self)
            .delete(&req.id)
            .await
            .map_err(to_rpc_error)?;
        Ok(DeleteResponse {
            id: req.id,
            deleted: true,
        })
    }

    /// task.register.v1
    pub async fn register_task(&self, req: RegisterTaskRequest) -> RpcResult<IdResponse> {
        let id = self.tasks.register(req).await.map_err(to_rpc_error)?;
        Ok(IdResponse { id })
    }

    /// task.list.v1
    pub async fn list_tasks(&self, req: NamespaceRequest) -> RpcResult<ListResponse<Task>> {
        let list = self
            .tasks
            .list(&req.namespace_id)
            .await
            .map_err(to_rpc_error)?;
        Ok(ListResponse { list })
    }

    /// task.read.v1
    pub async fn read_task(&self, req: IdRequest) -> RpcResult<Task> {
        self.tasks.read(&req.id).await.map_err(to_rpc_error)
    }

    /// task.delete.v1
    pub async fn delete_task(&self, req: IdRequest) -> RpcResult<DeleteResponse> {
        self.tasks.delete(&req.id).await.map_err(to_rpc_error)?;
        Ok(DeleteResponse {
            id: req.id,
            deleted: true,
        })
    }

    /// task.capture.v1
    pub async fn capture(&self, req: CaptureRequest) -> RpcResult<ListResponse<Task>> {
        let list = self
            .leases
            .capture(&req.namespace_id, req.limit)
            .await
            .map_err(to_rpc_error)?;
        Ok(ListResponse { list })
    }

    /// task.release.v1
    pub async fn release(&self, req: ReleaseRequest) -> RpcResult<ReleaseResponse> {
        let released = self
            .leases
            .release(req.status, &req.task_ids)
            .await
            .map_err(to_rpc_error)?;
        Ok(ReleaseResponse { released })
    }
}

/// Handler over the in-memory store with a fixed clock at t=1000
#[cfg(test)]
pub(crate) fn in_memory_handler() -> RpcHandler {
    use ninhydrin_core::domain::LeasePolicy;
    use ninhydrin_core::port::mocks::InMemoryStore;
    use ninhydrin_core::port::{ManualTimeProvider, SequentialIdProvider};

    let store = Arc::new(InMemoryStore::new());
    let clock = Arc::new(ManualTimeProvider::new(1_000));
    let policy = LeasePolicy::default();
    let namespaces = ResourceRegistry::<Namespace>::new(store.clone());

    let tasks = Arc::new(TaskService::new(
        store.clone(),
        namespaces.clone(),
        Arc::new(SequentialIdProvider::new("task")),
        clock.clone(),
        policy.clone(),
    ));
    let leases = Arc::new(LeaseManager::new(
        store.clone(),
        namespaces.clone(),
        clock,
        policy,
    ));

    RpcHandler::new(
        leases,
        tasks,
        namespaces,
        ResourceRegistry::new(store.clone()),
        ResourceRegistry::new(store.clone()),
        ResourceRegistry::new(store),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::code;
    use ninhydrin_core::domain::TaskStatus;

    #[tokio::test]
    async fn test_registry_methods() {
        let handler = in_memory_handler();

        let resp = handler.register(Namespace::new("ns-1")).await.unwrap();
        assert_eq!(resp.id, "ns-1");

        let list = handler.list::<Namespace>().await.unwrap();
        assert_eq!(list.list, vec![Namespace::new("ns-1")]);
        assert!(handler.list::<Tag>().await.unwrap().list.is_empty());

        let err = handler
            .read::<Pool>(IdRequest {
                id: "ns-1".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), code::NOT_FOUND);

        let deleted = handler
            .delete::<Namespace>(IdRequest {
                id: "ns-1".to_string(),
            })
            .await
            .unwrap();
        assert!(deleted.deleted);
    }

    #[tokio::test]
    async fn test_task_lifecycle_through_handler() {
        let handler = in_memory_handler();
        handler.register(Namespace::new("ns-1")).await.unwrap();

        let id = handler
            .register_task(RegisterTaskRequest {
                namespace_id: "ns-1".to_string(),
                timeout: Some(10),
                retries_left: Some(5),
                ..Default::default()
            })
            .await
            .unwrap()
            .id;
        assert_eq!(id, "task-1");

        let captured = handler
            .capture(CaptureRequest {
                namespace_id: "ns-1".to_string(),
                limit: 10,
            })
            .await
            .unwrap();
        assert_eq!(captured.list.len(), 1);
        assert_eq!(captured.list[0].retries_left, 4);

        let released = handler
            .release(ReleaseRequest {
                status: TaskStatus::Done,
                task_ids: vec![id.clone()],
            })
            .await
            .unwrap();
        assert_eq!(released.released, 1);

        let task = handler.read_task(IdRequest { id: id.clone() }).await.unwrap();
        assert_eq!(task.status, TaskStatus::Done);

        handler.delete_task(IdRequest { id }).await.unwrap();
        let listed = handler
            .list_tasks(NamespaceRequest {
                namespace_id: "ns-1".to_string(),
            })
            .await
            .unwrap();
        assert!(listed.list.is_empty());
    }

    #[tokio::test]
    async fn test_errors_carry_codes() {
        let handler = in_memory_handler();
        handler.register(Namespace::new("ns-1")).await.unwrap();

        let err = handler.register(Namespace::new("ns-1")).await.unwrap_err();
        assert_eq!(err.code(), code::CONFLICT);

        let err = handler
            .capture(CaptureRequest {
                namespace_id: "ns-1".to_string(),
                limit: 0,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), code::VALIDATION_ERROR);

        let err = handler
            .release(ReleaseRequest {
                status: TaskStatus::Done,
                task_ids: vec!["ghost".to_string()],
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), code::NOT_FOUND);
    }
}
