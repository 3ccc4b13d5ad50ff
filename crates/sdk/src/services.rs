//! Service handles: one per registry kind plus tasks

use crate::client::NinhydrinClient;
use crate::error::{Result, SdkError};
use crate::types::{
    CaptureRequest, DeleteResponse, Empty, IdRequest, IdResponse, ListResponse,
    NamespaceRequest, NewTask, RegistryRecord, ReleaseRequest, ReleaseResponse, Task, TaskStatus,
};
use std::marker::PhantomData;

/// Register / List / Read / Delete for one registry kind
pub struct RegistryService<T> {
    client: NinhydrinClient,
    _kind: PhantomData<fn() -> T>,
}

impl<T: RegistryRecord> RegistryService<T> {
    pub(crate) fn new(client: NinhydrinClient) -> Self {
        Self {
            client,
            _kind: PhantomData,
        }
    }

    fn method(op: &str) -> String {
        format!("{}.{}.v1", T::KIND, op)
    }

    /// Returns the registered ID
    pub async fn register(&self, record: &T) -> Result<String> {
        let resp: IdResponse = self.client.call(&Self::method("register"), record).await?;
        Ok(resp.id)
    }

    pub async fn list(&self) -> Result<Vec<T>> {
        let resp: ListResponse<T> = self.client.call(&Self::method("list"), &Empty {}).await?;
        Ok(resp.list)
    }

    pub async fn read(&self, id: &str) -> Result<T> {
        self.client
            .call(&Self::method("read"), &IdRequest { id })
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let resp: DeleteResponse = self
            .client
            .call(&Self::method("delete"), &IdRequest { id })
            .await?;
        if !resp.deleted {
            return Err(SdkError::NotFound(resp.id));
        }
        Ok(())
    }
}

/// Task store and lease operations
pub struct TaskService {
    client: NinhydrinClient,
}

impl TaskService {
    pub(crate) fn new(client: NinhydrinClient) -> Self {
        Self { client }
    }

    /// Returns the task ID (server-generated when `task.id` is unset)
    pub async fn register(&self, task: &NewTask) -> Result<String> {
        let resp: IdResponse = self.client.call("task.register.v1", task).await?;
        Ok(resp.id)
    }

    /// All tasks of a namespace in insertion order
    pub async fn list(&self, namespace_id: &str) -> Result<Vec<Task>> {
        let resp: ListResponse<Task> = self
            .client
            .call("task.list.v1", &NamespaceRequest { namespace_id })
            .await?;
        Ok(resp.list)
    }

    pub async fn read(&self, id: &str) -> Result<Task> {
        self.client.call("task.read.v1", &IdRequest { id }).await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let resp: DeleteResponse = self
            .client
            .call("task.delete.v1", &IdRequest { id })
            .await?;
        if !resp.deleted {
            return Err(SdkError::NotFound(resp.id));
        }
        Ok(())
    }

    /// Lease up to `limit` idle tasks. An empty batch is not an error.
    pub async fn capture(&self, namespace_id: &str, limit: u32) -> Result<Vec<Task>> {
        if limit == 0 {
            return Err(SdkError::InvalidArgument(
                "capture limit must be greater than 0".to_string(),
            ));
        }
        let resp: ListResponse<Task> = self
            .client
            .call(
                "task.capture.v1",
                &CaptureRequest {
                    namespace_id,
                    limit,
                },
            )
            .await?;
        Ok(resp.list)
    }

    /// Set `status` on every task in `task_ids`, all or nothing
    pub async fn release(&self, status: TaskStatus, task_ids: &[String]) -> Result<u64> {
        if task_ids.is_empty() {
            return Err(SdkError::InvalidArgument(
                "release requires at least one task id".to_string(),
            ));
        }
        let resp: ReleaseResponse = self
            .client
            .call("task.release.v1", &ReleaseRequest { status, task_ids })
            .await?;
        Ok(resp.released)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Pool;
    use crate::ClientConfig;
    use std::time::Duration;

    // Port 9 (discard) is never served in the test environment; a request
    // reaching the network would fail with a transport error instead.
    fn offline_client() -> NinhydrinClient {
        NinhydrinClient::new(
            ClientConfig::new("http://127.0.0.1:9").with_request_timeout(Duration::from_millis(200)),
        )
        .unwrap()
    }

    #[test]
    fn test_method_names() {
        assert_eq!(RegistryService::<Pool>::method("list"), "pool.list.v1");
    }

    #[tokio::test]
    async fn test_capture_zero_limit_fails_locally() {
        let err = offline_client().tasks().capture("ns-1", 0).await.unwrap_err();
        assert!(matches!(err, SdkError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_empty_release_fails_locally() {
        let err = offline_client()
            .tasks()
            .release(TaskStatus::Done, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, SdkError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        let err = offline_client().namespaces().list().await.unwrap_err();
        assert!(matches!(err, SdkError::Transport(_)), "{err:?}");
    }
}
