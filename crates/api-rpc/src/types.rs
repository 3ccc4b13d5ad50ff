//! RPC Request/Response Types
//!
//! Method names and the parameter/result shapes of every method.

use ninhydrin_core::domain::{Namespace, Pool, Tag, TaskStatus, Worker};
use serde::{Deserialize, Serialize};

pub use ninhydrin_core::application::RegisterTaskRequest;

/// Method names for one registry kind
#[derive(Debug, Clone, Copy)]
pub struct RegistryMethods {
    pub register: &'static str,
    pub list: &'static str,
    pub read: &'static str,
    pub delete: &'static str,
}

/// Registry kinds that get a `<kind>.{register,list,read,delete}.v1` method set
pub trait RegistryMethodSet {
    const METHODS: RegistryMethods;
}

impl RegistryMethodSet for Namespace {
    const METHODS: RegistryMethods = RegistryMethods {
        register: "namespace.register.v1",
        list: "namespace.list.v1",
        read: "namespace.read.v1",
        delete: "namespace.delete.v1",
    };
}

impl RegistryMethodSet for Pool {
    const METHODS: RegistryMethods = RegistryMethods {
        register: "pool.register.v1",
        list: "pool.list.v1",
        read: "pool.read.v1",
        delete: "pool.delete.v1",
    };
}

impl RegistryMethodSet for Tag {
    const METHODS: RegistryMethods = RegistryMethods {
        register: "tag.register.v1",
        list: "tag.list.v1",
        read: "tag.read.v1",
        delete: "tag.delete.v1",
    };
}

impl RegistryMethodSet for Worker {
    const METHODS: RegistryMethods = RegistryMethods {
        register: "worker.register.v1",
        list: "worker.list.v1",
        read: "worker.read.v1",
        delete: "worker.delete.v1",
    };
}

/// Task method names
pub mod task_method {
    pub const REGISTER: &str = "task.register.v1";
    pub const LIST: &str = "task.list.v1";
    pub const READ: &str = "task.read.v1";
    pub const DELETE: &str = "task.delete.v1";
    pub const CAPTURE: &str = "task.capture.v1";
    pub const RELEASE: &str = "task.release.v1";
}

/// `*.read.v1`, `*.delete.v1`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdRequest {
    pub id: String,
}

/// `task.list.v1`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamespaceRequest {
    pub namespace_id: String,
}

/// `task.capture.v1`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureRequest {
    pub namespace_id: String,
    pub limit: u32,
}

/// `task.release.v1`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseRequest {
    pub status: TaskStatus,
    pub task_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdResponse {
    pub id: String,
}

/// List results are wrapped: `{"list": [...]}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub list: Vec<T>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub id: String,
    pub deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseResponse {
    pub released: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_release_request_parses_status_string() {
        let req: ReleaseRequest =
            serde_json::from_value(json!({"status": "done", "task_ids": ["a", "b"]})).unwrap();
        assert_eq!(req.status, TaskStatus::Done);
        assert_eq!(req.task_ids, vec!["a", "b"]);

        assert!(serde_json::from_value::<ReleaseRequest>(
            json!({"status": "finished", "task_ids": ["a"]})
        )
        .is_err());
    }

    #[test]
    fn test_list_response_shape() {
        let value = serde_json::to_value(ListResponse {
            list: vec![Namespace::new("ns-1")],
        })
        .unwrap();
        assert_eq!(value, json!({"list": [{"id": "ns-1"}]}));
    }
}
