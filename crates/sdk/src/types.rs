//! SDK Request/Response Types
//!
//! Mirrors the JSON-RPC types of the daemon's api-rpc crate.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Task status as sent on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Idle,
    InProgress,
    Done,
    Failed,
    Timeout,
    Exhausted,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Idle => "idle",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
            TaskStatus::Failed => "failed",
            TaskStatus::Timeout => "timeout",
            TaskStatus::Exhausted => "exhausted",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "idle" => Ok(TaskStatus::Idle),
            "in_progress" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            "failed" => Ok(TaskStatus::Failed),
            "timeout" => Ok(TaskStatus::Timeout),
            "exhausted" => Ok(TaskStatus::Exhausted),
            other => Err(format!("unknown task status: {}", other)),
        }
    }
}

/// Stored task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub namespace_id: String,
    /// Lease duration in seconds (0 = server default)
    pub timeout: u32,
    pub retries_left: u32,
    /// Epoch ms of the last status change
    pub updated_at: i64,
    pub status: TaskStatus,
}

/// Task registration; unset fields take server defaults
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub namespace_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retries_left: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
}

impl NewTask {
    pub fn new(namespace_id: impl Into<String>) -> Self {
        Self {
            namespace_id: namespace_id.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_timeout(mut self, secs: u32) -> Self {
        self.timeout = Some(secs);
        self
    }

    pub fn with_retries(mut self, retries_left: u32) -> Self {
        self.retries_left = Some(retries_left);
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// Registry record served under `<KIND>.{register,list,read,delete}.v1`
pub trait RegistryRecord:
    Serialize + DeserializeOwned + Clone + Send + Sync + 'static
{
    const KIND: &'static str;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    pub id: String,
}

impl Namespace {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl RegistryRecord for Namespace {
    const KIND: &'static str = "namespace";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub tag_ids: Vec<String>,
}

impl RegistryRecord for Pool {
    const KIND: &'static str = "pool";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
}

impl RegistryRecord for Tag {
    const KIND: &'static str = "tag";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
    pub id: String,
    #[serde(default)]
    pub tag_ids: Vec<String>,
}

impl RegistryRecord for Worker {
    const KIND: &'static str = "worker";
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct IdRequest<'a> {
    pub id: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct NamespaceRequest<'a> {
    pub namespace_id: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CaptureRequest<'a> {
    pub namespace_id: &'a str,
    pub limit: u32,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ReleaseRequest<'a> {
    pub status: TaskStatus,
    pub task_ids: &'a [String],
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct Empty {}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct IdResponse {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ListResponse<T> {
    pub list: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DeleteResponse {
    pub id: String,
    pub deleted: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ReleaseResponse {
    pub released: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_task_omits_unset_fields() {
        let value = serde_json::to_value(NewTask::new("ns-1").with_retries(2)).unwrap();
        assert_eq!(value, json!({"namespace_id": "ns-1", "retries_left": 2}));
    }

    #[test]
    fn test_task_decodes_wire_shape() {
        let task: Task = serde_json::from_value(json!({
            "id": "t1",
            "namespace_id": "ns-1",
            "timeout": 10,
            "retries_left": 4,
            "updated_at": 1_700_000_000_000i64,
            "status": "in_progress"
        }))
        .unwrap();
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.retries_left, 4);
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!("done".parse::<TaskStatus>().unwrap(), TaskStatus::Done);
        assert!("DONE".parse::<TaskStatus>().is_err());
    }
}
