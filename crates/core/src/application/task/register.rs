// Register Task Use Case

use crate::application::registry::validate_id;
use crate::domain::{LeasePolicy, Namespace, Resource, Task, TaskStatus};
use crate::error::{AppError, Result};
use crate::port::{IdProvider, TaskRepository, TimeProvider};
use serde::{Deserialize, Serialize};

/// Register request; omitted fields fall back to server defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterTaskRequest {
    /// Empty or absent: generated by the IdProvider
    #[serde(default)]
    pub id: Option<String>,
    pub namespace_id: String,
    /// Lease duration in seconds (0 or absent = server default at lease time)
    #[serde(default)]
    pub timeout: Option<u32>,
    #[serde(default)]
    pub retries_left: Option<u32>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
}

/// Validate register request fields
pub fn validate_request(req: &RegisterTaskRequest) -> Result<()> {
    validate_id(Namespace::KIND, &req.namespace_id)?;

    if let Some(id) = req.id.as_deref().filter(|id| !id.is_empty()) {
        validate_id("task", id)?;
    }

    // A lease only ever starts through Capture
    if req.status == Some(TaskStatus::InProgress) {
        return Err(AppError::Validation(
            "task cannot be registered as in_progress".to_string(),
        ));
    }

    Ok(())
}

/// Execute register use case
///
/// # Arguments
///
/// * `task_repo` - Task repository
/// * `id_provider` - ID generator for tasks registered without an ID
/// * `time_provider` - Time provider (injected for determinism)
/// * `policy` - Supplies the default retry budget
/// * `req` - Register request
pub async fn execute(
    task_repo: &dyn TaskRepository,
    id_provider: &dyn IdProvider,
    time_provider: &dyn TimeProvider,
    policy: &LeasePolicy,
    req: RegisterTaskRequest,
) -> Result<String> {
    validate_request(&req)?;

    let id = match req.id {
        Some(id) if !id.is_empty() => id,
        _ => id_provider.generate_id(),
    };

    let mut task = Task::new(
        id,
        req.namespace_id,
        req.timeout.unwrap_or(0),
        req.retries_left.unwrap_or(policy.default_retries),
        time_provider.now_millis(),
    );
    if let Some(status) = req.status {
        task.status = status;
    }

    task_repo.insert(&task).await?;

    Ok(task.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RegisterTaskRequest {
        RegisterTaskRequest {
            id: Some("t1".to_string()),
            namespace_id: "ns-1".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_valid_request() {
        assert!(validate_request(&request()).is_ok());
    }

    #[test]
    fn test_validate_empty_namespace() {
        let req = RegisterTaskRequest {
            namespace_id: "".to_string(),
            ..request()
        };
        let err = validate_request(&req).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_validate_id_too_long() {
        let req = RegisterTaskRequest {
            id: Some("a".repeat(300)),
            ..request()
        };
        let err = validate_request(&req).unwrap_err();
        assert!(err.to_string().contains("too long"));
    }

    #[test]
    fn test_validate_rejects_in_progress() {
        let req = RegisterTaskRequest {
            status: Some(TaskStatus::InProgress),
            ..request()
        };
        assert!(matches!(
            validate_request(&req),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_request_deserializes_with_defaults() {
        let req: RegisterTaskRequest =
            serde_json::from_value(serde_json::json!({"namespace_id": "ns-1"})).unwrap();
        assert!(req.id.is_none());
        assert!(req.timeout.is_none());
        assert!(req.retries_left.is_none());
        assert!(req.status.is_none());
    }
}
