// Resource Registry - flat CRUD for Namespace, Pool, Tag, Worker

use crate::domain::Resource;
use crate::error::{AppError, Result};
use crate::port::ResourceRepository;
use std::sync::Arc;
use tracing::info;

/// Maximum length of a registry or task ID
pub const MAX_ID_LEN: usize = 255;

/// Reject empty, oversized or control-character IDs
pub fn validate_id(kind: &str, id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(AppError::Validation(format!("{} id cannot be empty", kind)));
    }
    if id.len() > MAX_ID_LEN {
        return Err(AppError::Validation(format!(
            "{} id too long (max {} bytes)",
            kind, MAX_ID_LEN
        )));
    }
    if id.chars().any(char::is_control) {
        return Err(AppError::Validation(format!(
            "{} id contains control characters",
            kind
        )));
    }
    Ok(())
}

/// Register/List/Read/Delete over one kind of registry record
pub struct ResourceRegistry<R: Resource> {
    repo: Arc<dyn ResourceRepository<R>>,
}

impl<R: Resource> Clone for ResourceRegistry<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
        }
    }
}

impl<R: Resource> ResourceRegistry<R> {
    pub fn new(repo: Arc<dyn ResourceRepository<R>>) -> Self {
        Self { repo }
    }

    pub async fn register(&self, resource: R) -> Result<String> {
        validate_id(R::KIND, resource.id())?;
        self.repo.insert(&resource).await?;
        info!(kind = R::KIND, id = %resource.id(), "Registered");
        Ok(resource.id().to_string())
    }

    pub async fn list(&self) -> Result<Vec<R>> {
        self.repo.list().await
    }

    pub async fn read(&self, id: &str) -> Result<R> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} {} not found", R::KIND, id)))
    }

    pub async fn exists(&self, id: &str) -> Result<bool> {
        Ok(self.repo.find_by_id(id).await?.is_some())
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        if !self.repo.delete(id).await? {
            return Err(AppError::NotFound(format!("{} {} not found", R::KIND, id)));
        }
        info!(kind = R::KIND, id = %id, "Deleted");
        Ok(())
    }
}
