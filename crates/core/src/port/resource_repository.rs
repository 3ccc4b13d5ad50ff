// Resource Repository Port (Interface)

use crate::domain::Resource;
use crate::error::Result;
use async_trait::async_trait;

/// Repository interface for registry records (Namespace, Pool, Tag, Worker)
#[async_trait]
pub trait ResourceRepository<R: Resource>: Send + Sync {
    /// Insert a new record
    ///
    /// # Errors
    /// - `AppError::Conflict` if a record of the same kind and ID exists
    async fn insert(&self, resource: &R) -> Result<()>;

    /// Find record by ID
    async fn find_by_id(&self, id: &str) -> Result<Option<R>>;

    /// All records of this kind in insertion order
    async fn list(&self) -> Result<Vec<R>>;

    /// Delete record by ID, returns false if it did not exist
    ///
    /// # Errors
    /// - `AppError::Conflict` when deleting a namespace that still owns tasks
    async fn delete(&self, id: &str) -> Result<bool>;
}
