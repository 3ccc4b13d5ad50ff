// Domain Layer - Pure business logic and entities

pub mod error;
pub mod lease;
pub mod resource;
pub mod task;

// Re-exports
pub use error::DomainError;
pub use lease::{LeasePolicy, ReconcileStats};
pub use resource::{Namespace, NamespaceId, Pool, Resource, Tag, Worker};
pub use task::{ReconcileOutcome, Task, TaskId, TaskStatus};
