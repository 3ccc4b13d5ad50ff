// Port Layer - Interfaces for external dependencies

pub mod id_provider; // For deterministic testing
pub mod mocks;
pub mod resource_repository;
pub mod task_repository;
pub mod time_provider;

// Re-exports
pub use id_provider::{IdProvider, SequentialIdProvider, UuidProvider};
pub use resource_repository::ResourceRepository;
pub use task_repository::TaskRepository;
pub use time_provider::{ManualTimeProvider, SystemTimeProvider, TimeProvider};
