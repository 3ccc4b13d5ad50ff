// Ninhydrin Infrastructure - SQLite Adapter
// Implements: TaskRepository, ResourceRepository<R> for every registry kind

mod connection;
mod error;
mod migration;
mod registry_repository;
mod task_repository;

pub use connection::create_pool;
pub use migration::run_migrations;
pub use registry_repository::SqliteRegistryRepository;
pub use task_repository::SqliteTaskRepository;

// sqlx::Error -> AppError goes through error::map_sqlx_error
// (orphan rules forbid From<sqlx::Error> for AppError here)
