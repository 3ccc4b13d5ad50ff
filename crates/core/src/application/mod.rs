// Application Layer - Use Cases and Business Logic

pub mod lease;
pub mod reaper;
pub mod registry;
pub mod shutdown;
pub mod task;

// Re-exports
pub use lease::LeaseManager;
pub use reaper::Reaper;
pub use registry::ResourceRegistry;
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};
pub use task::{RegisterTaskRequest, TaskService};
