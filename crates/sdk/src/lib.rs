//! Ninhydrin SDK - Rust client for the Ninhydrin lease queue
//!
//! Wraps the daemon's JSON-RPC surface in typed service handles and ships
//! a small worker loop built on capture and release.
//!
//! # Example
//!
//! ```no_run
//! use ninhydrin_sdk::{Namespace, NewTask, NinhydrinClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = NinhydrinClient::connect("http://127.0.0.1:8080")?;
//!
//!     client.namespaces().register(&Namespace::new("emails")).await?;
//!     let id = client
//!         .tasks()
//!         .register(&NewTask::new("emails").with_timeout(30))
//!         .await?;
//!
//!     println!("Task registered: {}", id);
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
mod services;
mod types;
mod worker;

pub use client::NinhydrinClient;
pub use config::{ClientConfig, DEFAULT_BASE_URL, WORKER_ID_HEADER};
pub use error::{code, Result, SdkError};
pub use services::{RegistryService, TaskService};
pub use types::{Namespace, NewTask, Pool, RegistryRecord, Tag, Task, TaskStatus, Worker};
pub use worker::{TaskHandler, TaskWorker, WorkerConfig, WorkerStats};
