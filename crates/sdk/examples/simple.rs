//! Simple SDK Example
//!
//! Registers a namespace, queues a few tasks and drains them with a worker.
//!
//! # Usage
//!
//! 1. Start the daemon:
//!    ```bash
//!    cargo run --package ninhydrin-daemon
//!    ```
//!
//! 2. Run this example:
//!    ```bash
//!    cargo run --package ninhydrin-sdk --example simple
//!    ```

use async_trait::async_trait;
use ninhydrin_sdk::{
    ClientConfig, Namespace, NewTask, NinhydrinClient, SdkError, Task, TaskHandler, TaskWorker,
    WorkerConfig,
};
use std::sync::Arc;
use std::time::Duration;

const NAMESPACE: &str = "example-emails";

struct PrintHandler;

#[async_trait]
impl TaskHandler for PrintHandler {
    async fn handle(&self, task: &Task) -> anyhow::Result<()> {
        println!("   handling {} ({} retries left)", task.id, task.retries_left);
        if task.id.ends_with("-3") {
            anyhow::bail!("simulated failure");
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter("ninhydrin=debug").init();

    println!("1. Connecting to daemon...");
    let client = NinhydrinClient::new(
        ClientConfig::default().with_worker_id("example-worker"),
    )?;

    println!("2. Registering namespace {}...", NAMESPACE);
    match client.namespaces().register(&Namespace::new(NAMESPACE)).await {
        Ok(_) | Err(SdkError::Conflict(_)) => {}
        Err(e) => return Err(e.into()),
    }

    println!("3. Queueing tasks...");
    for n in 1..=5 {
        let id = format!("{}-{}", NAMESPACE, n);
        let task = NewTask::new(NAMESPACE)
            .with_id(id.clone())
            .with_timeout(30)
            .with_retries(2);
        match client.tasks().register(&task).await {
            Ok(_) | Err(SdkError::Conflict(_)) => {}
            Err(e) => return Err(e.into()),
        }
    }

    println!("4. Running worker for 3 seconds...");
    let worker = TaskWorker::new(
        client.clone(),
        Arc::new(PrintHandler),
        WorkerConfig::new(NAMESPACE)
            .with_batch_size(2)
            .with_idle_interval(Duration::from_millis(250)),
    );
    worker.run(tokio::time::sleep(Duration::from_secs(3))).await;

    println!("5. Final state:");
    for task in client.tasks().list(NAMESPACE).await? {
        println!("   {:<20} {:<12} retries_left={}", task.id, task.status, task.retries_left);
    }

    Ok(())
}
