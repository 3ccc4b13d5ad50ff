//! Shared wiring for integration tests: the daemon's composition over SQLite
//! with a hand-driven clock.

#![allow(dead_code)]

use ninhydrin_api_rpc::{RpcHandler, RpcServer, RpcServerConfig, ServerHandle};
use ninhydrin_core::application::{LeaseManager, ResourceRegistry, TaskService};
use ninhydrin_core::domain::{LeasePolicy, Namespace};
use ninhydrin_core::port::{ManualTimeProvider, SequentialIdProvider};
use ninhydrin_infra_sqlite::{
    create_pool, run_migrations, SqliteRegistryRepository, SqliteTaskRepository,
};
use sqlx::SqlitePool;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

pub const START_MILLIS: i64 = 1_700_000_000_000;

pub struct Stack {
    pub pool: SqlitePool,
    pub clock: Arc<ManualTimeProvider>,
    pub registry_repo: Arc<SqliteRegistryRepository>,
    pub namespaces: ResourceRegistry<Namespace>,
    pub tasks: Arc<TaskService>,
    pub leases: Arc<LeaseManager>,
}

impl Stack {
    pub async fn in_memory() -> Self {
        Self::open("sqlite::memory:", LeasePolicy::default()).await
    }

    pub async fn open(url: &str, policy: LeasePolicy) -> Self {
        let pool = create_pool(url).await.unwrap();
        run_migrations(&pool).await.unwrap();
        Self::from_pool(pool, Arc::new(ManualTimeProvider::new(START_MILLIS)), policy)
    }

    pub fn from_pool(pool: SqlitePool, clock: Arc<ManualTimeProvider>, policy: LeasePolicy) -> Self {
        let task_repo = Arc::new(SqliteTaskRepository::new(pool.clone()));
        let registry_repo = Arc::new(SqliteRegistryRepository::new(pool.clone()));
        let namespaces = ResourceRegistry::<Namespace>::new(registry_repo.clone());

        let tasks = Arc::new(TaskService::new(
            task_repo.clone(),
            namespaces.clone(),
            Arc::new(SequentialIdProvider::new("task")),
            clock.clone(),
            policy.clone(),
        ));
        let leases = Arc::new(LeaseManager::new(
            task_repo,
            namespaces.clone(),
            clock.clone(),
            policy,
        ));

        Self {
            pool,
            clock,
            registry_repo,
            namespaces,
            tasks,
            leases,
        }
    }

    pub fn handler(&self) -> RpcHandler {
        RpcHandler::new(
            self.leases.clone(),
            self.tasks.clone(),
            self.namespaces.clone(),
            ResourceRegistry::new(self.registry_repo.clone()),
            ResourceRegistry::new(self.registry_repo.clone()),
            ResourceRegistry::new(self.registry_repo.clone()),
        )
    }

    /// Serve this stack on an ephemeral port
    pub async fn serve(&self) -> (ServerHandle, SocketAddr) {
        RpcServer::new(
            RpcServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            self.handler(),
        )
        .start()
        .await
        .unwrap()
    }
}

/// SQLite file in its own temp dir; the database, WAL and SHM files go
/// away with the directory
pub struct TempDb {
    dir: TempDir,
}

impl TempDb {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self) -> PathBuf {
        self.dir.path().join("ninhydrin.db")
    }

    pub fn url(&self) -> String {
        format!("sqlite://{}", self.path().display())
    }
}
