//! Ninhydrin - Main Entry Point
//!
//! Composition root: SQLite store, lease manager, reaper and JSON-RPC server.

mod config;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{DaemonConfig, LogFormat};
use ninhydrin_api_rpc::{RpcHandler, RpcServer, RpcServerConfig};
use ninhydrin_core::application::{
    shutdown_channel, LeaseManager, Reaper, ResourceRegistry, TaskService,
};
use ninhydrin_core::domain::Namespace;
use ninhydrin_core::port::{SystemTimeProvider, UuidProvider};
use ninhydrin_infra_sqlite::{
    create_pool, run_migrations, SqliteRegistryRepository, SqliteTaskRepository,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const DEFAULT_LOG_FILTER: &str = "ninhydrin=info";

fn init_logging(format: LogFormat) -> Result<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))
        .context("Failed to create env filter")?;
    let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(writer))
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().pretty().with_writer(writer))
            .init(),
    }

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Configuration and logging
    let config = DaemonConfig::from_env()?;
    let _log_guard = init_logging(config.log_format)?;

    info!("Ninhydrin v{} starting...", VERSION);

    // 2. Database
    if let Some(dir) = config.db_dir() {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create database directory {}", dir.display()))?;
    }
    info!(db_path = %config.db_path, "Initializing database...");

    let pool = create_pool(&config.database_url())
        .await
        .context("DB pool creation failed")?;
    run_migrations(&pool).await.context("Migration failed")?;

    // 3. Wiring
    let policy = config.lease_policy();
    let time_provider = Arc::new(SystemTimeProvider);
    let task_repo = Arc::new(SqliteTaskRepository::new(pool.clone()));
    let registry_repo = Arc::new(SqliteRegistryRepository::new(pool.clone()));

    let namespaces = ResourceRegistry::<Namespace>::new(registry_repo.clone());
    let tasks = Arc::new(TaskService::new(
        task_repo.clone(),
        namespaces.clone(),
        Arc::new(UuidProvider),
        time_provider.clone(),
        policy.clone(),
    ));
    let leases = Arc::new(LeaseManager::new(
        task_repo,
        namespaces.clone(),
        time_provider,
        policy,
    ));

    // 4. Settle leases that expired while the daemon was down
    let stats = leases
        .reconcile_all()
        .await
        .context("Startup reconciliation failed")?;
    info!(
        expired = stats.expired,
        requeued = stats.requeued,
        exhausted = stats.exhausted,
        "Startup reconciliation completed"
    );

    // 5. JSON-RPC server
    let handler = RpcHandler::new(
        leases.clone(),
        tasks,
        namespaces,
        ResourceRegistry::new(registry_repo.clone()),
        ResourceRegistry::new(registry_repo.clone()),
        ResourceRegistry::new(registry_repo),
    );
    let rpc_server = RpcServer::new(
        RpcServerConfig {
            host: config.rpc_host.clone(),
            port: config.rpc_port,
        },
        handler,
    );
    let (rpc_handle, addr) = rpc_server
        .start()
        .await
        .context("RPC server start failed")?;

    // 6. Reaper
    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let reaper = Reaper::new(leases, config.reaper_interval());
    let reaper_handle = tokio::spawn(reaper.run(shutdown_rx));

    info!(addr = %addr, "System ready. Press Ctrl+C to shutdown");

    // 7. Wait for shutdown signal
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    info!("Shutdown signal received. Exiting gracefully...");

    shutdown_tx.shutdown();
    rpc_handle
        .stop()
        .context("RPC server stop failed")?;
    rpc_handle.stopped().await;
    if let Err(e) = reaper_handle.await {
        error!(error = ?e, "Reaper task panicked");
    }
    pool.close().await;

    info!("Shutdown complete.");
    Ok(())
}
