//! Ninhydrin CLI - Command-line interface for the Ninhydrin daemon

mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ninhydrin_sdk::{
    ClientConfig, Namespace, NewTask, NinhydrinClient, Pool, RegistryRecord, RegistryService,
    Tag, TaskStatus, Worker, DEFAULT_BASE_URL,
};
use output::Describe;

#[derive(Parser)]
#[command(name = "ninhydrin-cli")]
#[command(about = "Ninhydrin lease queue CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RPC server URL
    #[arg(long, env = "NINHYDRIN_RPC_URL", default_value = DEFAULT_BASE_URL)]
    rpc_url: String,

    /// Worker ID sent with every request
    #[arg(long, env = "NINHYDRIN_WORKER_ID")]
    worker_id: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage namespaces
    #[command(subcommand)]
    Namespace(NamespaceCommand),

    /// Manage worker pools
    #[command(subcommand)]
    Pool(PoolCommand),

    /// Manage tags
    #[command(subcommand)]
    Tag(TagCommand),

    /// Manage workers
    #[command(subcommand)]
    Worker(WorkerCommand),

    /// Register, inspect, capture and release tasks
    #[command(subcommand)]
    Task(TaskCommand),
}

/// Operations every registry kind shares
#[derive(Subcommand)]
enum RegistryOp {
    /// List all records
    List,
    /// Show one record
    Read { id: String },
    /// Delete one record
    Delete { id: String },
}

#[derive(Subcommand)]
enum NamespaceCommand {
    /// Register a namespace
    Register { id: String },
    #[command(flatten)]
    Op(RegistryOp),
}

#[derive(Subcommand)]
enum PoolCommand {
    /// Register a pool
    Register {
        id: String,
        #[arg(long)]
        description: Option<String>,
        /// Tag ID (repeatable)
        #[arg(long = "tag")]
        tag_ids: Vec<String>,
    },
    #[command(flatten)]
    Op(RegistryOp),
}

#[derive(Subcommand)]
enum TagCommand {
    /// Register a tag
    Register { id: String },
    #[command(flatten)]
    Op(RegistryOp),
}

#[derive(Subcommand)]
enum WorkerCommand {
    /// Register a worker
    Register {
        id: String,
        /// Tag ID (repeatable)
        #[arg(long = "tag")]
        tag_ids: Vec<String>,
    },
    #[command(flatten)]
    Op(RegistryOp),
}

#[derive(Subcommand)]
enum TaskCommand {
    /// Register a task
    Register {
        /// Namespace the task belongs to
        #[arg(short, long)]
        namespace: String,

        /// Task ID (generated by the daemon when omitted)
        #[arg(long)]
        id: Option<String>,

        /// Lease duration in seconds (0 = daemon default)
        #[arg(short, long)]
        timeout: Option<u32>,

        /// Capture budget
        #[arg(short, long)]
        retries: Option<u32>,

        /// Initial status (default: idle)
        #[arg(long)]
        status: Option<TaskStatus>,
    },

    /// List the tasks of a namespace
    List {
        #[arg(short, long)]
        namespace: String,
    },

    /// Show one task
    Read { id: String },

    /// Delete one task
    Delete { id: String },

    /// Lease idle tasks
    Capture {
        #[arg(short, long)]
        namespace: String,

        #[arg(short, long, default_value = "1")]
        limit: u32,
    },

    /// Set the status of leased tasks
    Release {
        /// done, failed, timeout or idle
        #[arg(short, long)]
        status: TaskStatus,

        #[arg(required = true)]
        ids: Vec<String>,
    },
}

async fn run_registry_op<T>(service: RegistryService<T>, op: RegistryOp) -> Result<()>
where
    T: RegistryRecord + Describe,
{
    match op {
        RegistryOp::List => {
            let records = service.list().await?;
            output::print_records(T::KIND, &records);
        }
        RegistryOp::Read { id } => {
            let record = service.read(&id).await?;
            println!("{}", output::records_table(&[record]));
        }
        RegistryOp::Delete { id } => {
            service.delete(&id).await?;
            output::success(format!("{} {} deleted", T::KIND, id));
        }
    }
    Ok(())
}

async fn register<T: RegistryRecord>(service: RegistryService<T>, record: T) -> Result<()> {
    let id = service.register(&record).await?;
    output::success(format!("{} {} registered", T::KIND, id));
    Ok(())
}

async fn run_task_command(client: &NinhydrinClient, command: TaskCommand) -> Result<()> {
    let tasks = client.tasks();

    match command {
        TaskCommand::Register {
            namespace,
            id,
            timeout,
            retries,
            status,
        } => {
            let id = tasks
                .register(&NewTask {
                    id,
                    namespace_id: namespace,
                    timeout,
                    retries_left: retries,
                    status,
                })
                .await?;
            output::success(format!("task {} registered", id));
        }
        TaskCommand::List { namespace } => {
            let list = tasks.list(&namespace).await?;
            output::print_tasks(&list, &format!("No tasks in namespace {}", namespace));
        }
        TaskCommand::Read { id } => {
            let task = tasks.read(&id).await?;
            println!("{}", output::tasks_table(&[task]));
        }
        TaskCommand::Delete { id } => {
            tasks.delete(&id).await?;
            output::success(format!("task {} deleted", id));
        }
        TaskCommand::Capture { namespace, limit } => {
            let captured = tasks.capture(&namespace, limit).await?;
            output::print_tasks(&captured, "No idle tasks to capture");
        }
        TaskCommand::Release { status, ids } => {
            let released = tasks.release(status, &ids).await?;
            output::success(format!("{} task(s) released as {}", released, status));
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ClientConfig::new(&cli.rpc_url);
    if let Some(worker_id) = cli.worker_id {
        config = config.with_worker_id(worker_id);
    }
    let client = NinhydrinClient::new(config)
        .with_context(|| format!("Failed to create client for {}", cli.rpc_url))?;

    match cli.command {
        Commands::Namespace(cmd) => match cmd {
            NamespaceCommand::Register { id } => {
                register(client.namespaces(), Namespace { id }).await?
            }
            NamespaceCommand::Op(op) => run_registry_op(client.namespaces(), op).await?,
        },
        Commands::Pool(cmd) => match cmd {
            PoolCommand::Register {
                id,
                description,
                tag_ids,
            } => {
                register(
                    client.pools(),
                    Pool {
                        id,
                        description,
                        tag_ids,
                    },
                )
                .await?
            }
            PoolCommand::Op(op) => run_registry_op(client.pools(), op).await?,
        },
        Commands::Tag(cmd) => match cmd {
            TagCommand::Register { id } => register(client.tags(), Tag { id }).await?,
            TagCommand::Op(op) => run_registry_op(client.tags(), op).await?,
        },
        Commands::Worker(cmd) => match cmd {
            WorkerCommand::Register { id, tag_ids } => {
                register(client.workers(), Worker { id, tag_ids }).await?
            }
            WorkerCommand::Op(op) => run_registry_op(client.workers(), op).await?,
        },
        Commands::Task(cmd) => run_task_command(&client, cmd).await?,
    }

    Ok(())
}
