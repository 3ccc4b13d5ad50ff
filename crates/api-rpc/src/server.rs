//! JSON-RPC Server
//!
//! JSON-RPC 2.0 over HTTP (`POST /`) on a TCP listener.

use crate::handler::{RegistryAccess, RpcHandler, RpcResult};
use crate::types::{
    task_method, CaptureRequest, IdRequest, NamespaceRequest, RegisterTaskRequest,
    RegistryMethodSet, ReleaseRequest,
};
use jsonrpsee::core::RegisterMethodError;
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::RpcModule;
use ninhydrin_core::domain::{Namespace, Pool, Resource, Tag, Worker};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

const DEFAULT_RPC_HOST: &str = "127.0.0.1";
const DEFAULT_RPC_PORT: u16 = 8080;

/// RPC Server Configuration
#[derive(Debug, Clone)]
pub struct RpcServerConfig {
    pub host: String,
    /// 0 binds an ephemeral port; the bound address is returned by `start`
    pub port: u16,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind JSON-RPC server on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to register RPC method: {0}")]
    Register(#[from] RegisterMethodError),
}

/// RPC Server
pub struct RpcServer {
    config: RpcServerConfig,
    handler: Arc<RpcHandler>,
}

impl RpcServer {
    pub fn new(config: RpcServerConfig, handler: RpcHandler) -> Self {
        Self {
            config,
            handler: Arc::new(handler),
        }
    }

    /// Start the JSON-RPC server
    ///
    /// Returns the handle (stop + wait) and the address actually bound.
    pub async fn start(self) -> Result<(ServerHandle, SocketAddr), ServerError> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        let server = Server::builder()
            .build(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;
        let local_addr = server
            .local_addr()
            .map_err(|source| ServerError::Bind { addr, source })?;

        let module = build_module(&self.handler)?;

        info!(
            addr = %local_addr,
            methods = module.method_names().count(),
            "JSON-RPC server started"
        );

        let handle = server.start(module);
        Ok((handle, local_addr))
    }
}

/// Build the full method table over one handler
pub fn build_module(handler: &Arc<RpcHandler>) -> Result<RpcModule<()>, ServerError> {
    let mut module = RpcModule::new(());

    register_registry::<Namespace>(&mut module, handler)?;
    register_registry::<Pool>(&mut module, handler)?;
    register_registry::<Tag>(&mut module, handler)?;
    register_registry::<Worker>(&mut module, handler)?;

    register_method(
        &mut module,
        task_method::REGISTER,
        handler,
        |h, req: RegisterTaskRequest| async move { h.register_task(req).await },
    )?;
    register_method(
        &mut module,
        task_method::LIST,
        handler,
        |h, req: NamespaceRequest| async move { h.list_tasks(req).await },
    )?;
    register_method(
        &mut module,
        task_method::READ,
        handler,
        |h, req: IdRequest| async move { h.read_task(req).await },
    )?;
    register_method(
        &mut module,
        task_method::DELETE,
        handler,
        |h, req: IdRequest| async move { h.delete_task(req).await },
    )?;
    register_method(
        &mut module,
        task_method::CAPTURE,
        handler,
        |h, req: CaptureRequest| async move { h.capture(req).await },
    )?;
    register_method(
        &mut module,
        task_method::RELEASE,
        handler,
        |h, req: ReleaseRequest| async move { h.release(req).await },
    )?;

    Ok(module)
}

/// `<kind>.{register,list,read,delete}.v1`
fn register_registry<R>(
    module: &mut RpcModule<()>,
    handler: &Arc<RpcHandler>,
) -> Result<(), ServerError>
where
    R: Resource + RegistryMethodSet,
    RpcHandler: RegistryAccess<R>,
{
    let methods = R::METHODS;

    register_method(module, methods.register, handler, |h, resource: R| async move {
        h.register(resource).await
    })?;
    // List takes no arguments; whatever params arrive are ignored
    register_method(module, methods.list, handler, |h, _: IgnoredAny| async move {
        h.list::<R>().await
    })?;
    register_method(module, methods.read, handler, |h, req: IdRequest| async move {
        h.read::<R>(req).await
    })?;
    register_method(module, methods.delete, handler, |h, req: IdRequest| async move {
        h.delete::<R>(req).await
    })?;

    Ok(())
}

/// Parse the object parameter into `P` and hand it to `call`
fn register_method<P, T, F, Fut>(
    module: &mut RpcModule<()>,
    name: &'static str,
    handler: &Arc<RpcHandler>,
    call: F,
) -> Result<(), ServerError>
where
    P: DeserializeOwned + Send + 'static,
    T: Serialize + Clone + Send + 'static,
    F: Fn(Arc<RpcHandler>, P) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = RpcResult<T>> + Send + 'static,
{
    let handler = Arc::clone(handler);
    module.register_async_method(name, move |params, _, _| {
        let handler = handler.clone();
        let call = call.clone();
        async move {
            let req: P = params.parse()?;
            call(handler, req).await
        }
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::code;
    use crate::handler::in_memory_handler;
    use crate::types::{IdResponse, ListResponse, ReleaseResponse};
    use jsonrpsee::core::client::{ClientT, Error as ClientError};
    use jsonrpsee::core::params::ObjectParams;
    use jsonrpsee::http_client::HttpClientBuilder;
    use ninhydrin_core::domain::{Task, TaskStatus};

    async fn start_test_server() -> (ServerHandle, String) {
        let server = RpcServer::new(
            RpcServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            in_memory_handler(),
        );
        let (handle, addr) = server.start().await.unwrap();
        (handle, format!("http://{}", addr))
    }

    fn params(pairs: &[(&str, serde_json::Value)]) -> ObjectParams {
        let mut params = ObjectParams::new();
        for (key, value) in pairs {
            params.insert(key, value).unwrap();
        }
        params
    }

    #[test]
    fn test_module_exposes_every_method() {
        let module = build_module(&Arc::new(in_memory_handler())).unwrap();
        let names: Vec<&str> = module.method_names().collect();

        for kind in ["namespace", "pool", "tag", "worker"] {
            for op in ["register", "list", "read", "delete"] {
                let name = format!("{}.{}.v1", kind, op);
                assert!(names.contains(&name.as_str()), "missing {}", name);
            }
        }
        for name in [
            task_method::REGISTER,
            task_method::LIST,
            task_method::READ,
            task_method::DELETE,
            task_method::CAPTURE,
            task_method::RELEASE,
        ] {
            assert!(names.contains(&name), "missing {}", name);
        }
    }

    #[tokio::test]
    async fn test_round_trip_over_http() {
        let (handle, url) = start_test_server().await;
        let client = HttpClientBuilder::default().build(&url).unwrap();

        let ns: IdResponse = client
            .request(
                "namespace.register.v1",
                params(&[("id", serde_json::json!("ns-1"))]),
            )
            .await
            .unwrap();
        assert_eq!(ns.id, "ns-1");

        let task: IdResponse = client
            .request(
                task_method::REGISTER,
                params(&[
                    ("id", serde_json::json!("t1")),
                    ("namespace_id", serde_json::json!("ns-1")),
                    ("timeout", serde_json::json!(10)),
                    ("retries_left", serde_json::json!(5)),
                ]),
            )
            .await
            .unwrap();
        assert_eq!(task.id, "t1");

        let captured: ListResponse<Task> = client
            .request(
                task_method::CAPTURE,
                params(&[
                    ("namespace_id", serde_json::json!("ns-1")),
                    ("limit", serde_json::json!(10)),
                ]),
            )
            .await
            .unwrap();
        assert_eq!(captured.list.len(), 1);
        assert_eq!(captured.list[0].status, TaskStatus::InProgress);

        let released: ReleaseResponse = client
            .request(
                task_method::RELEASE,
                params(&[
                    ("status", serde_json::json!("done")),
                    ("task_ids", serde_json::json!(["t1"])),
                ]),
            )
            .await
            .unwrap();
        assert_eq!(released.released, 1);

        handle.stop().unwrap();
    }

    #[tokio::test]
    async fn test_errors_over_http() {
        let (handle, url) = start_test_server().await;
        let client = HttpClientBuilder::default().build(&url).unwrap();

        let err = client
            .request::<Task, _>(task_method::READ, params(&[("id", serde_json::json!("nope"))]))
            .await
            .unwrap_err();
        match err {
            ClientError::Call(obj) => assert_eq!(obj.code(), code::NOT_FOUND),
            other => panic!("unexpected error: {other:?}"),
        }

        handle.stop().unwrap();
    }
}
