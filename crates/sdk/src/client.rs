//! Ninhydrin Client Implementation

use crate::config::{ClientConfig, WORKER_ID_HEADER};
use crate::error::{Result, SdkError};
use crate::services::{RegistryService, TaskService};
use crate::types::{Namespace, Pool, Tag, Worker};
use jsonrpsee::core::client::ClientT;
use jsonrpsee::core::traits::ToRpcParams;
use jsonrpsee::http_client::{HeaderMap, HeaderValue, HttpClient, HttpClientBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::value::RawValue;
use std::sync::Arc;
use tracing::debug;

/// Sends a struct as the single by-name (object) parameter of a call
struct JsonParams<'a, T>(&'a T);

impl<T: Serialize> ToRpcParams for JsonParams<'_, T> {
    fn to_rpc_params(self) -> std::result::Result<Option<Box<RawValue>>, serde_json::Error> {
        serde_json::value::to_raw_value(self.0).map(Some)
    }
}

/// Ninhydrin Client
///
/// Cheap to clone; every service handle shares one HTTP client. Holds no
/// other state, so dropping a pending call simply abandons it.
///
/// # Example
///
/// ```no_run
/// use ninhydrin_sdk::{ClientConfig, NinhydrinClient, NewTask, TaskStatus};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = NinhydrinClient::new(ClientConfig::default().with_worker_id("worker-1"))?;
///
/// for task in client.tasks().capture("emails", 10).await? {
///     client.tasks().release(TaskStatus::Done, &[task.id]).await?;
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct NinhydrinClient {
    inner: Arc<HttpClient>,
    config: Arc<ClientConfig>,
}

impl NinhydrinClient {
    /// Build a client from explicit configuration
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert("user-agent", header_value("user agent", &config.user_agent)?);
        if let Some(worker_id) = &config.worker_id {
            headers.insert(WORKER_ID_HEADER, header_value("worker id", worker_id)?);
        }

        let client = HttpClientBuilder::default()
            .request_timeout(config.request_timeout)
            .set_headers(headers)
            .build(&config.base_url)
            .map_err(|e| SdkError::Connection(format!("Failed to create client: {}", e)))?;

        Ok(Self {
            inner: Arc::new(client),
            config: Arc::new(config),
        })
    }

    /// Default configuration pointed at `url`
    pub fn connect(url: impl Into<String>) -> Result<Self> {
        Self::new(ClientConfig::new(url))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn namespaces(&self) -> RegistryService<Namespace> {
        RegistryService::new(self.clone())
    }

    pub fn tasks(&self) -> TaskService {
        TaskService::new(self.clone())
    }

    pub fn pools(&self) -> RegistryService<Pool> {
        RegistryService::new(self.clone())
    }

    pub fn tags(&self) -> RegistryService<Tag> {
        RegistryService::new(self.clone())
    }

    pub fn workers(&self) -> RegistryService<Worker> {
        RegistryService::new(self.clone())
    }

    /// One JSON-RPC call with an object parameter
    pub(crate) async fn call<P, R>(&self, method: &str, params: &P) -> Result<R>
    where
        P: Serialize + Sync,
        R: DeserializeOwned,
    {
        debug!(method, "JSON-RPC call");
        let response = self.inner.request(method, JsonParams(params)).await?;
        Ok(response)
    }
}

fn header_value(what: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| SdkError::InvalidArgument(format!("invalid {} header: {:?}", what, value)))
}
