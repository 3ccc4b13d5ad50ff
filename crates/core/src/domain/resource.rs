// Registry Domain Models (Namespace, Pool, Tag, Worker)
//
// Flat records keyed by ID with no state machine of their own.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Namespace identifier
pub type NamespaceId = String;

/// A registry record that can be stored, listed and deleted by ID
pub trait Resource: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Kind label used in storage and log fields
    const KIND: &'static str;

    fn id(&self) -> &str;
}

/// Namespace: owns zero or more tasks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    pub id: NamespaceId,
}

impl Namespace {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl Resource for Namespace {
    const KIND: &'static str = "namespace";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Pool of workers selected by tags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub tag_ids: Vec<String>,
}

impl Resource for Pool {
    const KIND: &'static str = "pool";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
}

impl Resource for Tag {
    const KIND: &'static str = "tag";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Worker registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
    pub id: String,
    #[serde(default)]
    pub tag_ids: Vec<String>,
}

impl Resource for Worker {
    const KIND: &'static str = "worker";

    fn id(&self) -> &str {
        &self.id
    }
}
