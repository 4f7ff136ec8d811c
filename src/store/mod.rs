//! Graph-store backends.
//!
//! Two implementations of the [`GraphStore`] trait:
//! - `HttpStore`: a remote store speaking the REST API
//! - `MemoryStore`: an in-process store for dry runs and tests

mod batch;
mod http;
mod memory;

pub use batch::{BatchItemOutcome, BatchResults, QueuedObject, QueuedReference, WriteBatch};
pub use http::HttpStore;
pub use memory::{MemoryStore, StoreOp, StoredReference};

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::config::{Config, StoreBackendType};
use crate::error::Result;
use crate::schema::{ClassSpec, PropertySpec};

/// An object fetched from the store.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphObject {
    /// Object id.
    pub id: Uuid,
    /// Class name.
    pub class: String,
    /// Property map.
    #[serde(default)]
    pub properties: Value,
}

/// Base URI for cross-reference pointers.
#[derive(Debug, Clone)]
pub struct BeaconBase(String);

impl Default for BeaconBase {
    fn default() -> Self {
        Self("weaviate://localhost".to_string())
    }
}

impl BeaconBase {
    pub fn new(base: &str) -> Self {
        Self(base.trim_end_matches('/').to_string())
    }

    /// Pointer to an object, used as a reference target.
    pub fn object(&self, id: Uuid) -> String {
        format!("{}/{}", self.0, id)
    }

    /// Pointer to a reference property on an object, used as a batched
    /// reference source.
    pub fn property(&self, class: &str, id: Uuid, relation: &str) -> String {
        format!("{}/{}/{}/{}", self.0, class, id, relation)
    }
}

/// Backend-agnostic graph-store operations.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Drop the entire schema and every stored object.
    async fn reset_schema(&self) -> Result<()>;

    /// Create a class. The spec must not contain reference properties
    /// whose target class does not exist yet.
    async fn define_class(&self, spec: &ClassSpec) -> Result<()>;

    /// Add a property to an existing class.
    async fn add_property(&self, class: &str, property: &PropertySpec) -> Result<()>;

    /// Create a single object with a caller-assigned id.
    async fn create_object(&self, class: &str, id: Uuid, properties: Value) -> Result<()>;

    /// Fetch an object by id. `None` when the id is unknown.
    async fn get_object(&self, id: Uuid) -> Result<Option<GraphObject>>;

    /// Append a cross-reference from one existing object to another.
    async fn add_reference(
        &self,
        from_class: &str,
        from_id: Uuid,
        relation: &str,
        to_id: Uuid,
    ) -> Result<()>;

    /// Write all queued objects, then all queued references.
    ///
    /// Item failures are reported per item, not as an error; an empty
    /// batch performs no work.
    async fn flush_batch(&self, batch: WriteBatch) -> Result<BatchResults>;
}

/// Create a store backend from configuration.
pub fn create_store(config: &Config) -> Result<Arc<dyn GraphStore>> {
    match config.store.backend {
        StoreBackendType::Http => Ok(Arc::new(HttpStore::from_config(&config.store)?)),
        StoreBackendType::Memory => Ok(Arc::new(MemoryStore::new())),
    }
}
