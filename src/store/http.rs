//! HTTP backend speaking the store's REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::schema::{ClassSpec, PropertySpec};

use super::{BatchItemOutcome, BatchResults, BeaconBase, GraphObject, GraphStore, WriteBatch};

/// Environment variable consulted when `store.api_key` is unset.
const API_KEY_ENV: &str = "TRELLIS_STORE_API_KEY";

/// Remote graph store over HTTP.
pub struct HttpStore {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    beacons: BeaconBase,
}

/// Object payload for single and batched creation.
#[derive(Debug, Serialize)]
struct ObjectPayload<'a> {
    class: &'a str,
    id: Uuid,
    properties: &'a Value,
}

/// Body of a batched object write.
#[derive(Debug, Serialize)]
struct BatchObjectsPayload<'a> {
    objects: Vec<ObjectPayload<'a>>,
}

/// Target of a single reference addition.
#[derive(Debug, Serialize)]
struct ReferencePayload {
    beacon: String,
}

/// Source/target pair of a batched reference.
#[derive(Debug, Serialize)]
struct BatchReferencePayload {
    from: String,
    to: String,
}

/// Schema listing returned by the store.
#[derive(Debug, Deserialize)]
struct SchemaResponse {
    #[serde(default)]
    classes: Vec<SchemaClass>,
}

#[derive(Debug, Deserialize)]
struct SchemaClass {
    class: String,
}

/// Per-item entry in a batch response.
#[derive(Debug, Deserialize)]
struct BatchResponseItem {
    #[serde(default)]
    id: Option<Uuid>,
    #[serde(default)]
    result: Option<BatchItemResult>,
}

#[derive(Debug, Deserialize)]
struct BatchItemResult {
    #[serde(default)]
    errors: Option<BatchItemErrors>,
}

#[derive(Debug, Deserialize)]
struct BatchItemErrors {
    #[serde(default)]
    error: Vec<BatchItemError>,
}

#[derive(Debug, Deserialize)]
struct BatchItemError {
    message: String,
}

/// Error body returned by the store API.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    error: Vec<ApiErrorMessage>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorMessage {
    message: String,
}

impl HttpStore {
    /// Create a client from store configuration.
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok());

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StoreError::Connection(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key,
            beacons: BeaconBase::new(&config.beacon_base),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let mut request = self.client.request(method, self.url(path));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        request
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                StoreError::Connection("Request timed out".to_string())
            } else if e.is_connect() {
                StoreError::Connection(format!("Connection failed: {}", e))
            } else {
                StoreError::Connection(format!("Request failed: {}", e))
            }
        })?;
        Ok(response)
    }

    /// Turn a non-success response into an API error with the store's
    /// message when the body parses.
    async fn check(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        let message = match serde_json::from_str::<ErrorResponse>(&text) {
            Ok(body) if !body.error.is_empty() => body
                .error
                .into_iter()
                .map(|e| e.message)
                .collect::<Vec<_>>()
                .join("; "),
            _ => text,
        };

        Err(StoreError::Api {
            status: status.as_u16(),
            message,
        }
        .into())
    }
}

fn item_outcome(item: BatchResponseItem) -> BatchItemOutcome {
    let errors = item
        .result
        .and_then(|r| r.errors)
        .map(|e| e.error.into_iter().map(|m| m.message).collect())
        .unwrap_or_default();
    BatchItemOutcome {
        id: item.id,
        errors,
    }
}

#[async_trait]
impl GraphStore for HttpStore {
    async fn reset_schema(&self) -> Result<()> {
        let response = self.send(self.request(Method::GET, "/schema")).await?;
        let response = self.check(response).await?;
        let schema: SchemaResponse = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;

        for class in schema.classes {
            debug!(class = %class.class, "Dropping class");
            let path = format!("/schema/{}", class.class);
            let response = self.send(self.request(Method::DELETE, &path)).await?;
            self.check(response).await?;
        }
        Ok(())
    }

    async fn define_class(&self, spec: &ClassSpec) -> Result<()> {
        let response = self
            .send(self.request(Method::POST, "/schema").json(spec))
            .await?;
        self.check(response).await?;
        Ok(())
    }

    async fn add_property(&self, class: &str, property: &PropertySpec) -> Result<()> {
        let path = format!("/schema/{}/properties", class);
        let response = self
            .send(self.request(Method::POST, &path).json(property))
            .await?;
        self.check(response).await?;
        Ok(())
    }

    async fn create_object(&self, class: &str, id: Uuid, properties: Value) -> Result<()> {
        let payload = ObjectPayload {
            class,
            id,
            properties: &properties,
        };
        let response = self
            .send(self.request(Method::POST, "/objects").json(&payload))
            .await?;
        self.check(response).await?;
        Ok(())
    }

    async fn get_object(&self, id: Uuid) -> Result<Option<GraphObject>> {
        let path = format!("/objects/{}", id);
        let response = self.send(self.request(Method::GET, &path)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = self.check(response).await?;
        let object: GraphObject = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;
        Ok(Some(object))
    }

    async fn add_reference(
        &self,
        _from_class: &str,
        from_id: Uuid,
        relation: &str,
        to_id: Uuid,
    ) -> Result<()> {
        let path = format!("/objects/{}/references/{}", from_id, relation);
        let payload = ReferencePayload {
            beacon: self.beacons.object(to_id),
        };
        let response = self
            .send(self.request(Method::POST, &path).json(&payload))
            .await?;
        self.check(response).await?;
        Ok(())
    }

    async fn flush_batch(&self, batch: WriteBatch) -> Result<BatchResults> {
        let mut results = BatchResults::default();

        if !batch.objects.is_empty() {
            let payload = BatchObjectsPayload {
                objects: batch
                    .objects
                    .iter()
                    .map(|object| ObjectPayload {
                        class: &object.class,
                        id: object.id,
                        properties: &object.properties,
                    })
                    .collect(),
            };
            let response = self
                .send(self.request(Method::POST, "/batch/objects").json(&payload))
                .await?;
            let response = self.check(response).await?;
            let items: Vec<BatchResponseItem> = response
                .json()
                .await
                .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;
            results.objects = items.into_iter().map(item_outcome).collect();
        }

        if !batch.references.is_empty() {
            let payload: Vec<BatchReferencePayload> = batch
                .references
                .iter()
                .map(|reference| BatchReferencePayload {
                    from: self.beacons.property(
                        &reference.from_class,
                        reference.from_id,
                        &reference.relation,
                    ),
                    to: self.beacons.object(reference.to_id),
                })
                .collect();
            let response = self
                .send(self.request(Method::POST, "/batch/references").json(&payload))
                .await?;
            let response = self.check(response).await?;
            let items: Vec<BatchResponseItem> = response
                .json()
                .await
                .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;
            results.references = items.into_iter().map(item_outcome).collect();
        }

        Ok(results)
    }
}
