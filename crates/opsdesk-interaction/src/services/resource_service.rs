use std::marker::PhantomData;
use std::sync::Arc;

use opsdesk_core::request::{ApiResponse, HttpMethod, RequestDescriptor, ResponseKind};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiError;
use crate::request_client::RequestClient;
use crate::services::resource::{Collection, Resource};

/// Typed CRUD over one backend collection.
///
/// `R` is any serde type; use [`ResourceService::of`] for the typed records
/// in [`services`](crate::services) or [`ResourceService::untyped`] to work
/// with raw JSON.
pub struct ResourceService<R = Value> {
    client: Arc<RequestClient>,
    path: String,
    _marker: PhantomData<fn() -> R>,
}

impl<R: Resource> ResourceService<R> {
    pub fn of(client: Arc<RequestClient>) -> Self {
        Self::at(client, R::COLLECTION.path())
    }
}

impl ResourceService<Value> {
    pub fn untyped(client: Arc<RequestClient>, collection: Collection) -> Self {
        Self::at(client, collection.path())
    }
}

impl<R> ResourceService<R>
where
    R: Serialize + DeserializeOwned,
{
    /// Service over an arbitrary collection path.
    pub fn at(client: Arc<RequestClient>, path: impl Into<String>) -> Self {
        Self {
            client,
            path: path.into().trim_matches('/').to_string(),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn item_path(&self, id: &str) -> String {
        format!("{}/{}", self.path, id)
    }

    /// All records. A body-less reply is an empty list.
    pub async fn list(&self) -> Result<Vec<R>, ApiError> {
        Ok(self.client.get_json(&self.path).await?.unwrap_or_default())
    }

    /// [`list`](Self::list), degraded to an empty list on failure.
    ///
    /// This is the only place a failed read is turned into a default. On a 401
    /// the session has already been invalidated by the client.
    pub async fn list_or_default(&self) -> Vec<R> {
        match self.list().await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!("Failed to list '{}', showing none: {}", self.path, e);
                Vec::new()
            }
        }
    }

    /// One record, `None` on 404.
    pub async fn get(&self, id: &str) -> Result<Option<R>, ApiError> {
        match self.client.get_json(&self.item_path(id)).await {
            Err(e) if e.is_not_found() => Ok(None),
            other => other,
        }
    }

    /// Creates a record. `None` when the backend acknowledged without echoing
    /// the record.
    ///
    /// Here and in [`update`](Self::update) and [`patch`](Self::patch), a
    /// body-less reply and an echoed empty object `{}` both mean "no record".
    /// A 201 without a body already decodes to `{}`, so the two cannot be
    /// told apart, even for `ResourceService<Value>`.
    pub async fn create(&self, record: &R) -> Result<Option<R>, ApiError> {
        self.send(HttpMethod::Post, self.path.clone(), record).await
    }

    /// Replaces a record. `None` on an empty or `{}` reply.
    pub async fn update(&self, id: &str, record: &R) -> Result<Option<R>, ApiError> {
        self.send(HttpMethod::Put, self.item_path(id), record).await
    }

    /// Partial update with an arbitrary JSON patch document.
    pub async fn patch(&self, id: &str, changes: &Value) -> Result<Option<R>, ApiError> {
        self.send(HttpMethod::Patch, self.item_path(id), changes).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        // Whatever the body is, it is discarded.
        self.client
            .execute(RequestDescriptor::delete(self.item_path(id)).expect(ResponseKind::Binary))
            .await
            .map(|_| ())
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: String,
        body: &B,
    ) -> Result<Option<R>, ApiError> {
        let descriptor = RequestDescriptor::new(method, path)
            .with_serialized(body)
            .map_err(|e| ApiError::InvalidRequest(format!("cannot serialize body: {}", e)))?
            .expect(ResponseKind::Json);

        match self.client.execute(descriptor).await? {
            // Also what a 201 with no body decodes to.
            ApiResponse::Json(Value::Object(map)) if map.is_empty() => Ok(None),
            response => response
                .deserialize()
                .map_err(|e| ApiError::Decode(e.to_string())),
        }
    }
}
