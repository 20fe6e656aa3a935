//! Generic typed request helper with bearer authentication.

use std::sync::Arc;
use std::time::Duration;

use opsdesk_core::config::ApiSettings;
use opsdesk_core::request::{
    ApiResponse, Binary, HttpMethod, RequestBody, RequestDescriptor, ResponseKind,
};
use opsdesk_core::session::{AuthEvent, SessionEvents, TokenStore};
use reqwest::Url;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::decode;
use crate::error::ApiError;
use crate::transport::{OutgoingBody, OutgoingRequest, ReqwestTransport, Transport};

const JSON_CONTENT_TYPE: &str = "application/json";

/// Issues one request per call against the configured base address.
///
/// Responsibilities:
/// - resolve the path against the base address
/// - attach `Authorization: Bearer` from the explicit token or the [`TokenStore`]
/// - encode JSON bodies (multipart bodies are left to the transport)
/// - on 401, invalidate the session and publish [`AuthEvent::Unauthorized`]
/// - decode success bodies according to the requested [`ResponseKind`]
///
/// Does NOT retry, cache, de-duplicate, or cancel requests.
#[derive(Clone)]
pub struct RequestClient {
    transport: Arc<dyn Transport>,
    base_url: Url,
    tokens: Arc<TokenStore>,
    events: SessionEvents,
}

impl RequestClient {
    pub fn new(
        base_url: &str,
        transport: Arc<dyn Transport>,
        tokens: Arc<TokenStore>,
        events: SessionEvents,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            transport,
            base_url: normalize_base_url(base_url)?,
            tokens,
            events,
        })
    }

    /// Client over [`ReqwestTransport`] configured from `settings`.
    pub fn from_settings(
        settings: &ApiSettings,
        tokens: Arc<TokenStore>,
        events: SessionEvents,
    ) -> Result<Self, ApiError> {
        let transport = ReqwestTransport::new(settings.timeout_secs.map(Duration::from_secs))?;
        Self::new(&settings.base_url, Arc::new(transport), tokens, events)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn tokens(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    pub fn events(&self) -> &SessionEvents {
        &self.events
    }

    /// Resolves `path` against the base address. A leading `/` is ignored and
    /// query strings are kept.
    ///
    /// The result must stay on the base origin and under the base path, so
    /// absolute, scheme-relative, backslash and `..` forms that would carry
    /// the token elsewhere are rejected.
    pub fn resolve(&self, path: &str) -> Result<Url, ApiError> {
        let relative = path.trim().trim_start_matches('/');
        let url = self
            .base_url
            .join(relative)
            .map_err(|e| ApiError::InvalidRequest(format!("cannot resolve '{}': {}", path, e)))?;

        if url.origin() != self.base_url.origin() || !url.path().starts_with(self.base_url.path())
        {
            return Err(ApiError::InvalidRequest(format!(
                "path '{}' resolves outside the base address {}",
                path, self.base_url
            )));
        }
        Ok(url)
    }

    /// Builds the wire request for `descriptor` without sending it.
    pub fn build_request(&self, descriptor: &RequestDescriptor) -> Result<OutgoingRequest, ApiError> {
        let url = self.resolve(&descriptor.path)?;
        let mut headers = Vec::new();

        let token = descriptor.token.clone().or_else(|| self.tokens.read());
        if let Some(token) = token {
            headers.push(("authorization".to_string(), token.bearer()));
        }

        let body = match &descriptor.body {
            None => OutgoingBody::None,
            Some(_) if !descriptor.method.allows_body() => {
                tracing::debug!("Dropping body supplied for GET {}", descriptor.path);
                OutgoingBody::None
            }
            Some(RequestBody::Multipart(form)) => OutgoingBody::Multipart(form.clone()),
            Some(RequestBody::Json(value)) => {
                let bytes = serde_json::to_vec(value).map_err(|e| {
                    ApiError::InvalidRequest(format!("cannot serialize body: {}", e))
                })?;
                headers.push(("content-type".to_string(), JSON_CONTENT_TYPE.to_string()));
                OutgoingBody::Json(bytes)
            }
        };

        Ok(OutgoingRequest {
            method: descriptor.method,
            url,
            headers,
            body,
        })
    }

    /// Performs one round trip.
    pub async fn execute(&self, descriptor: RequestDescriptor) -> Result<ApiResponse, ApiError> {
        let request = self.build_request(&descriptor)?;
        tracing::debug!(method = %request.method, url = %request.url, "Dispatching request");

        let response = self.transport.send(request).await?;
        tracing::debug!(
            method = %descriptor.method,
            path = %descriptor.path,
            status = response.status,
            "Received response"
        );

        if response.status == 401 {
            self.invalidate_session(&descriptor);
            return Err(ApiError::Unauthorized);
        }

        if !response.is_success() {
            return Err(decode::request_failed(&response));
        }

        decode::decode_success(response, descriptor.kind)
    }

    /// Session teardown for a 401. Storage failures are logged rather than
    /// returned: the caller needs to see `Unauthorized`, and the in-memory
    /// token is gone either way.
    fn invalidate_session(&self, descriptor: &RequestDescriptor) {
        tracing::warn!(
            method = %descriptor.method,
            path = %descriptor.path,
            "Session rejected by server; clearing credentials"
        );
        if let Err(e) = self.tokens.invalidate() {
            tracing::warn!("Failed to clear session from storage: {}", e);
        }
        self.events.publish(AuthEvent::Unauthorized {
            method: descriptor.method,
            path: descriptor.path.clone(),
        });
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse, ApiError> {
        self.execute(RequestDescriptor::get(path)).await
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<ApiResponse, ApiError> {
        self.execute(RequestDescriptor::post(path).with_json(body)).await
    }

    pub async fn put(&self, path: &str, body: Value) -> Result<ApiResponse, ApiError> {
        self.execute(RequestDescriptor::put(path).with_json(body)).await
    }

    pub async fn patch(&self, path: &str, body: Value) -> Result<ApiResponse, ApiError> {
        self.execute(RequestDescriptor::patch(path).with_json(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<ApiResponse, ApiError> {
        self.execute(RequestDescriptor::delete(path)).await
    }

    /// GET `path` and deserialize the JSON body. An empty body is `Ok(None)`.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, ApiError> {
        let response = self
            .execute(RequestDescriptor::get(path).expect(ResponseKind::Json))
            .await?;
        deserialize(response)
    }

    /// Sends `body` as JSON with `method` and deserializes the JSON reply.
    pub async fn send_json<B, T>(
        &self,
        method: HttpMethod,
        path: &str,
        body: &B,
    ) -> Result<Option<T>, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let descriptor = RequestDescriptor::new(method, path)
            .with_serialized(body)
            .map_err(|e| ApiError::InvalidRequest(format!("cannot serialize body: {}", e)))?
            .expect(ResponseKind::Json);
        deserialize(self.execute(descriptor).await?)
    }

    /// GET `path` as a single binary blob.
    pub async fn download(&self, path: &str) -> Result<Binary, ApiError> {
        let response = self
            .execute(RequestDescriptor::get(path).expect(ResponseKind::Binary))
            .await?;
        response
            .into_binary()
            .ok_or_else(|| ApiError::Decode("expected a binary response".to_string()))
    }
}

fn deserialize<T: DeserializeOwned>(response: ApiResponse) -> Result<Option<T>, ApiError> {
    response
        .deserialize()
        .map_err(|e| ApiError::Decode(e.to_string()))
}

fn normalize_base_url(raw: &str) -> Result<Url, ApiError> {
    let mut base = raw.trim().to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    let url = Url::parse(&base)
        .map_err(|e| ApiError::InvalidRequest(format!("invalid base URL '{}': {}", raw, e)))?;
    if url.cannot_be_a_base() {
        return Err(ApiError::InvalidRequest(format!(
            "base URL '{}' cannot have relative paths",
            raw
        )));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::RawResponse;
    use async_trait::async_trait;
    use opsdesk_core::session::{AuthToken, InMemoryKeyValueStore};

    struct Unreachable;

    #[async_trait]
    impl Transport for Unreachable {
        async fn send(&self, _request: OutgoingRequest) -> Result<RawResponse, ApiError> {
            Err(ApiError::Transport("connection refused".to_string()))
        }
    }

    fn client(base: &str) -> RequestClient {
        let tokens = Arc::new(TokenStore::new(Arc::new(InMemoryKeyValueStore::new())));
        RequestClient::new(base, Arc::new(Unreachable), tokens, SessionEvents::new()).unwrap()
    }

    #[test]
    fn test_base_without_trailing_slash_keeps_last_segment() {
        let client = client("http://localhost:8080/api/v1");
        assert_eq!(
            client.resolve("books/42").unwrap().as_str(),
            "http://localhost:8080/api/v1/books/42"
        );
    }

    #[test]
    fn test_leading_slash_and_query_are_handled() {
        let client = client("http://localhost:8080/api/v1/");
        assert_eq!(
            client.resolve("/employees?page=2&size=10").unwrap().as_str(),
            "http://localhost:8080/api/v1/employees?page=2&size=10"
        );
    }

    #[test]
    fn test_absolute_path_is_rejected() {
        let client = client("http://localhost:8080/api/v1/");
        assert!(matches!(
            client.resolve("https://elsewhere.example/steal"),
            Err(ApiError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_paths_escaping_the_base_are_rejected() {
        let client = client("http://localhost:8080/api/v1/");
        for path in [
            "https:evil.example/steal",
            "\\\\evil.example/steal",
            "../../../other",
            "books/../../v2/books",
        ] {
            assert!(
                matches!(client.resolve(path), Err(ApiError::InvalidRequest(_))),
                "{path} should be rejected"
            );
        }
    }

    #[test]
    fn test_leading_slashes_stay_under_the_base() {
        let client = client("http://localhost:8080/api/v1/");
        assert_eq!(
            client.resolve("//books").unwrap().as_str(),
            "http://localhost:8080/api/v1/books"
        );
    }

    #[test]
    fn test_dot_segments_inside_the_base_are_allowed() {
        let client = client("http://localhost:8080/api/v1/");
        assert_eq!(
            client.resolve("books/archive/../42").unwrap().as_str(),
            "http://localhost:8080/api/v1/books/42"
        );
    }

    #[test]
    fn test_token_is_not_attached_to_foreign_url() {
        let client = client("http://localhost:8080/api/v1/");
        client.tokens().write(AuthToken::new("SECRET")).unwrap();
        for path in ["https:evil.example/steal", "\\\\evil.example/steal", "../../../other"] {
            assert!(client.build_request(&RequestDescriptor::get(path)).is_err());
        }
    }

    #[test]
    fn test_invalid_base_url() {
        let tokens = Arc::new(TokenStore::new(Arc::new(InMemoryKeyValueStore::new())));
        let result =
            RequestClient::new("not a url", Arc::new(Unreachable), tokens, SessionEvents::new());
        assert!(matches!(result, Err(ApiError::InvalidRequest(_))));
    }

    #[test]
    fn test_get_drops_body() {
        let client = client("http://localhost/api/v1/");
        let request = client
            .build_request(&RequestDescriptor::get("books").with_json(serde_json::json!({"q": 1})))
            .unwrap();
        assert_eq!(request.body, OutgoingBody::None);
        assert_eq!(request.header("content-type"), None);
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let client = client("http://localhost/api/v1/");
        let err = client.get("books").await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }
}
