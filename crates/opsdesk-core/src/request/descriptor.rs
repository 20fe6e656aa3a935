//! Per-call request description.

use serde::Serialize;

use crate::request::body::{MultipartForm, RequestBody};
use crate::request::method::HttpMethod;
use crate::request::response::ResponseKind;
use crate::session::token::AuthToken;

/// Everything needed to issue one call. Built fresh by each caller and
/// consumed by the request client.
///
/// # Example
///
/// ```
/// use opsdesk_core::request::{HttpMethod, RequestDescriptor, ResponseKind};
/// use serde_json::json;
///
/// let request = RequestDescriptor::post("books")
///     .with_json(json!({"title": "Dune"}))
///     .expect(ResponseKind::Json);
/// assert_eq!(request.method, HttpMethod::Post);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    /// Path relative to the configured base address.
    pub path: String,
    pub method: HttpMethod,
    /// Overrides the token held by the session's token store.
    pub token: Option<AuthToken>,
    pub body: Option<RequestBody>,
    pub kind: ResponseKind,
}

impl RequestDescriptor {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method,
            token: None,
            body: None,
            kind: ResponseKind::default(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    pub fn with_token(mut self, token: AuthToken) -> Self {
        self.token = Some(token);
        self
    }

    pub fn with_json(mut self, value: serde_json::Value) -> Self {
        self.body = Some(RequestBody::Json(value));
        self
    }

    /// Serializes `body` to a JSON value up front so the descriptor stays
    /// independent of the caller's types.
    pub fn with_serialized<T: Serialize + ?Sized>(
        self,
        body: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(self.with_json(serde_json::to_value(body)?))
    }

    pub fn with_form(mut self, form: MultipartForm) -> Self {
        self.body = Some(RequestBody::Multipart(form));
        self
    }

    pub fn expect(mut self, kind: ResponseKind) -> Self {
        self.kind = kind;
        self
    }
}
