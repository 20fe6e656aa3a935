//! Network seam between [`RequestClient`](crate::RequestClient) and the wire.

use std::time::Duration;

use async_trait::async_trait;
use opsdesk_core::request::{FormValue, HttpMethod, MultipartForm};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, Url};

use crate::error::ApiError;

/// A fully resolved request, ready to be put on the wire.
#[derive(Debug, Clone)]
pub struct OutgoingRequest {
    pub method: HttpMethod,
    pub url: Url,
    /// Header names are lowercase.
    pub headers: Vec<(String, String)>,
    pub body: OutgoingBody,
}

impl OutgoingRequest {
    /// First value of header `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OutgoingBody {
    None,
    /// Already-serialized JSON bytes.
    Json(Vec<u8>),
    /// Encoded by the transport, which also sets the multipart content type.
    Multipart(MultipartForm),
}

/// What came back, before any interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub status_text: String,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one request and returns the raw response.
///
/// Implementations return `Err` only when no response was received; every
/// HTTP status, including 4xx and 5xx, is an `Ok(RawResponse)`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: OutgoingRequest) -> Result<RawResponse, ApiError>;
}

/// Production transport backed by a shared `reqwest::Client`.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Builds the transport. `timeout` applies to every request.
    pub fn new(timeout: Option<Duration>) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

fn to_reqwest_form(form: MultipartForm) -> Result<reqwest::multipart::Form, ApiError> {
    let mut out = reqwest::multipart::Form::new();
    for part in form.into_parts() {
        out = match part.value {
            FormValue::Text(value) => out.text(part.name, value),
            FormValue::File {
                file_name,
                content_type,
                bytes,
            } => {
                let mut file_part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
                if let Some(content_type) = content_type {
                    file_part = file_part.mime_str(&content_type)?;
                }
                out.part(part.name, file_part)
            }
        };
    }
    Ok(out)
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: OutgoingRequest) -> Result<RawResponse, ApiError> {
        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), request.url);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder = match request.body {
            OutgoingBody::None => builder,
            OutgoingBody::Json(bytes) => builder.body(bytes),
            OutgoingBody::Multipart(form) => builder.multipart(to_reqwest_form(form)?),
        };

        let response = builder.send().await?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?.to_vec();

        Ok(RawResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            content_type,
            body,
        })
    }
}
