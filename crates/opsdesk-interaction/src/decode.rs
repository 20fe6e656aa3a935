//! Turning a [`RawResponse`] into an [`ApiResponse`] or an [`ApiError`].

use opsdesk_core::request::{ApiResponse, Binary, ResponseKind};
use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::transport::RawResponse;

const STATUS_CREATED: u16 = 201;

/// How a declared content type is treated by [`ResponseKind::Auto`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaClass {
    Json,
    Text,
    /// Document types wrapped as [`Binary`] (PDF quotations, exports).
    Document,
    Unknown,
}

/// Classifies a `Content-Type` header value by its essence
/// (parameters such as `charset` are ignored).
pub fn classify(content_type: &str) -> MediaClass {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if essence == "application/json" || essence.ends_with("+json") {
        MediaClass::Json
    } else if essence.starts_with("text/") {
        MediaClass::Text
    } else if essence == "application/pdf" || essence == "application/octet-stream" {
        MediaClass::Document
    } else {
        MediaClass::Unknown
    }
}

/// Decodes a 2xx response according to `kind`.
pub fn decode_success(response: RawResponse, kind: ResponseKind) -> Result<ApiResponse, ApiError> {
    if kind == ResponseKind::Binary {
        return Ok(ApiResponse::Binary(Binary {
            content_type: response.content_type,
            bytes: response.body,
        }));
    }

    if kind == ResponseKind::Text {
        return Ok(ApiResponse::Text(
            String::from_utf8_lossy(&response.body).into_owned(),
        ));
    }

    if response.body.is_empty() {
        return Ok(if response.status == STATUS_CREATED {
            ApiResponse::Json(Value::Object(Map::new()))
        } else {
            ApiResponse::Empty
        });
    }

    match kind {
        ResponseKind::Json => parse_json(&response.body),
        _ => decode_negotiated(response),
    }
}

fn decode_negotiated(response: RawResponse) -> Result<ApiResponse, ApiError> {
    let Some(content_type) = response.content_type else {
        return Err(ApiError::UnsupportedContentType(
            "<missing Content-Type>".to_string(),
        ));
    };

    match classify(&content_type) {
        MediaClass::Json => parse_json(&response.body),
        MediaClass::Text => Ok(ApiResponse::Text(
            String::from_utf8_lossy(&response.body).into_owned(),
        )),
        MediaClass::Document => Ok(ApiResponse::Binary(Binary {
            content_type: Some(content_type),
            bytes: response.body,
        })),
        MediaClass::Unknown => {
            tracing::warn!("Response with unsupported content type '{}'", content_type);
            Err(ApiError::UnsupportedContentType(content_type))
        }
    }
}

fn parse_json(body: &[u8]) -> Result<ApiResponse, ApiError> {
    serde_json::from_slice(body)
        .map(ApiResponse::Json)
        .map_err(|e| ApiError::Decode(format!("invalid JSON body: {}", e)))
}

/// Builds the error for a non-2xx, non-401 response.
pub fn request_failed(response: &RawResponse) -> ApiError {
    ApiError::RequestFailed {
        status: response.status,
        status_text: response.status_text.clone(),
        message: extract_error_message(&response.body),
    }
}

/// Best-effort human-readable message from an error body:
/// `{"message": ...}`, then `{"error": ...}`, then a bare JSON string.
pub fn extract_error_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    match value {
        Value::Object(map) => ["message", "error"].iter().find_map(|key| {
            map.get(*key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        }),
        Value::String(s) if !s.is_empty() => Some(s),
        _ => None,
    }
}
