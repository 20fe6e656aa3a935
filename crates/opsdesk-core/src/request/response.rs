//! Decoded results of a successful call.

use serde::de::DeserializeOwned;
use serde_json::Value;
use strum::{Display, EnumString};

/// What the caller expects back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ResponseKind {
    /// Decide from the declared `Content-Type`. Unknown types are an error,
    /// never a silent empty result.
    #[default]
    Auto,
    Json,
    Text,
    /// Raw bytes, whatever the declared content type.
    Binary,
}

/// A binary payload and the content type the server declared for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binary {
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Result of a call that reached the server and got a 2xx back.
///
/// `Empty` means the server returned no body; it is never used to signal a
/// failure.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    Json(Value),
    Text(String),
    Binary(Binary),
    Empty,
}

impl ApiResponse {
    pub fn is_empty(&self) -> bool {
        matches!(self, ApiResponse::Empty)
    }

    pub fn into_json(self) -> Option<Value> {
        match self {
            ApiResponse::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_binary(self) -> Option<Binary> {
        match self {
            ApiResponse::Binary(binary) => Some(binary),
            _ => None,
        }
    }

    /// Deserializes a JSON response into `T`. `Empty` yields `Ok(None)`;
    /// text and binary responses are reported as a type mismatch.
    pub fn deserialize<T: DeserializeOwned>(self) -> Result<Option<T>, serde_json::Error> {
        match self {
            ApiResponse::Json(value) => serde_json::from_value(value).map(Some),
            ApiResponse::Empty => Ok(None),
            ApiResponse::Text(_) | ApiResponse::Binary(_) => Err(serde::de::Error::custom(
                "expected a JSON response body",
            )),
        }
    }
}
