//! Failures of a request round trip.

use opsdesk_core::OpsdeskError;
use thiserror::Error;

/// Everything that can go wrong between building a request and decoding its
/// response. Returned to the caller in every case; the request layer never
/// swallows one.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP 401. By the time the caller sees this, the token and identity
    /// keys are cleared and an `AuthEvent::Unauthorized` has been published.
    #[error("Unauthorized: the session was rejected by the server")]
    Unauthorized,

    /// Any other non-2xx status.
    #[error("Request failed with status {status} {status_text}{}", message_suffix(.message))]
    RequestFailed {
        status: u16,
        status_text: String,
        message: Option<String>,
    },

    /// No response was received (DNS, refused connection, timeout, ...).
    #[error("Transport error: {0}")]
    Transport(String),

    /// A 2xx body did not match the requested response kind.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Auto decoding met a content type it does not know how to handle.
    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),

    /// The request could not be built (bad path, bad base URL, bad form part).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Persistent client storage failed while updating the session.
    #[error(transparent)]
    Storage(#[from] OpsdeskError),
}

fn message_suffix(message: &Option<String>) -> String {
    match message {
        Some(message) if !message.is_empty() => format!(": {}", message),
        _ => String::new(),
    }
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// HTTP status, when a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized => Some(401),
            Self::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Server-provided message of a failed request, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::RequestFailed { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            Self::InvalidRequest(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}
