//! Error types for the non-HTTP layers of opsdesk.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for storage, configuration and serialization failures.
///
/// HTTP failures have their own taxonomy (`ApiError` in `opsdesk-interaction`);
/// this type only covers what happens on the client machine.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpsdeskError {
    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Persistent client storage could not be read or written
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON"
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl OpsdeskError {
    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is a storage error
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Check if this is a config error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

impl From<std::io::Error> for OpsdeskError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for OpsdeskError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for OpsdeskError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for OpsdeskError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, OpsdeskError>`.
pub type Result<T> = std::result::Result<T, OpsdeskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_conversion_keeps_kind() {
        let err: OpsdeskError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
        match err {
            OpsdeskError::Io { message } => assert!(message.contains("PermissionDenied")),
            other => panic!("expected Io, got {other:?}"),
        }
    }

    #[test]
    fn test_json_error_conversion() {
        let parse = serde_json::from_str::<serde_json::Value>("{ nope");
        let err: OpsdeskError = parse.unwrap_err().into();
        assert!(matches!(err, OpsdeskError::Serialization { ref format, .. } if format == "JSON"));
    }

    #[test]
    fn test_helpers() {
        assert!(OpsdeskError::storage("x").is_storage());
        assert!(OpsdeskError::config("x").is_config());
        assert!(!OpsdeskError::internal("x").is_config());
    }
}
