//! Client configuration model.
//!
//! Loaded from `config.toml` by `opsdesk_infrastructure::ConfigService`. Every
//! field has a default so a partially written file still deserializes.

use serde::{Deserialize, Serialize};

/// Base address of the management-console REST API.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api/v1/";

/// Path (relative to the base address) of the login endpoint.
pub const DEFAULT_LOGIN_PATH: &str = "auth/login";

/// Client-side route the shell shows when the session is invalidated.
pub const LOGIN_ROUTE: &str = "/login";

/// Root configuration stored in `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub logging: LogSettings,
}

/// Settings for talking to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base address every request path is resolved against.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Client-wide request timeout in seconds. `None` leaves the transport
    /// default in place.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Login endpoint, relative to `base_url`.
    #[serde(default = "default_login_path")]
    pub login_path: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: None,
            login_path: default_login_path(),
        }
    }
}

/// Logging settings used by the binary when installing the subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSettings {
    /// Default filter directive when `OPSDESK_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Also write a daily-rolling log file under the logs directory.
    #[serde(default)]
    pub file_logging: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_logging: false,
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_login_path() -> String {
    DEFAULT_LOGIN_PATH.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_points_at_local_backend() {
        let config = ClientConfig::default();
        assert_eq!(config.api.base_url, "http://localhost:8080/api/v1/");
        assert_eq!(config.api.login_path, "auth/login");
        assert_eq!(config.api.timeout_secs, None);
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.file_logging);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: ClientConfig = toml::from_str(
            r#"
            [api]
            base_url = "https://console.example.com/api/v1/"
            "#,
        )
        .unwrap();
        assert_eq!(config.api.base_url, "https://console.example.com/api/v1/");
        assert_eq!(config.api.login_path, DEFAULT_LOGIN_PATH);
        assert_eq!(config.logging, LogSettings::default());
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config: ClientConfig = toml::from_str("").unwrap();
        assert_eq!(config, ClientConfig::default());
    }
}
