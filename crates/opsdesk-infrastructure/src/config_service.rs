//! Configuration service implementation.
//!
//! Loads the client configuration from `config.toml`, creating it with
//! defaults when missing, then applies environment overrides.

use std::path::PathBuf;
use std::sync::RwLock;

use opsdesk_core::config::ClientConfig;
use opsdesk_core::{OpsdeskError, Result};

use crate::paths::OpsdeskPaths;
use crate::storage::AtomicTomlFile;

/// Overrides `api.base_url`.
pub const ENV_BASE_URL: &str = "OPSDESK_API_BASE_URL";
/// Overrides `logging.level` (any `EnvFilter` directive).
pub const ENV_LOG: &str = "OPSDESK_LOG";

/// Configuration service that loads and caches the client configuration.
#[derive(Debug)]
pub struct ConfigService {
    path: PathBuf,
    config: RwLock<Option<ClientConfig>>,
}

impl ConfigService {
    pub fn new(paths: &OpsdeskPaths) -> Result<Self> {
        let path = paths
            .config_file()
            .map_err(|e| OpsdeskError::config(e.to_string()))?;
        Ok(Self::with_path(path))
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            config: RwLock::new(None),
        }
    }

    /// Gets the configuration, loading from file if not cached.
    pub fn get_config(&self) -> Result<ClientConfig> {
        {
            let read_lock = self
                .config
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(ref cached) = *read_lock {
                return Ok(cached.clone());
            }
        }

        let loaded = apply_env_overrides(self.load_or_create()?, |key| std::env::var(key).ok());
        validate(&loaded)?;

        let mut write_lock = self
            .config
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *write_lock = Some(loaded.clone());
        Ok(loaded)
    }

    fn load_or_create(&self) -> Result<ClientConfig> {
        let file = AtomicTomlFile::<ClientConfig>::new(self.path.clone());
        match file.load()? {
            Some(config) => Ok(config),
            None => {
                let default_config = ClientConfig::default();
                file.save(&default_config)?;
                tracing::info!("Created default configuration at {:?}", self.path);
                Ok(default_config)
            }
        }
    }
}

/// Applies `OPSDESK_*` overrides using `lookup` to read variables.
pub fn apply_env_overrides<F>(mut config: ClientConfig, lookup: F) -> ClientConfig
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(base_url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
        config.api.base_url = base_url;
    }
    if let Some(level) = lookup(ENV_LOG).filter(|v| !v.trim().is_empty()) {
        config.logging.level = level;
    }
    config
}

fn validate(config: &ClientConfig) -> Result<()> {
    let base = config.api.base_url.trim();
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        return Err(OpsdeskError::config(format!(
            "api.base_url must be an http(s) URL, got '{}'",
            config.api.base_url
        )));
    }
    if config.api.timeout_secs == Some(0) {
        return Err(OpsdeskError::config("api.timeout_secs must be greater than 0"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_created_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let service = ConfigService::with_path(path.clone());

        let config = service.get_config().unwrap();
        assert_eq!(config.api.login_path, "auth/login");
        assert!(path.exists());
    }

    #[test]
    fn test_reads_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[api]\nbase_url = \"https://console.internal/api/v1/\"\ntimeout_secs = 15\n",
        )
        .unwrap();

        let config = ConfigService::with_path(path).get_config().unwrap();
        assert_eq!(config.api.timeout_secs, Some(15));
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[api]\nbase_url = \"ftp://nope\"\n").unwrap();

        let err = ConfigService::with_path(path).get_config().unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_env_overrides() {
        let config = apply_env_overrides(ClientConfig::default(), |key| match key {
            ENV_BASE_URL => Some("https://staging/api/v1/".to_string()),
            ENV_LOG => Some("debug".to_string()),
            _ => None,
        });
        assert_eq!(config.api.base_url, "https://staging/api/v1/");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_blank_env_override_is_ignored() {
        let config = apply_env_overrides(ClientConfig::default(), |_| Some("  ".to_string()));
        assert_eq!(config, ClientConfig::default());
    }
}
