//! Composition root: the one place shared services are created and wired.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use opsdesk_core::config::ClientConfig;
use opsdesk_core::session::{InMemoryKeyValueStore, KeyValueStore, SessionEvents, TokenStore};
use opsdesk_infrastructure::config_service::apply_env_overrides;
use opsdesk_infrastructure::{ConfigService, OpsdeskPaths, TomlKeyValueStore};
use opsdesk_interaction::{AuthService, RequestClient};

pub struct AppContext {
    pub config: ClientConfig,
    /// `None` when file logging has nowhere to go (ephemeral runs).
    pub logs_dir: Option<PathBuf>,
    pub client: Arc<RequestClient>,
    pub auth: AuthService,
}

impl AppContext {
    pub fn build(config_dir: Option<&Path>, ephemeral: bool) -> Result<Self> {
        let paths = OpsdeskPaths::new(config_dir);

        let (config, storage, logs_dir) = if ephemeral {
            let config = apply_env_overrides(ClientConfig::default(), |key| std::env::var(key).ok());
            let storage: Arc<dyn KeyValueStore> = Arc::new(InMemoryKeyValueStore::new());
            (config, storage, None)
        } else {
            let config = ConfigService::new(&paths)
                .and_then(|service| service.get_config())
                .context("Failed to load configuration")?;
            let storage_file = paths
                .local_storage_file()
                .context("Failed to resolve the local storage file")?;
            let storage: Arc<dyn KeyValueStore> = Arc::new(TomlKeyValueStore::with_path(storage_file));
            (config, storage, paths.logs_dir().ok())
        };

        let tokens = Arc::new(TokenStore::new(storage));
        let events = SessionEvents::new();
        let client = Arc::new(
            RequestClient::from_settings(&config.api, tokens, events)
                .context("Failed to create the HTTP client")?,
        );
        let auth = AuthService::with_login_path(client.clone(), config.api.login_path.clone());

        Ok(Self {
            config,
            logs_dir,
            client,
            auth,
        })
    }
}
