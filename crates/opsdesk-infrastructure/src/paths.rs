//! Unified path management for opsdesk files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/opsdesk/           # Config directory (platform config dir)
//! ├── config.toml              # Client configuration
//! ├── local_storage.toml       # Persistent client storage (token, identity)
//! └── logs/                    # Application logs
//!     └── opsdesk.log.YYYY-MM-DD
//! ```

use std::path::{Path, PathBuf};
use thiserror::Error;

const APP_DIR_NAME: &str = "opsdesk";

/// Errors that can occur during path resolution.
#[derive(Debug, Error)]
pub enum PathError {
    #[error("Cannot find the platform config directory")]
    ConfigDirNotFound,
}

/// Resolves where opsdesk keeps its files.
///
/// `OpsdeskPaths::new(None)` uses the platform config directory;
/// `OpsdeskPaths::new(Some(dir))` roots everything under `dir` (tests and the
/// `--config-dir` flag).
#[derive(Debug, Clone, Default)]
pub struct OpsdeskPaths {
    base: Option<PathBuf>,
}

impl OpsdeskPaths {
    pub fn new(base: Option<&Path>) -> Self {
        Self {
            base: base.map(Path::to_path_buf),
        }
    }

    /// Returns the opsdesk configuration directory.
    pub fn config_dir(&self) -> Result<PathBuf, PathError> {
        match &self.base {
            Some(base) => Ok(base.clone()),
            None => dirs::config_dir()
                .map(|dir| dir.join(APP_DIR_NAME))
                .ok_or(PathError::ConfigDirNotFound),
        }
    }

    pub fn config_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("config.toml"))
    }

    /// Returns the path of the persistent client storage file.
    ///
    /// # Security Note
    ///
    /// This file holds the bearer token; it is written with 0600 permissions.
    pub fn local_storage_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("local_storage.toml"))
    }

    pub fn logs_dir(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("logs"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_under_custom_base() {
        let paths = OpsdeskPaths::new(Some(Path::new("/tmp/opsdesk-test")));
        assert_eq!(
            paths.config_file().unwrap(),
            PathBuf::from("/tmp/opsdesk-test/config.toml")
        );
        assert_eq!(
            paths.local_storage_file().unwrap(),
            PathBuf::from("/tmp/opsdesk-test/local_storage.toml")
        );
        assert_eq!(
            paths.logs_dir().unwrap(),
            PathBuf::from("/tmp/opsdesk-test/logs")
        );
    }

    #[test]
    fn test_default_paths_end_with_app_dir() {
        if let Ok(dir) = OpsdeskPaths::default().config_dir() {
            assert!(dir.ends_with(APP_DIR_NAME));
        }
    }
}
