//! File-backed persistent client storage.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::RwLock;

use opsdesk_core::session::KeyValueStore;
use opsdesk_core::Result;
use serde::{Deserialize, Serialize};

use crate::storage::AtomicTomlFile;

/// On-disk layout of `local_storage.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LocalStorageDocument {
    #[serde(default)]
    entries: BTreeMap<String, String>,
}

/// [`KeyValueStore`] persisted to a TOML file.
///
/// Reads are served from a cache populated on first access. Every write
/// locks the file, re-reads it, applies the change, saves atomically, and
/// refreshes the cache from what was written.
///
/// # Example
///
/// ```ignore
/// use opsdesk_infrastructure::TomlKeyValueStore;
/// use opsdesk_core::session::KeyValueStore;
///
/// let store = TomlKeyValueStore::with_path("local_storage.toml".into());
/// store.set("accessToken", "abc")?;
/// ```
pub struct TomlKeyValueStore {
    file: AtomicTomlFile<LocalStorageDocument>,
    cache: RwLock<Option<BTreeMap<String, String>>>,
}

impl TomlKeyValueStore {
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            file: AtomicTomlFile::new(path).private(),
            cache: RwLock::new(None),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        self.file.path()
    }

    fn entries(&self) -> Result<BTreeMap<String, String>> {
        {
            let guard = self
                .cache
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(ref cached) = *guard {
                return Ok(cached.clone());
            }
        }

        let loaded = self.file.load()?.unwrap_or_default().entries;
        tracing::debug!(
            "Loaded {} entries from {:?}",
            loaded.len(),
            self.file.path()
        );

        let mut guard = self
            .cache
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Some(loaded.clone());
        Ok(loaded)
    }

    fn modify<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let written = self.file.update(LocalStorageDocument::default(), |doc| {
            f(&mut doc.entries);
            Ok(())
        })?;

        let mut guard = self
            .cache
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Some(written.entries);
        Ok(())
    }
}

impl KeyValueStore for TomlKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.modify(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.modify(|entries| {
            entries.remove(key);
        })
    }

    fn remove_many(&self, keys: &[&str]) -> Result<()> {
        self.modify(|entries| {
            for key in keys {
                entries.remove(*key);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opsdesk_core::OpsdeskError;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = TomlKeyValueStore::with_path(dir.path().join("local_storage.toml"));
        assert_eq!(store.get("accessToken").unwrap(), None);
    }

    #[test]
    fn test_values_survive_a_new_instance() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("local_storage.toml");

        let first = TomlKeyValueStore::with_path(path.clone());
        first.set("accessToken", "abc").unwrap();
        first.set("id", "7").unwrap();

        let second = TomlKeyValueStore::with_path(path);
        assert_eq!(second.get("accessToken").unwrap().as_deref(), Some("abc"));
        assert_eq!(second.get("id").unwrap().as_deref(), Some("7"));
    }

    #[test]
    fn test_remove_many_writes_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("local_storage.toml");
        let store = TomlKeyValueStore::with_path(path.clone());
        store.set("id", "7").unwrap();
        store.set("role", "admin").unwrap();
        store.set("accessToken", "t").unwrap();

        store.remove_many(&["id", "role"]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("accessToken"));
        assert!(!content.contains("role"));
        assert_eq!(store.get("id").unwrap(), None);
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("local_storage.toml");
        fs::write(&path, "entries = 12 = 3").unwrap();
        let store = TomlKeyValueStore::with_path(path);
        let err = store.get("accessToken").unwrap_err();
        assert!(matches!(err, OpsdeskError::Serialization { .. }));
    }
}
