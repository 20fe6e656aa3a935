//! Single source of truth for the current bearer token.

use std::sync::{Arc, RwLock};

use crate::error::Result;
use crate::session::keys::StorageKey;
use crate::session::store::KeyValueStore;
use crate::session::token::AuthToken;

/// Identity the backend returned on login, cached next to the token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionIdentity {
    pub user_id: Option<String>,
    pub role: Option<String>,
}

/// Holds the current [`AuthToken`] and mirrors it to persistent storage.
///
/// One instance is created by the composition root and shared as
/// `Arc<TokenStore>`; every clone of that `Arc` observes the same value.
/// The in-memory copy is loaded lazily from storage on first [`read`](Self::read).
///
/// A request that reads the token just before a concurrent 401 clears it can
/// still send the stale value. That race is accepted: the backend rejects the
/// stale token and the second 401 clears an already-empty store.
pub struct TokenStore {
    storage: Arc<dyn KeyValueStore>,
    /// `None` until the first access loads from storage.
    current: RwLock<Option<Option<AuthToken>>>,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            storage,
            current: RwLock::new(None),
        }
    }

    /// Returns the current token, initializing from storage on first access.
    ///
    /// A storage failure during initialization is logged and treated as
    /// "no token"; the next successful [`write`](Self::write) repairs it.
    pub fn read(&self) -> Option<AuthToken> {
        {
            let guard = self
                .current
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(ref loaded) = *guard {
                return loaded.clone();
            }
        }

        let loaded = match self.storage.get(StorageKey::AccessToken.as_str()) {
            Ok(raw) => raw.and_then(AuthToken::new),
            Err(e) => {
                tracing::warn!("Failed to load access token from storage: {}", e);
                None
            }
        };

        let mut guard = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // Another caller may have written while we were loading; theirs wins.
        guard.get_or_insert(loaded).clone()
    }

    /// Replaces the token. Storage is updated first so memory never holds a
    /// value the persistent copy does not.
    pub fn write(&self, token: Option<AuthToken>) -> Result<()> {
        let key = StorageKey::AccessToken.as_str();
        match &token {
            Some(token) => self.storage.set(key, token.expose())?,
            None => self.storage.remove(key)?,
        }

        let mut guard = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Some(token);
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        self.write(None)
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().is_some()
    }

    pub fn write_refresh_token(&self, refresh_token: Option<&str>) -> Result<()> {
        let key = StorageKey::RefreshToken.as_str();
        match refresh_token.filter(|t| !t.is_empty()) {
            Some(value) => self.storage.set(key, value),
            None => self.storage.remove(key),
        }
    }

    /// Reads the cached identity straight from storage.
    pub fn identity(&self) -> SessionIdentity {
        let get = |key: StorageKey| match self.storage.get(key.as_str()) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Failed to read {} from storage: {}", key, e);
                None
            }
        };
        SessionIdentity {
            user_id: get(StorageKey::UserId),
            role: get(StorageKey::Role),
        }
    }

    pub fn write_identity(&self, identity: &SessionIdentity) -> Result<()> {
        for (key, value) in [
            (StorageKey::UserId, identity.user_id.as_deref()),
            (StorageKey::Role, identity.role.as_deref()),
        ] {
            match value {
                Some(value) => self.storage.set(key.as_str(), value)?,
                None => self.storage.remove(key.as_str())?,
            }
        }
        Ok(())
    }

    /// Removes `id` and `role`.
    pub fn clear_identity(&self) -> Result<()> {
        let keys: Vec<&str> = StorageKey::IDENTITY.iter().map(StorageKey::as_str).collect();
        self.storage.remove_many(&keys)
    }

    /// Drops the session after the backend rejected it: the token and the
    /// identity keys go, the refresh token stays.
    ///
    /// Memory is cleared before storage is touched, so even when the storage
    /// write fails no further request carries the rejected token.
    pub fn invalidate(&self) -> Result<()> {
        {
            let mut guard = self
                .current
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            *guard = Some(None);
        }

        let mut keys = vec![StorageKey::AccessToken.as_str()];
        keys.extend(StorageKey::IDENTITY.iter().map(StorageKey::as_str));
        self.storage.remove_many(&keys)
    }

    /// Logout: token, refresh token and identity are all removed.
    pub fn clear_all(&self) -> Result<()> {
        self.clear()?;
        self.write_refresh_token(None)?;
        self.clear_identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OpsdeskError;
    use crate::session::store::InMemoryKeyValueStore;

    fn store_with(entries: &[(&str, &str)]) -> (Arc<InMemoryKeyValueStore>, TokenStore) {
        let backing = Arc::new(InMemoryKeyValueStore::with_entries(entries.iter().copied()));
        let tokens = TokenStore::new(backing.clone());
        (backing, tokens)
    }

    #[test]
    fn test_read_initializes_from_storage() {
        let (_, tokens) = store_with(&[("accessToken", "persisted")]);
        assert_eq!(tokens.read().unwrap().expose(), "persisted");
    }

    #[test]
    fn test_read_empty_storage_is_absent() {
        let (_, tokens) = store_with(&[]);
        assert!(tokens.read().is_none());
        assert!(!tokens.is_authenticated());
    }

    #[test]
    fn test_write_persists_and_clear_removes_key() {
        let (backing, tokens) = store_with(&[]);

        tokens.write(AuthToken::new("t1")).unwrap();
        assert_eq!(backing.get("accessToken").unwrap().as_deref(), Some("t1"));
        assert_eq!(tokens.read().unwrap().expose(), "t1");

        tokens.clear().unwrap();
        assert_eq!(backing.get("accessToken").unwrap(), None);
        assert!(tokens.read().is_none());
    }

    #[test]
    fn test_write_after_cached_read_overrides_cache() {
        let (_, tokens) = store_with(&[("accessToken", "old")]);
        assert_eq!(tokens.read().unwrap().expose(), "old");
        tokens.write(AuthToken::new("new")).unwrap();
        assert_eq!(tokens.read().unwrap().expose(), "new");
    }

    #[test]
    fn test_clear_identity_leaves_token() {
        let (backing, tokens) = store_with(&[
            ("accessToken", "t"),
            ("refreshToken", "r"),
            ("id", "42"),
            ("role", "admin"),
        ]);
        tokens.clear_identity().unwrap();

        let left = backing.snapshot();
        assert!(left.contains_key("accessToken"));
        assert!(left.contains_key("refreshToken"));
        assert!(!left.contains_key("id"));
        assert!(!left.contains_key("role"));
    }

    #[test]
    fn test_clear_all_empties_storage() {
        let (backing, tokens) = store_with(&[
            ("accessToken", "t"),
            ("refreshToken", "r"),
            ("id", "42"),
            ("role", "admin"),
        ]);
        tokens.clear_all().unwrap();
        assert!(backing.snapshot().is_empty());
        assert!(tokens.read().is_none());
    }

    #[test]
    fn test_invalidate_keeps_refresh_token() {
        let (backing, tokens) = store_with(&[
            ("accessToken", "t"),
            ("refreshToken", "r"),
            ("id", "42"),
            ("role", "admin"),
        ]);
        tokens.invalidate().unwrap();

        let left = backing.snapshot();
        assert_eq!(left.len(), 1);
        assert!(left.contains_key("refreshToken"));
        assert!(tokens.read().is_none());
    }

    #[test]
    fn test_identity_roundtrip() {
        let (_, tokens) = store_with(&[]);
        let identity = SessionIdentity {
            user_id: Some("7".to_string()),
            role: Some("librarian".to_string()),
        };
        tokens.write_identity(&identity).unwrap();
        assert_eq!(tokens.identity(), identity);
    }

    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(OpsdeskError::storage("disk on fire"))
        }
        fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(OpsdeskError::storage("disk on fire"))
        }
        fn remove(&self, _key: &str) -> Result<()> {
            Err(OpsdeskError::storage("disk on fire"))
        }
    }

    #[test]
    fn test_failed_write_keeps_memory_unchanged() {
        let tokens = TokenStore::new(Arc::new(FailingStore));
        assert!(tokens.read().is_none());
        assert!(tokens.write(AuthToken::new("t")).is_err());
        assert!(tokens.read().is_none());
    }

    #[test]
    fn test_invalidate_clears_memory_even_when_storage_fails() {
        let tokens = TokenStore::new(Arc::new(FailingStore));
        // Seed memory directly; the failing store cannot hold a value.
        *tokens.current.write().unwrap() = Some(AuthToken::new("stale"));
        assert!(tokens.read().is_some());

        assert!(tokens.invalidate().is_err());
        assert!(tokens.read().is_none());
    }
}
