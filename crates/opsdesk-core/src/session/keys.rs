//! Well-known keys in persistent client storage.

use strum::{AsRefStr, Display, EnumIter, IntoStaticStr};

/// Keys the session layer reads and writes in the [`KeyValueStore`](super::KeyValueStore).
///
/// The string forms are part of the on-disk format and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, EnumIter, IntoStaticStr)]
pub enum StorageKey {
    #[strum(serialize = "accessToken")]
    AccessToken,
    /// Written on login, never read by the request layer.
    #[strum(serialize = "refreshToken")]
    RefreshToken,
    #[strum(serialize = "id")]
    UserId,
    #[strum(serialize = "role")]
    Role,
}

impl StorageKey {
    /// Keys removed when the backend rejects the session (HTTP 401).
    pub const IDENTITY: [StorageKey; 2] = [StorageKey::UserId, StorageKey::Role];

    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_wire_names() {
        let names: Vec<&str> = StorageKey::iter().map(|k| k.as_str()).collect();
        assert_eq!(names, vec!["accessToken", "refreshToken", "id", "role"]);
    }

    #[test]
    fn test_display_matches_as_str() {
        assert_eq!(StorageKey::AccessToken.to_string(), "accessToken");
        assert_eq!(StorageKey::Role.as_ref(), "role");
    }
}
