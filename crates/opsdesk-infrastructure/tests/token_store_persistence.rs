use std::sync::Arc;

use opsdesk_core::session::{AuthToken, KeyValueStore, SessionIdentity, TokenStore};
use opsdesk_infrastructure::{OpsdeskPaths, TomlKeyValueStore};
use tempfile::TempDir;

fn open(dir: &TempDir) -> (Arc<TomlKeyValueStore>, TokenStore) {
    let path = OpsdeskPaths::new(Some(dir.path()))
        .local_storage_file()
        .expect("path under temp dir");
    let storage = Arc::new(TomlKeyValueStore::with_path(path));
    let tokens = TokenStore::new(storage.clone());
    (storage, tokens)
}

#[test]
fn test_token_survives_restart() {
    let dir = TempDir::new().unwrap();

    {
        let (_, tokens) = open(&dir);
        tokens.write(AuthToken::new("persisted-token")).unwrap();
        tokens
            .write_identity(&SessionIdentity {
                user_id: Some("12".to_string()),
                role: Some("hr".to_string()),
            })
            .unwrap();
    }

    let (_, tokens) = open(&dir);
    assert_eq!(tokens.read().unwrap().expose(), "persisted-token");
    assert_eq!(tokens.identity().user_id.as_deref(), Some("12"));
}

#[test]
fn test_clear_removes_key_from_file() {
    let dir = TempDir::new().unwrap();
    let (storage, tokens) = open(&dir);

    tokens.write(AuthToken::new("t")).unwrap();
    tokens.clear().unwrap();

    assert_eq!(storage.get("accessToken").unwrap(), None);
    let (_, reopened) = open(&dir);
    assert!(reopened.read().is_none());
}

#[test]
fn test_logout_leaves_no_session_keys() {
    let dir = TempDir::new().unwrap();
    let (storage, tokens) = open(&dir);

    tokens.write(AuthToken::new("t")).unwrap();
    tokens.write_refresh_token(Some("r")).unwrap();
    tokens
        .write_identity(&SessionIdentity {
            user_id: Some("1".to_string()),
            role: Some("admin".to_string()),
        })
        .unwrap();

    tokens.clear_all().unwrap();

    for key in ["accessToken", "refreshToken", "id", "role"] {
        assert_eq!(storage.get(key).unwrap(), None, "{key} should be gone");
    }
}
