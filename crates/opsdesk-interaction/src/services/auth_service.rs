use std::fmt;
use std::sync::Arc;

use opsdesk_core::config::DEFAULT_LOGIN_PATH;
use opsdesk_core::request::HttpMethod;
use opsdesk_core::session::{AuthEvent, AuthToken, SessionIdentity};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;
use crate::request_client::RequestClient;

/// Username and password sent to the login endpoint.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"****")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    /// Numeric or string depending on the backend; stored as text.
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    role: Option<String>,
}

fn id_to_string(id: Value) -> Option<String> {
    match id {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// Login and logout on top of the shared [`RequestClient`] and its
/// [`TokenStore`](opsdesk_core::session::TokenStore).
pub struct AuthService {
    client: Arc<RequestClient>,
    login_path: String,
}

impl AuthService {
    pub fn new(client: Arc<RequestClient>) -> Self {
        Self::with_login_path(client, DEFAULT_LOGIN_PATH)
    }

    pub fn with_login_path(client: Arc<RequestClient>, login_path: impl Into<String>) -> Self {
        Self {
            client,
            login_path: login_path.into(),
        }
    }

    /// Exchanges credentials for a session.
    ///
    /// On success the access token, refresh token and identity are persisted
    /// and [`AuthEvent::LoggedIn`] is published. If any of them cannot be
    /// stored, the whole session is cleared and nothing is published. Rejected credentials surface
    /// as the server's error (`RequestFailed`, or `Unauthorized` for a 401).
    pub async fn login(&self, credentials: &Credentials) -> Result<SessionIdentity, ApiError> {
        tracing::info!("Logging in as '{}'", credentials.username);

        let response: LoginResponse = self
            .client
            .send_json(HttpMethod::Post, &self.login_path, credentials)
            .await?
            .ok_or_else(|| ApiError::Decode("login response had no body".to_string()))?;

        let token = AuthToken::new(response.access_token)
            .ok_or_else(|| ApiError::Decode("login response had an empty accessToken".to_string()))?;

        let identity = SessionIdentity {
            user_id: response.id.and_then(id_to_string),
            role: response.role,
        };

        // The access token goes last: a session is never visible without
        // the identity that belongs to it.
        let tokens = self.client.tokens();
        let persisted = tokens
            .write_refresh_token(response.refresh_token.as_deref())
            .and_then(|()| tokens.write_identity(&identity))
            .and_then(|()| tokens.write(Some(token)));
        if let Err(e) = persisted {
            if let Err(cleanup) = tokens.clear_all() {
                tracing::warn!("Failed to discard partial session: {}", cleanup);
            }
            return Err(e.into());
        }

        self.client.events().publish(AuthEvent::LoggedIn {
            user_id: identity.user_id.clone(),
        });
        tracing::info!(user_id = ?identity.user_id, role = ?identity.role, "Logged in");
        Ok(identity)
    }

    /// Forgets the local session. The backend is not contacted.
    pub fn logout(&self) -> Result<(), ApiError> {
        self.client.tokens().clear_all()?;
        self.client.events().publish(AuthEvent::LoggedOut);
        tracing::info!("Logged out");
        Ok(())
    }

    /// Identity of the current session, `None` when no token is held.
    pub fn current_identity(&self) -> Option<SessionIdentity> {
        let tokens = self.client.tokens();
        tokens.is_authenticated().then(|| tokens.identity())
    }
}
