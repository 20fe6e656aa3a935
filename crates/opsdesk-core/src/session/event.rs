//! Session lifecycle events.
//!
//! The request layer publishes [`AuthEvent::Unauthorized`] instead of
//! navigating anywhere itself; the application shell subscribes and decides
//! what "go to the login screen" means for it.

use tokio::sync::broadcast;

use crate::request::HttpMethod;

const CHANNEL_CAPACITY: usize = 64;

/// Something happened to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// The backend answered 401. The token and identity keys have already
    /// been cleared when this is delivered.
    Unauthorized { method: HttpMethod, path: String },
    LoggedIn { user_id: Option<String> },
    LoggedOut,
}

/// Broadcast hub for [`AuthEvent`]s.
///
/// Cloning is cheap and every clone publishes into the same channel.
#[derive(Debug, Clone)]
pub struct SessionEvents {
    sender: broadcast::Sender<AuthEvent>,
}

impl SessionEvents {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.sender.subscribe()
    }

    /// Publishes `event`. Having no subscribers is normal (one-shot CLI
    /// commands) and is not reported.
    pub fn publish(&self, event: AuthEvent) {
        if self.sender.send(event).is_err() {
            tracing::trace!("Auth event dropped: no subscribers");
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new()
    }
}
