//! Client session: the bearer token, the identity cached next to it, and the
//! events published when either changes.

pub mod event;
pub mod keys;
pub mod store;
pub mod token;
pub mod token_store;

pub use event::{AuthEvent, SessionEvents};
pub use keys::StorageKey;
pub use store::{InMemoryKeyValueStore, KeyValueStore};
pub use token::AuthToken;
pub use token_store::{SessionIdentity, TokenStore};
