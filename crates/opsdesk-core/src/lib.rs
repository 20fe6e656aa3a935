//! Domain types shared by every opsdesk crate.
//!
//! Nothing in here performs network or file I/O directly; persistence is
//! reached through the [`session::KeyValueStore`] trait and the HTTP layer
//! lives in `opsdesk-interaction`.

pub mod config;
pub mod error;
pub mod request;
pub mod session;

pub use error::{OpsdeskError, Result};
