//! HTTP layer for the management-console backend.
//!
//! [`RequestClient`] is the only place that talks to the network. Domain
//! callers go through it directly or through the thin wrappers in
//! [`services`].

pub mod decode;
pub mod error;
pub mod request_client;
pub mod services;
pub mod transport;

pub use error::ApiError;
pub use request_client::RequestClient;
pub use services::{AuthService, Collection, Credentials, Resource, ResourceService};
pub use transport::{OutgoingBody, OutgoingRequest, RawResponse, ReqwestTransport, Transport};
