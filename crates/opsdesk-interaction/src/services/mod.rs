//! Thin domain wrappers over [`RequestClient`](crate::RequestClient).

mod auth_service;
mod resource;
mod resource_service;

pub use auth_service::{AuthService, Credentials};
pub use resource::{Book, Collection, Employee, Event, Material, Quotation, Resource};
pub use resource_service::ResourceService;
