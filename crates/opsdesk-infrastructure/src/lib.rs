pub mod config_service;
pub mod paths;
pub mod storage;
pub mod toml_key_value_store;

pub use crate::config_service::ConfigService;
pub use crate::paths::{OpsdeskPaths, PathError};
pub use crate::toml_key_value_store::TomlKeyValueStore;
