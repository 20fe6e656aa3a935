use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// HTTP verbs the backend exposes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    /// Whether a JSON body is sent for this method. GET requests never carry one.
    pub fn allows_body(&self) -> bool {
        !matches!(self, HttpMethod::Get)
    }
}
