//! Shapes of one outbound call and its decoded result.

pub mod body;
pub mod descriptor;
pub mod method;
pub mod response;

pub use body::{FormPart, FormValue, MultipartForm, RequestBody};
pub use descriptor::RequestDescriptor;
pub use method::HttpMethod;
pub use response::{ApiResponse, Binary, ResponseKind};
