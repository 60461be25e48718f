pub mod record;
pub mod resource;
pub mod utils;

use axum::http::Method;

use crate::error::ApiError;

// Re-export handler functions for use in routing
pub use record::delete as record_delete;
pub use record::get as record_get;
pub use record::put as record_put;

pub use resource::get as resource_get;
pub use resource::post as resource_post;

/// Any method without an operation mapping
pub async fn method_not_allowed(method: Method) -> ApiError {
    ApiError::method_not_allowed(method)
}
