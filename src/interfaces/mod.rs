pub mod error;
pub mod http;

pub use error::{ApiError, ApiResult};
pub use http::{AppState, router};
