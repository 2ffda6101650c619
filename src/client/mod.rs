//! HTTP client wrapper around the remote console API.

pub mod api_client;
pub mod error;
pub mod request;

pub use api_client::ApiClient;
pub use error::{ApiError, Rejection};
pub use request::{ApiRequest, ApiResponse};
