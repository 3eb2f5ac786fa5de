//! Error types for the gateway
//!
//! All errors detected within the core are converted to a structured error
//! object before leaving the dispatcher; no raw internal fault ever reaches
//! the HTTP boundary unshaped.

pub mod api_error;

pub use api_error::{ApiError, ApiResult};
