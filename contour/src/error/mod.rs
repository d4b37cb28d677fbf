//! Layered error types for the crate.
//!
//! - [`ApiError`] - Top-level error type returned by the client
//! - [`ClientError`] - HTTP transport errors
//! - [`ValidationError`] - Malformed responses (path-annotated) and undecodable bodies
//! - [`AuthError`] - Authentication and authorization errors
//! - [`ConfigError`] - Definition-time misuse (shapes, endpoints, config documents)
//! - [`RequestError`] - Request construction failures

mod api_error;
mod auth_error;
mod client_error;
mod config_error;
mod request_error;
mod validation_error;

pub use api_error::ApiError;
pub use auth_error::AuthError;
pub use client_error::ClientError;
pub use config_error::ConfigError;
pub use request_error::RequestError;
pub use validation_error::ValidationError;
