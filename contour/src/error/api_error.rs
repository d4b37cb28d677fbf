//! Top-level API error type.

use super::{AuthError, ClientError, ConfigError, RequestError, ValidationError};
use thiserror::Error;

/// Top-level error type for executing an endpoint.
///
/// ## Examples
///
/// ```rust,ignore
/// use contour::error::ApiError;
///
/// fn handle_error(err: ApiError) {
///     match err {
///         ApiError::Client(e) => eprintln!("Network error: {e}"),
///         ApiError::Validation(e) => eprintln!("Malformed response: {e}"),
///         ApiError::Auth(e) => eprintln!("Auth failed: {e}"),
///         ApiError::Config(e) => eprintln!("Configuration error: {e}"),
///         ApiError::Request(e) => eprintln!("Bad request: {e}"),
///     }
/// }
/// ```
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP transport errors (network, timeout, unexpected status).
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Response (or parameter) validation errors.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Authentication and authorization errors.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Configuration errors surfacing at request time.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Request construction errors.
    #[error(transparent)]
    Request(#[from] RequestError),
}

impl ApiError {
    /// Returns the validation error when the failure came from response shaping.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(e) => Some(e),
            _ => None,
        }
    }
}
