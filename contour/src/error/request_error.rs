//! Request construction errors.

use thiserror::Error;

/// Errors while turning an endpoint definition plus parameters into a request.
#[derive(Debug, Error)]
pub enum RequestError {
    /// A `{placeholder}` in the path template has no matching parameter.
    #[error("Missing path parameter: {name}")]
    MissingPathParam {
        /// The placeholder name.
        name: String,
    },

    /// A path parameter resolved to an array or object.
    #[error("Path parameter {name} must be a scalar value")]
    NonScalarPathParam {
        /// The placeholder name.
        name: String,
    },

    /// Parameters must be an object (or null when the endpoint takes none).
    #[error("Request parameters must be an object")]
    ParamsNotObject,

    /// The final URL could not be assembled.
    #[error("Invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}
