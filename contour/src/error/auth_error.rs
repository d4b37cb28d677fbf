//! Authentication and authorization errors.

use thiserror::Error;

/// Errors related to API authentication.
#[derive(Debug, Error)]
pub enum AuthError {
    /// None of the configured environment variables holds a credential.
    #[error("Missing credential: none of [{}] is set", env_vars.join(", "))]
    MissingCredential {
        /// The environment variables that were tried, in order.
        env_vars: Vec<String>,
    },

    /// The credential cannot be used in a header.
    #[error("Invalid API key format")]
    InvalidKeyFormat,

    /// Server rejected the authentication credentials (HTTP 401).
    #[error("Authentication failed: {message}")]
    AuthenticationFailed {
        /// Error message from the server.
        message: String,
    },

    /// Server refused the operation (HTTP 403).
    #[error("Insufficient permissions: {operation}")]
    InsufficientPermissions {
        /// The endpoint that was denied.
        operation: String,
    },
}

impl AuthError {
    /// Returns `true` if supplying different credentials might resolve the error.
    pub fn is_credential_problem(&self) -> bool {
        matches!(
            self,
            Self::MissingCredential { .. } | Self::AuthenticationFailed { .. }
        )
    }
}
