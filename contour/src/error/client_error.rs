//! HTTP transport errors.

use std::time::Duration;

use thiserror::Error;

/// Errors from the HTTP client layer.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed due to network or protocol error.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server returned a non-success status for which no response scenario was declared.
    #[error("HTTP {status}: {message}")]
    HttpStatus {
        /// The HTTP status code returned.
        status: u16,
        /// Error message from the response body.
        message: String,
    },

    /// Request exceeded the configured timeout.
    #[error("Request timeout after {duration_ms}ms")]
    Timeout {
        /// The timeout duration in milliseconds.
        duration_ms: u64,
    },

    /// Failed to build the HTTP request or establish a connection.
    #[error("Connection failed: {0}")]
    Connection(String),
}

impl ClientError {
    /// Classifies a `reqwest` failure: timeouts become [`ClientError::Timeout`]
    /// and failed connects become [`ClientError::Connection`].
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                duration_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            }
        } else if err.is_connect() {
            Self::Connection(err.to_string())
        } else {
            Self::Request(err)
        }
    }

    /// Returns `true` if retrying the whole exchange may succeed.
    ///
    /// Timeouts, connection failures, 5xx and 429 are retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Connection(_) => true,
            Self::HttpStatus { status, .. } => *status >= 500 || *status == 429,
            Self::Request(e) => e.is_timeout() || e.is_connect(),
        }
    }

    /// Returns the HTTP status code if this is an HTTP status error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            Self::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_is_retryable() {
        let err = ClientError::Timeout { duration_ms: 5000 };
        assert!(err.is_retryable());
        assert_eq!(err.status_code(), None);
    }

    #[test]
    fn test_status_retryability() {
        let server = ClientError::HttpStatus {
            status: 503,
            message: "Service Unavailable".to_string(),
        };
        let throttled = ClientError::HttpStatus {
            status: 429,
            message: "Too Many Requests".to_string(),
        };
        let bad = ClientError::HttpStatus {
            status: 400,
            message: "Bad Request".to_string(),
        };
        assert!(server.is_retryable());
        assert!(throttled.is_retryable());
        assert!(!bad.is_retryable());
        assert_eq!(bad.status_code(), Some(400));
    }
}
