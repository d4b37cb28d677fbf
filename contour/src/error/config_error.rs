//! Definition-time configuration errors.

use thiserror::Error;

use crate::endpoint_id::EndpointIdError;

/// Errors in API, endpoint or response shape definitions.
///
/// These are raised while an API is being defined, never while a response is
/// being processed, and indicate a programming error to fix.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A required configuration field is missing.
    #[error("Missing required field: {field}")]
    MissingField {
        /// The name of the missing field.
        field: &'static str,
    },

    /// Endpoint ID validation failed.
    #[error("Invalid endpoint ID: {0}")]
    InvalidEndpointId(#[from] EndpointIdError),

    /// Path template contains invalid parameter syntax.
    #[error("Invalid path template: {message}")]
    InvalidPathTemplate {
        /// Description of the path template error.
        message: String,
    },

    /// Duplicate endpoint ID detected.
    #[error("Duplicate endpoint ID: {id}")]
    DuplicateEndpoint {
        /// The duplicate endpoint ID.
        id: String,
    },

    /// An array node was given more than one child, or a child that is not a hash node.
    #[error("Array node {key} must have at most one child and it must be a hash node")]
    InvalidArrayChildren {
        /// Key of the offending array declaration (`<root>` when unnamed).
        key: String,
    },

    /// Two fields in the same block write to the same output key.
    #[error("Duplicate field: {key}")]
    DuplicateField {
        /// The repeated write key.
        key: String,
    },

    /// A shape block declared no fields where at least one is required.
    #[error("Empty shape: {context}")]
    EmptyShape {
        /// Where the empty block was found.
        context: String,
    },

    /// A shape library fragment was registered twice.
    #[error("Duplicate shape fragment: {name}")]
    DuplicateFragment {
        /// The fragment name.
        name: String,
    },

    /// A header name or value cannot be sent over HTTP.
    #[error("Invalid header {name}: {message}")]
    InvalidHeader {
        /// The header name as given.
        name: String,
        /// Why it was rejected.
        message: String,
    },

    /// A configuration document could not be parsed.
    #[error("Config parse error: {0}")]
    Parse(String),
}

impl ConfigError {
    /// Creates a missing field error.
    pub fn missing_field(field: &'static str) -> Self {
        Self::MissingField { field }
    }

    /// Creates an invalid header error.
    pub fn invalid_header(name: impl Into<String>, message: impl ToString) -> Self {
        Self::InvalidHeader {
            name: name.into(),
            message: message.to_string(),
        }
    }

    /// Creates an invalid path template error.
    pub fn invalid_path(message: impl Into<String>) -> Self {
        Self::InvalidPathTemplate {
            message: message.into(),
        }
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field() {
        let err = ConfigError::missing_field("base_url");
        assert_eq!(err.to_string(), "Missing required field: base_url");
    }

    #[test]
    fn test_invalid_url() {
        let url_err = url::Url::parse("not-a-url").unwrap_err();
        let err = ConfigError::InvalidUrl(url_err);
        assert!(err.to_string().contains("Invalid URL"));
    }

    #[test]
    fn test_invalid_array_children() {
        let err = ConfigError::InvalidArrayChildren {
            key: "items".to_string(),
        };
        assert!(err.to_string().starts_with("Array node items"));
    }

    #[test]
    fn test_yaml_error_becomes_parse() {
        let yaml_err = serde_yaml::from_str::<u32>("[unclosed").unwrap_err();
        let err: ConfigError = yaml_err.into();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
