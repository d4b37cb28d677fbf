//! Response validation errors.

use serde_json::Value;
use thiserror::Error;

/// Errors raised while shaping a decoded response (or request parameters).
///
/// Every shape error carries the rendered traversal path (for example
/// `items[1]->id`) and the raw fragment that was being inspected when the
/// failure happened. The first failure wins: processing stops immediately and
/// no partial result is produced.
///
/// ## Examples
///
/// ```rust
/// use contour::error::ValidationError;
/// use serde_json::json;
///
/// let err = ValidationError::MissingKey {
///     path: "items[1]->id".to_string(),
///     input: json!({}),
/// };
/// assert_eq!(err.to_string(), "Missing key at items[1]->id");
/// assert_eq!(err.path(), Some("items[1]->id"));
/// ```
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required key is absent from an object.
    #[error("Missing key at {path}")]
    MissingKey {
        /// Rendered path to the missing key.
        path: String,
        /// The object the key was looked up in.
        input: Value,
    },

    /// The value a key should be read from is itself null.
    #[error("Missing value at {path}")]
    MissingValue {
        /// Rendered path to the key that could not be read.
        path: String,
        /// The null input.
        input: Value,
    },

    /// A key is present but holds null where nulls are not allowed.
    #[error("Unexpected null at {path}")]
    UnexpectedNil {
        /// Rendered path to the null value.
        path: String,
        /// The object holding the null value.
        input: Value,
    },

    /// The input shape does not match what the processor needs.
    #[error("Type mismatch at {path}: expected {expected}")]
    TypeMismatch {
        /// Rendered path to the mismatching value.
        path: String,
        /// Human readable description of the expected shape.
        expected: &'static str,
        /// The offending value.
        input: Value,
    },

    /// A typed cast failed and no fallback was configured.
    #[error("Cannot coerce value at {path}: {reason}")]
    CoercionFailure {
        /// Rendered path to the value.
        path: String,
        /// Why the cast failed.
        reason: String,
        /// The offending value.
        input: Value,
    },

    /// The response body could not be decoded at all.
    #[error("Body decode error: {0}")]
    BodyDecode(#[from] serde_json::Error),
}

impl ValidationError {
    /// Returns the rendered path for shape errors.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::MissingKey { path, .. }
            | Self::MissingValue { path, .. }
            | Self::UnexpectedNil { path, .. }
            | Self::TypeMismatch { path, .. }
            | Self::CoercionFailure { path, .. } => Some(path),
            Self::BodyDecode(_) => None,
        }
    }

    /// Returns the raw fragment that failed validation.
    pub fn input(&self) -> Option<&Value> {
        match self {
            Self::MissingKey { input, .. }
            | Self::MissingValue { input, .. }
            | Self::UnexpectedNil { input, .. }
            | Self::TypeMismatch { input, .. }
            | Self::CoercionFailure { input, .. } => Some(input),
            Self::BodyDecode(_) => None,
        }
    }

    /// Returns `true` if the body decoded but did not match the declared shape.
    pub fn is_shape_error(&self) -> bool {
        !matches!(self, Self::BodyDecode(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_key_display() {
        let err = ValidationError::MissingKey {
            path: "user->id".to_string(),
            input: json!({"name": "Ada"}),
        };
        assert_eq!(err.to_string(), "Missing key at user->id");
        assert!(err.is_shape_error());
    }

    #[test]
    fn test_type_mismatch_carries_input() {
        let err = ValidationError::TypeMismatch {
            path: "data".to_string(),
            expected: "object",
            input: json!(42),
        };
        assert_eq!(err.input(), Some(&json!(42)));
        assert!(err.to_string().contains("expected object"));
    }

    #[test]
    fn test_body_decode_has_no_path() {
        let json_err = serde_json::from_str::<Value>("{not json").unwrap_err();
        let err = ValidationError::BodyDecode(json_err);
        assert!(!err.is_shape_error());
        assert_eq!(err.path(), None);
        assert_eq!(err.input(), None);
    }
}
