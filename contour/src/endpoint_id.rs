//! Endpoint identifiers.

use std::borrow::Borrow;
use std::fmt;

use thiserror::Error;

/// Why a string was rejected as an [`EndpointId`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndpointIdError {
    /// The identifier is empty.
    #[error("endpoint id cannot be empty")]
    Empty,
    /// The first character is not alphabetic.
    #[error("endpoint id must start with an alphabetic character")]
    InvalidStart,
    /// A later character is neither alphanumeric nor `_`.
    #[error("endpoint id contains invalid character {0:?}")]
    InvalidCharacter(char),
}

/// Name an endpoint is registered and looked up under.
///
/// Starts with an alphabetic character; the rest are alphanumerics or `_`.
///
/// ## Examples
///
/// ```rust
/// use contour::EndpointId;
///
/// let id = EndpointId::new("list_users").unwrap();
/// assert_eq!(id.as_str(), "list_users");
/// assert!(EndpointId::new("list-users").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EndpointId(String);

impl EndpointId {
    /// Validates and wraps an identifier.
    ///
    /// ## Errors
    ///
    /// Returns an [`EndpointIdError`] describing the first rule broken.
    pub fn new(id: impl Into<String>) -> Result<Self, EndpointIdError> {
        let id = id.into();
        let mut chars = id.chars();
        match chars.next() {
            None => return Err(EndpointIdError::Empty),
            Some(first) if !first.is_alphabetic() => return Err(EndpointIdError::InvalidStart),
            Some(_) => {}
        }
        if let Some(bad) = chars.find(|c| !c.is_alphanumeric() && *c != '_') {
            return Err(EndpointIdError::InvalidCharacter(bad));
        }
        Ok(Self(id))
    }

    /// The identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EndpointId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for EndpointId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for EndpointId {
    type Error = EndpointIdError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<String> for EndpointId {
    type Error = EndpointIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
