//! Request methods an endpoint can be declared with.

use serde::Deserialize;
use strum::{Display, EnumIter, EnumString};

/// Method of an endpoint.
///
/// Methods with a body send their non-path parameters as a JSON document;
/// the others send them in the query string.
///
/// ## Examples
///
/// ```rust
/// use contour::RestMethod;
///
/// let method: RestMethod = "PATCH".parse().unwrap();
/// assert!(method.has_body());
/// assert!(!method.is_idempotent());
/// assert_eq!(method.to_string(), "PATCH");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString, Deserialize)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
pub enum RestMethod {
    /// Read a resource.
    Get,
    /// Create a resource or trigger an action.
    Post,
    /// Replace a resource.
    Put,
    /// Partially update a resource.
    Patch,
    /// Remove a resource.
    Delete,
    /// Read headers only.
    Head,
    /// Query supported methods.
    Options,
}

impl RestMethod {
    /// Returns `true` if parameters travel in a JSON body.
    pub fn has_body(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }

    /// Returns `true` if repeating the call has the same effect as calling once.
    pub fn is_idempotent(self) -> bool {
        !matches!(self, Self::Post | Self::Patch)
    }

    /// Returns `true` if the call does not modify server state.
    pub fn is_safe(self) -> bool {
        matches!(self, Self::Get | Self::Head | Self::Options)
    }
}

impl From<RestMethod> for reqwest::Method {
    fn from(method: RestMethod) -> Self {
        match method {
            RestMethod::Get => Self::GET,
            RestMethod::Post => Self::POST,
            RestMethod::Put => Self::PUT,
            RestMethod::Patch => Self::PATCH,
            RestMethod::Delete => Self::DELETE,
            RestMethod::Head => Self::HEAD,
            RestMethod::Options => Self::OPTIONS,
        }
    }
}
