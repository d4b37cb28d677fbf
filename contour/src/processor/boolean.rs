//! Boolean resolution.

use serde_json::Value;

use crate::value::{stringify, ShapedValue};

/// Truthy and falsy representations accepted by a boolean processor.
///
/// Values are compared by their string form, so the defaults accept both
/// JSON `true` and the string `"true"`. Anything matching neither set
/// resolves to null rather than failing.
///
/// ## Examples
///
/// ```rust
/// use contour::{BooleanOptions, ShapedValue};
/// use serde_json::json;
///
/// let yes_no = BooleanOptions::new(["yes", "y"], ["no", "n"]);
/// assert_eq!(yes_no.resolve(&json!("y")), ShapedValue::Bool(true));
/// assert_eq!(yes_no.resolve(&json!("maybe")), ShapedValue::Null);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BooleanOptions {
    truthy: Vec<String>,
    falsy: Vec<String>,
}

impl Default for BooleanOptions {
    fn default() -> Self {
        Self::new(["true"], ["false"])
    }
}

impl BooleanOptions {
    /// Creates options from explicit truthy and falsy sets.
    pub fn new<T, F>(truthy: T, falsy: F) -> Self
    where
        T: IntoIterator,
        T::Item: Into<String>,
        F: IntoIterator,
        F::Item: Into<String>,
    {
        Self {
            truthy: truthy.into_iter().map(Into::into).collect(),
            falsy: falsy.into_iter().map(Into::into).collect(),
        }
    }

    /// Replaces the truthy set.
    #[must_use]
    pub fn with_truthy<T>(mut self, truthy: T) -> Self
    where
        T: IntoIterator,
        T::Item: Into<String>,
    {
        self.truthy = truthy.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the falsy set.
    #[must_use]
    pub fn with_falsy<F>(mut self, falsy: F) -> Self
    where
        F: IntoIterator,
        F::Item: Into<String>,
    {
        self.falsy = falsy.into_iter().map(Into::into).collect();
        self
    }

    /// Resolves a raw value to `true`, `false` or null.
    pub fn resolve(&self, value: &Value) -> ShapedValue {
        let text = stringify(value);
        if self.truthy.iter().any(|t| *t == text) {
            ShapedValue::Bool(true)
        } else if self.falsy.iter().any(|f| *f == text) {
            ShapedValue::Bool(false)
        } else {
            ShapedValue::Null
        }
    }
}
