//! User supplied casts.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::value::ShapedValue;

type CastFn = dyn Fn(&Value) -> Result<ShapedValue, String> + Send + Sync;

/// A named conversion for types the built-in casts do not cover.
///
/// ## Examples
///
/// ```rust
/// use contour::{ShapedValue, TypedCast};
/// use serde_json::json;
///
/// let cents = TypedCast::new("cents", |v| {
///     v.as_f64()
///         .map(|amount| ShapedValue::Integer((amount * 100.0).round() as i64))
///         .ok_or_else(|| "expected a number".to_string())
/// });
/// assert_eq!(cents.apply(&json!(12.34)), Ok(ShapedValue::Integer(1234)));
/// assert_eq!(cents.name(), "cents");
/// ```
#[derive(Clone)]
pub struct TypedCast {
    name: String,
    cast: Arc<CastFn>,
}

impl TypedCast {
    /// Wraps a conversion under a diagnostic name.
    pub fn new(
        name: impl Into<String>,
        cast: impl Fn(&Value) -> Result<ShapedValue, String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            cast: Arc::new(cast),
        }
    }

    /// The diagnostic name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs the conversion.
    ///
    /// ## Errors
    ///
    /// Returns the conversion's own failure reason, prefixed with the cast name.
    pub fn apply(&self, value: &Value) -> Result<ShapedValue, String> {
        (self.cast)(value).map_err(|reason| format!("{}: {reason}", self.name))
    }
}

impl fmt::Debug for TypedCast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedCast").field("name", &self.name).finish_non_exhaustive()
    }
}
