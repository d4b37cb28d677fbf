//! Primitive casts.

use serde_json::Value;
use strum::{Display, EnumIter, EnumString};

use crate::value::{stringify, ShapedValue};

/// A single named coercion applied by a primitive processor.
///
/// ## Examples
///
/// ```rust
/// use contour::{PrimitiveCast, ShapedValue};
/// use serde_json::json;
///
/// assert_eq!(PrimitiveCast::Integer.cast(&json!("42")), Ok(ShapedValue::Integer(42)));
/// assert_eq!(PrimitiveCast::String.cast(&json!(42)), Ok(ShapedValue::String("42".into())));
/// assert!(PrimitiveCast::Integer.cast(&json!("forty-two")).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum PrimitiveCast {
    /// Text; non-strings are rendered.
    String,
    /// Signed 64-bit integer.
    Integer,
    /// 64-bit float.
    Float,
    /// Identifier-like text.
    Symbol,
    /// The JSON value unchanged.
    Any,
}

impl PrimitiveCast {
    /// Name used in diagnostics and declarations.
    pub fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Symbol => "symbol",
            Self::Any => "value",
        }
    }

    /// Applies the coercion.
    ///
    /// ## Errors
    ///
    /// Returns a reason when the value has no sensible reading as the target type.
    pub fn cast(self, value: &Value) -> Result<ShapedValue, String> {
        match self {
            Self::String => Ok(ShapedValue::String(stringify(value))),
            Self::Symbol => Ok(ShapedValue::Symbol(stringify(value))),
            Self::Integer => to_integer(value).map(ShapedValue::Integer),
            Self::Float => to_float(value).map(ShapedValue::Float),
            Self::Any => Ok(ShapedValue::from(value.clone())),
        }
    }
}

fn to_integer(value: &Value) -> Result<i64, String> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(i),
            None => n
                .as_f64()
                .and_then(truncate)
                .ok_or_else(|| format!("{n} does not fit an integer")),
        },
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().and_then(truncate))
                .ok_or_else(|| format!("{s:?} is not an integer"))
        }
        Value::Bool(b) => Ok(i64::from(*b)),
        other => Err(format!("cannot read {} as an integer", kind_of(other))),
    }
}

fn to_float(value: &Value) -> Result<f64, String> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| format!("{n} is not a float")),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("{s:?} is not a number")),
        other => Err(format!("cannot read {} as a float", kind_of(other))),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn truncate(f: f64) -> Option<i64> {
    // i64::MAX is not exactly representable; compare against 2^63.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    (f.is_finite() && f.trunc() >= -LIMIT && f.trunc() < LIMIT).then(|| f.trunc() as i64)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
