//! Value transformations attached to processors.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::value::ShapedValue;

/// Transformation applied to the raw value before it is processed.
///
/// ## Examples
///
/// ```rust
/// use contour::Prefilter;
/// use serde_json::{json, Value};
///
/// let trim = Prefilter::new(|v| match v {
///     Value::String(s) => Value::String(s.trim().to_string()),
///     other => other,
/// });
/// assert_eq!(trim.apply(json!("  ada ")), json!("ada"));
/// ```
#[derive(Clone)]
pub struct Prefilter(Arc<dyn Fn(Value) -> Value + Send + Sync>);

impl Prefilter {
    /// Wraps a closure.
    pub fn new(f: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Runs the filter.
    pub fn apply(&self, value: Value) -> Value {
        (self.0)(value)
    }
}

impl fmt::Debug for Prefilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Prefilter(..)")
    }
}

/// Transformation applied to the processed value.
#[derive(Clone)]
pub struct Postfilter(Arc<dyn Fn(ShapedValue) -> ShapedValue + Send + Sync>);

impl Postfilter {
    /// Wraps a closure.
    pub fn new(f: impl Fn(ShapedValue) -> ShapedValue + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Runs the filter.
    pub fn apply(&self, value: ShapedValue) -> ShapedValue {
        (self.0)(value)
    }
}

impl fmt::Debug for Postfilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Postfilter(..)")
    }
}

/// Finite replacement table from raw values to replacement values.
///
/// Lookup follows plain map semantics: a value that is not in the table maps
/// to null. Keys compare as typed JSON values, so `1` and `"1"` are distinct.
///
/// ## Examples
///
/// ```rust
/// use contour::ValueMap;
/// use serde_json::json;
///
/// let status = ValueMap::new([(json!("A"), json!("active")), (json!("I"), json!("inactive"))]);
/// assert_eq!(status.lookup(&json!("A")), json!("active"));
/// assert_eq!(status.lookup(&json!("X")), json!(null));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueMap {
    entries: Vec<(Value, Value)>,
}

impl ValueMap {
    /// Builds a table from `(raw, replacement)` pairs.
    pub fn new(entries: impl IntoIterator<Item = (Value, Value)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Returns the replacement for `raw`, or null when it is not mapped.
    pub fn lookup(&self, raw: &Value) -> Value {
        self.entries
            .iter()
            .find(|(from, _)| from == raw)
            .map(|(_, to)| to.clone())
            .unwrap_or(Value::Null)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_postfilter_applies() {
        let upper = Postfilter::new(|v| match v {
            ShapedValue::String(s) => ShapedValue::String(s.to_uppercase()),
            other => other,
        });
        assert_eq!(
            upper.apply(ShapedValue::String("ada".to_string())),
            ShapedValue::String("ADA".to_string())
        );
    }

    #[test]
    fn test_value_map_matches_typed_values() {
        let map = ValueMap::new([(json!(1), json!("one")), (json!("1"), json!("string one"))]);
        assert_eq!(map.lookup(&json!(1)), json!("one"));
        assert_eq!(map.lookup(&json!("1")), json!("string one"));
        assert_eq!(map.len(), 2);
    }
}
