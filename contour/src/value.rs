//! Shaped output values.
//!
//! Processors read `serde_json::Value` input and produce [`ShapedValue`]
//! output. The output keeps the typed results of coercion (dates, symbols,
//! integers versus floats) that plain JSON cannot express.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, SecondsFormat};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Value;

use crate::sink::Materialize;

/// Ordered output mapping, keyed by write key in declaration order.
pub type ShapedMap = IndexMap<String, ShapedValue>;

/// A processed value.
///
/// ## Examples
///
/// ```rust
/// use contour::ShapedValue;
/// use serde_json::json;
///
/// let shaped = ShapedValue::from(json!({"name": "Ada", "tags": ["a", "b"]}));
/// assert_eq!(shaped.get("name").and_then(ShapedValue::as_str), Some("Ada"));
/// assert_eq!(shaped.into_json(), json!({"name": "Ada", "tags": ["a", "b"]}));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum ShapedValue {
    /// Absent or null.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Integer(i64),
    /// Floating point number.
    Float(f64),
    /// Text.
    String(String),
    /// Identifier-like text produced by a symbol cast.
    Symbol(String),
    /// Calendar date.
    Date(NaiveDate),
    /// Wall clock time.
    Time(NaiveTime),
    /// Instant with offset.
    DateTime(DateTime<FixedOffset>),
    /// Ordered sequence.
    Array(Vec<ShapedValue>),
    /// Mapping in declaration order.
    Map(ShapedMap),
}

impl ShapedValue {
    /// Returns `true` for [`ShapedValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the text of a string or symbol.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Symbol(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer value.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the number as a float (integers are widened).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(n) => Some(*n),
            Self::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// Returns the boolean value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the elements of an array.
    pub fn as_array(&self) -> Option<&[ShapedValue]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the entries of a map.
    pub fn as_map(&self) -> Option<&ShapedMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Looks up a key when this is a map.
    pub fn get(&self, key: &str) -> Option<&ShapedValue> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Converts into plain JSON. Dates and times become ISO-8601 strings.
    pub fn into_json(self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(b),
            Self::Integer(n) => Value::from(n),
            Self::Float(n) => serde_json::Number::from_f64(n).map_or(Value::Null, Value::Number),
            Self::String(s) | Self::Symbol(s) => Value::String(s),
            Self::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
            Self::Time(t) => Value::String(t.format("%H:%M:%S%.f").to_string()),
            Self::DateTime(dt) => Value::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Self::Array(items) => Value::Array(items.into_iter().map(Self::into_json).collect()),
            Self::Map(map) => Value::Object(
                map.into_iter()
                    .map(|(key, value)| (key, value.into_json()))
                    .collect(),
            ),
        }
    }

    /// Deserializes into any serde type by way of JSON.
    ///
    /// ## Errors
    ///
    /// Returns the serde error when the shape does not fit `T`.
    pub fn deserialize_into<T: DeserializeOwned>(self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.into_json())
    }

    /// Materializes a map into a fresh `T` by assigning each entry in order.
    ///
    /// Returns `Ok(None)` for [`ShapedValue::Null`], which is how absent
    /// nested objects arrive.
    ///
    /// ## Errors
    ///
    /// Returns the message from the first failed assignment, or a message when
    /// the value is neither a map nor null.
    pub fn materialize<T: Materialize + Default>(self) -> Result<Option<T>, String> {
        match self {
            Self::Null => Ok(None),
            Self::Map(map) => {
                let mut target = T::default();
                for (field, value) in map {
                    target.assign(&field, value)?;
                }
                Ok(Some(target))
            }
            other => Err(format!("expected a map to materialize, got {other:?}")),
        }
    }
}

impl From<Value> for ShapedValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => Self::Map(
                map.into_iter()
                    .map(|(key, value)| (key, Self::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<ShapedMap> for ShapedValue {
    fn from(map: ShapedMap) -> Self {
        Self::Map(map)
    }
}

impl Serialize for ShapedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Integer(n) => serializer.serialize_i64(*n),
            Self::Float(n) => serializer.serialize_f64(*n),
            Self::String(s) | Self::Symbol(s) => serializer.serialize_str(s),
            Self::Date(d) => serializer.collect_str(&d.format("%Y-%m-%d")),
            Self::Time(t) => serializer.collect_str(&t.format("%H:%M:%S%.f")),
            Self::DateTime(dt) => {
                serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            Self::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map {
                    out.serialize_entry(key, value)?;
                }
                out.end()
            }
        }
    }
}

/// Returns `true` for values the pipeline treats as absent: null, `""`, `[]`, `{}`.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Renders a value the way a string cast sees it: strings unquoted, everything else as JSON.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_blank_values() {
        assert!(is_blank(&json!(null)));
        assert!(is_blank(&json!("")));
        assert!(is_blank(&json!([])));
        assert!(is_blank(&json!({})));
        assert!(!is_blank(&json!(false)));
        assert!(!is_blank(&json!(0)));
        assert!(!is_blank(&json!(" ")));
    }

    #[test]
    fn test_from_json_keeps_integer_and_float_apart() {
        assert_eq!(ShapedValue::from(json!(3)), ShapedValue::Integer(3));
        assert_eq!(ShapedValue::from(json!(3.5)), ShapedValue::Float(3.5));
    }

    #[test]
    fn test_map_equality_ignores_order() {
        let mut a = ShapedMap::new();
        a.insert("x".to_string(), ShapedValue::Integer(1));
        a.insert("y".to_string(), ShapedValue::Integer(2));
        let mut b = ShapedMap::new();
        b.insert("y".to_string(), ShapedValue::Integer(2));
        b.insert("x".to_string(), ShapedValue::Integer(1));
        assert_eq!(ShapedValue::Map(a), ShapedValue::Map(b));
    }

    #[test]
    fn test_dates_serialize_as_iso_strings() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let value = ShapedValue::Array(vec![
            ShapedValue::Date(date),
            ShapedValue::Symbol("active".to_string()),
        ]);
        assert_eq!(serde_json::to_value(&value).unwrap(), json!(["2024-02-29", "active"]));
        assert_eq!(value.into_json(), json!(["2024-02-29", "active"]));
    }

    #[test]
    fn test_deserialize_into_struct() {
        #[derive(Debug, serde::Deserialize, PartialEq)]
        struct User {
            name: String,
            age: u32,
        }

        let shaped = ShapedValue::from(json!({"name": "Ada", "age": 36}));
        let user: User = shaped.deserialize_into().unwrap();
        assert_eq!(
            user,
            User {
                name: "Ada".to_string(),
                age: 36
            }
        );
    }

    #[test]
    fn test_stringify() {
        assert_eq!(stringify(&json!("maybe")), "maybe");
        assert_eq!(stringify(&json!(true)), "true");
        assert_eq!(stringify(&json!(12)), "12");
    }
}
