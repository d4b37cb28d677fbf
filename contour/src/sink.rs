//! Output sinks for hash-node traversal.
//!
//! A hash node walks its children once and emits one `(path, write_key, value)`
//! assignment per child. Where those assignments land is up to the sink:
//! [`MapSink`] collects a plain ordered map, [`MaterializeSink`] routes them
//! into a typed object through [`Materialize`].

use crate::path::Path;
use crate::value::{ShapedMap, ShapedValue};

/// Receives processed fields.
pub trait FieldSink {
    /// Accepts one processed child value.
    ///
    /// ## Errors
    ///
    /// Returns a reason when the sink rejects the value; the caller turns it
    /// into a coercion failure at `path`.
    fn emit(&mut self, path: &Path<'_>, key: &str, value: ShapedValue) -> Result<(), String>;
}

/// A typed object that can be populated field by field.
///
/// ## Examples
///
/// ```rust
/// use contour::{Materialize, ShapedValue};
///
/// #[derive(Default)]
/// struct User {
///     name: String,
///     age: Option<i64>,
/// }
///
/// impl Materialize for User {
///     fn assign(&mut self, field: &str, value: ShapedValue) -> Result<(), String> {
///         match field {
///             "name" => self.name = value.as_str().unwrap_or_default().to_string(),
///             "age" => self.age = value.as_i64(),
///             other => return Err(format!("unknown field {other}")),
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Materialize {
    /// Sets one field.
    ///
    /// ## Errors
    ///
    /// Returns a reason when the value cannot be stored in the field.
    fn assign(&mut self, field: &str, value: ShapedValue) -> Result<(), String>;
}

/// Collects fields into a plain ordered map.
#[derive(Debug, Default)]
pub struct MapSink {
    map: ShapedMap,
}

impl MapSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the collected map.
    pub fn finish(self) -> ShapedValue {
        ShapedValue::Map(self.map)
    }
}

impl FieldSink for MapSink {
    fn emit(&mut self, _path: &Path<'_>, key: &str, value: ShapedValue) -> Result<(), String> {
        self.map.insert(key.to_string(), value);
        Ok(())
    }
}

/// Routes fields into a [`Materialize`] target.
#[derive(Debug)]
pub struct MaterializeSink<'t, T: Materialize> {
    target: &'t mut T,
}

impl<'t, T: Materialize> MaterializeSink<'t, T> {
    /// Wraps a target object.
    pub fn new(target: &'t mut T) -> Self {
        Self { target }
    }
}

impl<T: Materialize> FieldSink for MaterializeSink<'_, T> {
    fn emit(&mut self, _path: &Path<'_>, key: &str, value: ShapedValue) -> Result<(), String> {
        self.target.assign(key, value)
    }
}
