//! Object nodes.

use std::sync::Arc;

use serde_json::Value;

use super::{emit_child, Processor};
use crate::error::{ConfigError, ValidationError};
use crate::path::Path;
use crate::sink::{FieldSink, MapSink};
use crate::value::ShapedValue;

/// An object with declared children.
///
/// Children run in declaration order against the same input object and the
/// output map keeps that order. Keys present in the input but not declared
/// are dropped. A node with no children passes the object through unchanged.
#[derive(Debug, Clone, Default)]
pub struct HashNode {
    children: Vec<Arc<Processor>>,
}

impl HashNode {
    /// Creates a node from its children.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a child has no write key,
    /// and [`ConfigError::DuplicateField`] when two children write the same key.
    pub fn new(children: Vec<Arc<Processor>>) -> Result<Self, ConfigError> {
        let mut seen: Vec<&str> = Vec::with_capacity(children.len());
        for child in &children {
            let key = child
                .write_key()
                .ok_or_else(|| ConfigError::missing_field("write_key"))?;
            if seen.contains(&key) {
                return Err(ConfigError::DuplicateField {
                    key: key.to_string(),
                });
            }
            seen.push(key);
        }
        Ok(Self { children })
    }

    /// The declared children.
    pub fn children(&self) -> &[Arc<Processor>] {
        &self.children
    }

    /// Processes an object into an ordered map.
    ///
    /// ## Errors
    ///
    /// Returns a type mismatch when `input` is not an object, or the first
    /// child failure.
    pub fn process(&self, input: &Value, path: &Path<'_>) -> Result<ShapedValue, ValidationError> {
        if self.children.is_empty() {
            return match input {
                Value::Object(_) => Ok(ShapedValue::from(input.clone())),
                other => Err(not_an_object(path, other)),
            };
        }
        let mut sink = MapSink::new();
        self.process_into(input, path, &mut sink)?;
        Ok(sink.finish())
    }

    /// Processes an object, emitting each child's result into `sink`.
    ///
    /// ## Errors
    ///
    /// Same as [`HashNode::process`], plus sink rejections reported as
    /// coercion failures.
    pub fn process_into(
        &self,
        input: &Value,
        path: &Path<'_>,
        sink: &mut dyn FieldSink,
    ) -> Result<(), ValidationError> {
        if !input.is_object() {
            return Err(not_an_object(path, input));
        }
        for child in &self.children {
            let value = child.execute(input, path, None)?;
            // write keys are checked in `new`
            let key = child.write_key().unwrap_or_default();
            emit_child(sink, path, key, value, input)?;
        }
        Ok(())
    }
}

fn not_an_object(path: &Path<'_>, input: &Value) -> ValidationError {
    ValidationError::TypeMismatch {
        path: path.to_string(),
        expected: "object",
        input: input.clone(),
    }
}
