//! Response processors.
//!
//! A [`Processor`] validates and transforms one position of a decoded
//! response. Every processor runs the same contract around its kind-specific
//! step:
//!
//! 1. **Extract** the value under `read_key` (when set), checking presence
//!    (`optional`) and nullability (`allow_nil`).
//! 2. Apply the **prefilter**.
//! 3. Replace the value through the **value map** (non-blank values only).
//! 4. **Process** the value according to the [`ProcessorKind`]; blank values
//!    (null, `""`, `[]`, `{}`) read from a key skip this step and propagate
//!    unchanged. Keyless nodes (roots, array elements) only skip null.
//! 5. Apply the **postfilter** to processed values.
//!
//! Trees are built once and only read during execution, so a tree can be
//! shared across threads and reused for every response of an endpoint.

mod array;
mod boolean;
mod hash;
mod primitive;
mod temporal;
mod typed;

use std::borrow::Cow;

use serde_json::Value;
use tracing::trace;

pub use array::ArrayNode;
pub use boolean::BooleanOptions;
pub use hash::HashNode;
pub use primitive::PrimitiveCast;
pub use temporal::{TemporalKind, TemporalOptions};
pub use typed::TypedCast;

use crate::error::ValidationError;
use crate::filter::{Postfilter, Prefilter, ValueMap};
use crate::path::Path;
use crate::sink::{FieldSink, Materialize, MaterializeSink};
use crate::value::{is_blank, ShapedValue};

/// The primary operation of a processor, with its kind-specific options.
#[derive(Debug, Clone)]
pub enum ProcessorKind {
    /// Single named coercion (string, integer, float, symbol, verbatim).
    Primitive(PrimitiveCast),
    /// Truthy/falsy set matching.
    Boolean(BooleanOptions),
    /// Date, time or date-time parsing.
    Temporal(TemporalOptions),
    /// User supplied conversion.
    Typed(TypedCast),
    /// Object with declared children.
    Hash(HashNode),
    /// Array of objects (one hash child) or of scalars (no child).
    Array(ArrayNode),
}

impl ProcessorKind {
    /// Short name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Primitive(cast) => cast.name(),
            Self::Boolean(_) => "boolean",
            Self::Temporal(options) => options.kind.name(),
            Self::Typed(_) => "typed",
            Self::Hash(_) => "hash",
            Self::Array(_) => "array",
        }
    }

    /// Returns `true` for hash and array nodes.
    pub fn is_container(&self) -> bool {
        matches!(self, Self::Hash(_) | Self::Array(_))
    }
}

/// A node of a response processing tree.
///
/// ## Examples
///
/// ```rust
/// use contour::{Path, PrimitiveCast, Processor, ProcessorKind, ShapedValue};
/// use serde_json::json;
///
/// let name = Processor::new(ProcessorKind::Primitive(PrimitiveCast::String)).keyed("name");
/// let out = name.execute(&json!({"name": "Ada"}), &Path::root(), None).unwrap();
/// assert_eq!(out, ShapedValue::String("Ada".to_string()));
/// ```
#[derive(Debug, Clone)]
pub struct Processor {
    read_key: Option<String>,
    write_key: Option<String>,
    prefilter: Option<Prefilter>,
    postfilter: Option<Postfilter>,
    value_map: Option<ValueMap>,
    optional: bool,
    allow_nil: bool,
    kind: ProcessorKind,
}

/// Result of the extraction half of the contract.
///
/// Values borrow from the input until a prefilter or value map replaces them.
enum Extracted<'v> {
    /// The input itself was null and nulls are allowed: stop here.
    ShortCircuit,
    /// A blank value that skips processing.
    Blank(Cow<'v, Value>),
    /// A present value ready for the kind-specific step.
    Present(Cow<'v, Value>),
}

impl Processor {
    /// Creates a keyless, required, non-nullable processor.
    pub fn new(kind: ProcessorKind) -> Self {
        Self {
            read_key: None,
            write_key: None,
            prefilter: None,
            postfilter: None,
            value_map: None,
            optional: false,
            allow_nil: false,
            kind,
        }
    }

    /// Reads from and writes to `key`.
    #[must_use]
    pub fn keyed(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.write_key = Some(key.clone());
        self.read_key = Some(key);
        self
    }

    /// Writes to `key` regardless of the read key.
    #[must_use]
    pub fn write_as(mut self, key: impl Into<String>) -> Self {
        self.write_key = Some(key.into());
        self
    }

    /// Sets whether the read key may be absent.
    #[must_use]
    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// Sets whether a present value may be null.
    #[must_use]
    pub fn allow_nil(mut self, allow_nil: bool) -> Self {
        self.allow_nil = allow_nil;
        self
    }

    /// Sets the prefilter.
    #[must_use]
    pub fn prefilter(mut self, filter: Prefilter) -> Self {
        self.prefilter = Some(filter);
        self
    }

    /// Sets the postfilter.
    #[must_use]
    pub fn postfilter(mut self, filter: Postfilter) -> Self {
        self.postfilter = Some(filter);
        self
    }

    /// Sets the value map.
    #[must_use]
    pub fn value_map(mut self, map: ValueMap) -> Self {
        self.value_map = Some(map);
        self
    }

    /// Key looked up in the input object.
    pub fn read_key(&self) -> Option<&str> {
        self.read_key.as_deref()
    }

    /// Key the result is placed under in the output object.
    pub fn write_key(&self) -> Option<&str> {
        self.write_key.as_deref()
    }

    /// Whether the read key may be absent.
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Whether a present value may be null.
    pub fn allows_nil(&self) -> bool {
        self.allow_nil
    }

    /// The primary operation.
    pub fn kind(&self) -> &ProcessorKind {
        &self.kind
    }

    /// Processes `input` into a plain shaped value.
    ///
    /// `element_index` is set when `input` is one element of an array; it is
    /// recorded in the path for diagnostics.
    ///
    /// ## Errors
    ///
    /// Returns the first [`ValidationError`] found anywhere below this node.
    pub fn execute(
        &self,
        input: &Value,
        path: &Path<'_>,
        element_index: Option<usize>,
    ) -> Result<ShapedValue, ValidationError> {
        let indexed;
        let here = match element_index {
            Some(index) => {
                indexed = path.index(index);
                &indexed
            }
            None => path,
        };

        match self.extract(input, here)? {
            Extracted::ShortCircuit => Ok(ShapedValue::Null),
            Extracted::Blank(subset) => Ok(ShapedValue::from(subset.into_owned())),
            Extracted::Present(subset) => {
                let value = match &self.read_key {
                    Some(key) => self.kind_process(&subset, &here.key(key))?,
                    None => self.kind_process(&subset, here)?,
                };
                Ok(match &self.postfilter {
                    Some(filter) => filter.apply(value),
                    None => value,
                })
            }
        }
    }

    /// Processes `input` into a typed object instead of a plain map.
    ///
    /// Hash nodes route each child field into `target`. Any other node is
    /// evaluated normally and its result assigned under its write key (or
    /// `"value"` when it has none). Returns `false` when the value was blank
    /// and nothing was assigned.
    ///
    /// ## Errors
    ///
    /// Returns the first [`ValidationError`]; a rejected assignment is
    /// reported as a coercion failure at the field's path.
    pub fn execute_into<T: Materialize>(
        &self,
        input: &Value,
        path: &Path<'_>,
        element_index: Option<usize>,
        target: &mut T,
    ) -> Result<bool, ValidationError> {
        let ProcessorKind::Hash(node) = &self.kind else {
            let value = self.execute(input, path, element_index)?;
            if value.is_null() {
                return Ok(false);
            }
            let field = self.write_key().unwrap_or("value");
            return target
                .assign(field, value)
                .map(|()| true)
                .map_err(|reason| ValidationError::CoercionFailure {
                    path: path.key(field).to_string(),
                    reason,
                    input: input.clone(),
                });
        };

        let indexed;
        let here = match element_index {
            Some(index) => {
                indexed = path.index(index);
                &indexed
            }
            None => path,
        };

        match self.extract(input, here)? {
            Extracted::ShortCircuit | Extracted::Blank(_) => Ok(false),
            Extracted::Present(subset) => {
                let mut sink = MaterializeSink::new(target);
                match &self.read_key {
                    Some(key) => node.process_into(&subset, &here.key(key), &mut sink)?,
                    None => node.process_into(&subset, here, &mut sink)?,
                }
                Ok(true)
            }
        }
    }

    /// Materializes every element of an array into a fresh `T`.
    ///
    /// Null elements produce `T::default()` so the output keeps the input's
    /// length and order.
    ///
    /// ## Errors
    ///
    /// Returns a type mismatch when this is not an array of hashes, or the
    /// first [`ValidationError`] from any element.
    pub fn execute_collect<T: Materialize + Default>(
        &self,
        input: &Value,
        path: &Path<'_>,
    ) -> Result<Vec<T>, ValidationError> {
        let ProcessorKind::Array(node) = &self.kind else {
            return Err(ValidationError::TypeMismatch {
                path: path.to_string(),
                expected: "array shape",
                input: input.clone(),
            });
        };
        let Some(child) = node.child() else {
            return Err(ValidationError::TypeMismatch {
                path: path.to_string(),
                expected: "array of objects shape",
                input: input.clone(),
            });
        };

        let subset = match self.extract(input, path)? {
            Extracted::ShortCircuit | Extracted::Blank(_) => return Ok(Vec::new()),
            Extracted::Present(value) => value,
        };
        let keyed;
        let here = match &self.read_key {
            Some(key) => {
                keyed = path.key(key);
                &keyed
            }
            None => path,
        };

        let Value::Array(items) = subset.as_ref() else {
            return Err(ValidationError::TypeMismatch {
                path: here.to_string(),
                expected: "array",
                input: subset.as_ref().clone(),
            });
        };

        items
            .iter()
            .enumerate()
            .map(|(index, element)| {
                let mut target = T::default();
                child.execute_into(element, here, Some(index), &mut target)?;
                Ok(target)
            })
            .collect()
    }

    /// Steps 1 to 3 of the contract.
    fn extract<'v>(
        &self,
        input: &'v Value,
        here: &Path<'_>,
    ) -> Result<Extracted<'v>, ValidationError> {
        let subset = match &self.read_key {
            None => Cow::Borrowed(input),
            Some(key) => match input {
                Value::Null if self.allow_nil => return Ok(Extracted::ShortCircuit),
                Value::Null => {
                    return Err(fail(ValidationError::MissingValue {
                        path: here.key(key).to_string(),
                        input: Value::Null,
                    }));
                }
                Value::Object(map) => match map.get(key.as_str()) {
                    None if self.optional => Cow::Owned(Value::Null),
                    None => {
                        return Err(fail(ValidationError::MissingKey {
                            path: here.key(key).to_string(),
                            input: input.clone(),
                        }));
                    }
                    Some(Value::Null) if !self.allow_nil => {
                        return Err(fail(ValidationError::UnexpectedNil {
                            path: here.key(key).to_string(),
                            input: input.clone(),
                        }));
                    }
                    Some(value) => Cow::Borrowed(value),
                },
                other => {
                    return Err(fail(ValidationError::TypeMismatch {
                        path: here.key(key).to_string(),
                        expected: "object",
                        input: other.clone(),
                    }));
                }
            },
        };

        let subset = match &self.prefilter {
            Some(filter) => Cow::Owned(filter.apply(subset.into_owned())),
            None => subset,
        };

        let subset = match &self.value_map {
            Some(map) if !is_blank(&subset) => Cow::Owned(map.lookup(&subset)),
            _ => subset,
        };

        // A keyless node always inspects its input; only null skips it.
        let blank = match &self.read_key {
            Some(_) => is_blank(&subset),
            None => subset.is_null(),
        };
        Ok(if blank {
            Extracted::Blank(subset)
        } else {
            Extracted::Present(subset)
        })
    }

    /// Step 4: the kind-specific operation on a present value.
    fn kind_process(&self, subset: &Value, path: &Path<'_>) -> Result<ShapedValue, ValidationError> {
        match &self.kind {
            ProcessorKind::Primitive(cast) => cast
                .cast(subset)
                .map_err(|reason| coercion_failure(path, reason, subset.clone())),
            ProcessorKind::Boolean(options) => Ok(options.resolve(subset)),
            ProcessorKind::Temporal(options) => options
                .parse(subset)
                .map_err(|reason| coercion_failure(path, reason, subset.clone())),
            ProcessorKind::Typed(cast) => cast
                .apply(subset)
                .map_err(|reason| coercion_failure(path, reason, subset.clone())),
            ProcessorKind::Hash(node) => node.process(subset, path),
            ProcessorKind::Array(node) => node.process(subset, path),
        }
    }
}

fn coercion_failure(path: &Path<'_>, reason: String, input: Value) -> ValidationError {
    fail(ValidationError::CoercionFailure {
        path: path.to_string(),
        reason,
        input,
    })
}

fn fail(err: ValidationError) -> ValidationError {
    trace!(path = err.path().unwrap_or_default(), error = %err, "response validation failed");
    err
}

/// Hash-node and array-node helper: routes a child's result into the sink.
fn emit_child(
    sink: &mut dyn FieldSink,
    path: &Path<'_>,
    key: &str,
    value: ShapedValue,
    input: &Value,
) -> Result<(), ValidationError> {
    let field_path = path.key(key);
    sink.emit(&field_path, key, value)
        .map_err(|reason| coercion_failure(&field_path, reason, input.clone()))
}
