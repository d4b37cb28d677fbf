//! Declarative construction of processor trees.
//!
//! A [`ShapeBuilder`] collects field declarations in order and turns them
//! into a [`Processor`] tree with [`ShapeBuilder::build`]. Nested `array` and
//! `hash` declarations take a closure that fills a child builder; the child
//! inherits the parent's [`Defaults`] unless it sets its own.
//!
//! ## Root resolution
//!
//! Once all fields are collected:
//!
//! - a single *unnamed* field ([`ShapeBuilder::object`], [`ShapeBuilder::elements`]
//!   or [`FieldSpec::unnamed`]) is the root, as-is. When the block is a top-level
//!   array and that field is an object, it becomes the array's element shape.
//! - otherwise the fields become the children of a synthesized object node,
//!   itself wrapped in an array node when the block is a top-level array.
//!
//! ## Examples
//!
//! ```rust
//! use contour::{FieldSpec, Path, ShapeBuilder};
//! use serde_json::json;
//!
//! let shape = ShapeBuilder::new()
//!     .integer("id")
//!     .field(FieldSpec::string("fullName").rename("full_name"))
//!     .array("tags", |tags| tags.string("label"))
//!     .build()
//!     .unwrap();
//!
//! let out = shape
//!     .execute(
//!         &json!({"id": "7", "fullName": "Ada", "tags": [{"label": "math"}]}),
//!         &Path::root(),
//!         None,
//!     )
//!     .unwrap();
//! assert_eq!(
//!     out.into_json(),
//!     json!({"id": 7, "full_name": "Ada", "tags": [{"label": "math"}]})
//! );
//! ```

use std::sync::Arc;

use serde_json::Value;

use crate::error::ConfigError;
use crate::filter::{Postfilter, Prefilter, ValueMap};
use crate::processor::{
    ArrayNode, BooleanOptions, HashNode, PrimitiveCast, Processor, ProcessorKind, TemporalKind,
    TemporalOptions, TypedCast,
};
use crate::value::ShapedValue;

/// Presence rules applied to every field that does not override them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Defaults {
    /// Whether keys may be absent.
    pub optional: bool,
    /// Whether present values may be null.
    pub allow_nil: bool,
}

impl Defaults {
    /// Fields may be absent and null.
    pub fn lenient() -> Self {
        Self {
            optional: true,
            allow_nil: true,
        }
    }
}

/// The semantic type of a declared field.
#[derive(Debug, Clone)]
pub enum FieldType {
    /// A primitive cast.
    Primitive(PrimitiveCast),
    /// Truthy/falsy resolution.
    Boolean,
    /// Date, time or date-time parsing.
    Temporal(TemporalKind),
    /// A user supplied conversion.
    Typed(TypedCast),
    /// A nested object; an empty block passes the object through.
    Hash(ShapeBuilder),
    /// A nested array of objects; an empty block passes the array through.
    Array(ShapeBuilder),
    /// A shared, prebuilt shape.
    Fragment(Arc<Processor>),
}

/// One field declaration with its local overrides.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    key: Option<String>,
    field_type: FieldType,
    optional: Option<bool>,
    allow_nil: Option<bool>,
    rename: Option<String>,
    prefilter: Option<Prefilter>,
    postfilter: Option<Postfilter>,
    map: Option<ValueMap>,
    format: Option<String>,
    on_error: Option<ShapedValue>,
    truthy: Option<Vec<String>>,
    falsy: Option<Vec<String>>,
}

impl FieldSpec {
    /// Declares a field read from (and written to) `key`.
    pub fn new(key: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            key: Some(key.into()),
            ..Self::unnamed(field_type)
        }
    }

    /// Declares a field that processes the whole input instead of a key.
    pub fn unnamed(field_type: FieldType) -> Self {
        Self {
            key: None,
            field_type,
            optional: None,
            allow_nil: None,
            rename: None,
            prefilter: None,
            postfilter: None,
            map: None,
            format: None,
            on_error: None,
            truthy: None,
            falsy: None,
        }
    }

    /// A string field.
    pub fn string(key: impl Into<String>) -> Self {
        Self::new(key, FieldType::Primitive(PrimitiveCast::String))
    }

    /// An integer field.
    pub fn integer(key: impl Into<String>) -> Self {
        Self::new(key, FieldType::Primitive(PrimitiveCast::Integer))
    }

    /// A float field.
    pub fn float(key: impl Into<String>) -> Self {
        Self::new(key, FieldType::Primitive(PrimitiveCast::Float))
    }

    /// A symbol field.
    pub fn symbol(key: impl Into<String>) -> Self {
        Self::new(key, FieldType::Primitive(PrimitiveCast::Symbol))
    }

    /// A field copied verbatim.
    pub fn value(key: impl Into<String>) -> Self {
        Self::new(key, FieldType::Primitive(PrimitiveCast::Any))
    }

    /// A boolean field.
    pub fn boolean(key: impl Into<String>) -> Self {
        Self::new(key, FieldType::Boolean)
    }

    /// A date field.
    pub fn date(key: impl Into<String>) -> Self {
        Self::new(key, FieldType::Temporal(TemporalKind::Date))
    }

    /// A time field.
    pub fn time(key: impl Into<String>) -> Self {
        Self::new(key, FieldType::Temporal(TemporalKind::Time))
    }

    /// A date-time field.
    pub fn datetime(key: impl Into<String>) -> Self {
        Self::new(key, FieldType::Temporal(TemporalKind::DateTime))
    }

    /// A field converted by a user supplied cast.
    pub fn typed(key: impl Into<String>, cast: TypedCast) -> Self {
        Self::new(key, FieldType::Typed(cast))
    }

    /// A nested object whose fields are declared by `block`.
    pub fn hash(key: impl Into<String>, block: impl FnOnce(ShapeBuilder) -> ShapeBuilder) -> Self {
        Self::new(key, FieldType::Hash(block(ShapeBuilder::nested())))
    }

    /// A nested array whose element fields are declared by `block`.
    pub fn array(key: impl Into<String>, block: impl FnOnce(ShapeBuilder) -> ShapeBuilder) -> Self {
        Self::new(key, FieldType::Array(block(ShapeBuilder::nested())))
    }

    /// An array passed through without per-element processing.
    pub fn array_of_values(key: impl Into<String>) -> Self {
        Self::new(key, FieldType::Array(ShapeBuilder::nested()))
    }

    /// A shared shape placed under `key`.
    pub fn fragment(key: impl Into<String>, shape: Arc<Processor>) -> Self {
        Self::new(key, FieldType::Fragment(shape))
    }

    /// Overrides whether the key may be absent.
    #[must_use]
    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = Some(optional);
        self
    }

    /// Overrides whether the value may be null.
    #[must_use]
    pub fn allow_nil(mut self, allow_nil: bool) -> Self {
        self.allow_nil = Some(allow_nil);
        self
    }

    /// Writes the result under `key` instead of the read key.
    #[must_use]
    pub fn rename(mut self, key: impl Into<String>) -> Self {
        self.rename = Some(key.into());
        self
    }

    /// Transforms the raw value before anything else.
    #[must_use]
    pub fn prefilter(mut self, f: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        self.prefilter = Some(Prefilter::new(f));
        self
    }

    /// Transforms the processed value.
    #[must_use]
    pub fn postfilter(
        mut self,
        f: impl Fn(ShapedValue) -> ShapedValue + Send + Sync + 'static,
    ) -> Self {
        self.postfilter = Some(Postfilter::new(f));
        self
    }

    /// Alias of [`FieldSpec::postfilter`].
    #[must_use]
    pub fn filter(self, f: impl Fn(ShapedValue) -> ShapedValue + Send + Sync + 'static) -> Self {
        self.postfilter(f)
    }

    /// Replaces raw values through a table; unmapped values become null.
    #[must_use]
    pub fn map(mut self, entries: impl IntoIterator<Item = (Value, Value)>) -> Self {
        self.map = Some(ValueMap::new(entries));
        self
    }

    /// Parse format for date and time fields.
    #[must_use]
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Fallback for date and time fields that fail to parse.
    #[must_use]
    pub fn on_error(mut self, fallback: ShapedValue) -> Self {
        self.on_error = Some(fallback);
        self
    }

    /// Truthy set for boolean fields.
    #[must_use]
    pub fn truthy<I>(mut self, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.truthy = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Falsy set for boolean fields.
    #[must_use]
    pub fn falsy<I>(mut self, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.falsy = Some(values.into_iter().map(Into::into).collect());
        self
    }

    fn is_unnamed(&self) -> bool {
        self.key.is_none()
    }

    fn is_object(&self) -> bool {
        match &self.field_type {
            FieldType::Hash(_) => true,
            FieldType::Fragment(shape) => matches!(shape.kind(), ProcessorKind::Hash(_)),
            _ => false,
        }
    }

    fn build(&self, defaults: Defaults) -> Result<Processor, ConfigError> {
        let base = match &self.field_type {
            FieldType::Fragment(shape) => (**shape).clone(),
            other => Processor::new(self.kind(other, defaults)?),
        };

        let mut processor = base
            .optional(self.optional.unwrap_or(defaults.optional))
            .allow_nil(self.allow_nil.unwrap_or(defaults.allow_nil));
        if let Some(key) = &self.key {
            processor = processor.keyed(key.as_str());
        }
        if let Some(key) = &self.rename {
            processor = processor.write_as(key.as_str());
        }
        if let Some(filter) = &self.prefilter {
            processor = processor.prefilter(filter.clone());
        }
        if let Some(filter) = &self.postfilter {
            processor = processor.postfilter(filter.clone());
        }
        if let Some(map) = &self.map {
            processor = processor.value_map(map.clone());
        }
        Ok(processor)
    }

    fn kind(&self, field_type: &FieldType, defaults: Defaults) -> Result<ProcessorKind, ConfigError> {
        Ok(match field_type {
            FieldType::Primitive(cast) => ProcessorKind::Primitive(*cast),
            FieldType::Boolean => {
                let mut options = BooleanOptions::default();
                if let Some(truthy) = &self.truthy {
                    options = options.with_truthy(truthy.iter().cloned());
                }
                if let Some(falsy) = &self.falsy {
                    options = options.with_falsy(falsy.iter().cloned());
                }
                ProcessorKind::Boolean(options)
            }
            FieldType::Temporal(kind) => ProcessorKind::Temporal(TemporalOptions {
                kind: *kind,
                format: self.format.clone(),
                on_error: self.on_error.clone(),
            }),
            FieldType::Typed(cast) => ProcessorKind::Typed(cast.clone()),
            FieldType::Hash(block) => {
                ProcessorKind::Hash(HashNode::new(block.children(defaults)?)?)
            }
            FieldType::Array(block) => {
                let element = if block.fields.is_empty() {
                    Vec::new()
                } else {
                    let node = HashNode::new(block.children(defaults)?)?;
                    vec![Arc::new(Processor::new(ProcessorKind::Hash(node)))]
                };
                ProcessorKind::Array(ArrayNode::new(element, self.key.as_deref())?)
            }
            // Fragments are cloned in `build`.
            FieldType::Fragment(shape) => shape.kind().clone(),
        })
    }
}

/// Collects field declarations and builds a processor tree.
#[derive(Debug, Clone, Default)]
pub struct ShapeBuilder {
    fields: Vec<FieldSpec>,
    defaults: Option<Defaults>,
    top_level_array: bool,
}

impl ShapeBuilder {
    /// A builder with strict defaults: fields are required and non-null.
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder for a nested block, inheriting the enclosing defaults.
    fn nested() -> Self {
        Self::default()
    }

    /// Sets the defaults for this block and the blocks nested in it.
    #[must_use]
    pub fn defaults(mut self, defaults: Defaults) -> Self {
        self.defaults = Some(defaults);
        self
    }

    /// Declares that the response is an array of the declared shape.
    #[must_use]
    pub fn top_level_array(mut self, top_level_array: bool) -> Self {
        self.top_level_array = top_level_array;
        self
    }

    /// Adds a field declaration.
    #[must_use]
    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    /// Adds a required string field.
    #[must_use]
    pub fn string(self, key: impl Into<String>) -> Self {
        self.field(FieldSpec::string(key))
    }

    /// Adds an integer field.
    #[must_use]
    pub fn integer(self, key: impl Into<String>) -> Self {
        self.field(FieldSpec::integer(key))
    }

    /// Adds a float field.
    #[must_use]
    pub fn float(self, key: impl Into<String>) -> Self {
        self.field(FieldSpec::float(key))
    }

    /// Adds a boolean field with the default truthy/falsy sets.
    #[must_use]
    pub fn boolean(self, key: impl Into<String>) -> Self {
        self.field(FieldSpec::boolean(key))
    }

    /// Adds a symbol field.
    #[must_use]
    pub fn symbol(self, key: impl Into<String>) -> Self {
        self.field(FieldSpec::symbol(key))
    }

    /// Adds a date field with the default format.
    #[must_use]
    pub fn date(self, key: impl Into<String>) -> Self {
        self.field(FieldSpec::date(key))
    }

    /// Adds a time field with the default format.
    #[must_use]
    pub fn time(self, key: impl Into<String>) -> Self {
        self.field(FieldSpec::time(key))
    }

    /// Adds an RFC 3339 date-time field.
    #[must_use]
    pub fn datetime(self, key: impl Into<String>) -> Self {
        self.field(FieldSpec::datetime(key))
    }

    /// Adds a verbatim field.
    #[must_use]
    pub fn value(self, key: impl Into<String>) -> Self {
        self.field(FieldSpec::value(key))
    }

    /// Adds a nested array of objects.
    #[must_use]
    pub fn array(self, key: impl Into<String>, block: impl FnOnce(Self) -> Self) -> Self {
        self.field(FieldSpec::array(key, block))
    }

    /// Adds a nested object.
    #[must_use]
    pub fn hash(self, key: impl Into<String>, block: impl FnOnce(Self) -> Self) -> Self {
        self.field(FieldSpec::hash(key, block))
    }

    /// Adds an array passed through verbatim.
    #[must_use]
    pub fn array_of_values(self, key: impl Into<String>) -> Self {
        self.field(FieldSpec::array_of_values(key))
    }

    /// Adds a shared shape under `key`.
    #[must_use]
    pub fn fragment(self, key: impl Into<String>, shape: Arc<Processor>) -> Self {
        self.field(FieldSpec::fragment(key, shape))
    }

    /// Declares the whole input as an object with the fields of `block`.
    #[must_use]
    pub fn object(self, block: impl FnOnce(Self) -> Self) -> Self {
        self.field(FieldSpec::unnamed(FieldType::Hash(block(Self::nested()))))
    }

    /// Declares the whole input as an array of objects with the fields of `block`.
    #[must_use]
    pub fn elements(self, block: impl FnOnce(Self) -> Self) -> Self {
        self.field(FieldSpec::unnamed(FieldType::Array(block(Self::nested()))))
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` when no field has been declared.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Builds the root processor.
    ///
    /// The builder is not consumed; building twice yields equivalent trees.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::EmptyShape`] when nothing was declared, and any
    /// error found while wiring nested nodes (duplicate keys, unnamed fields
    /// next to other fields, invalid array children).
    pub fn build(&self) -> Result<Processor, ConfigError> {
        self.build_with(Defaults::default())
    }

    fn build_with(&self, inherited: Defaults) -> Result<Processor, ConfigError> {
        let defaults = self.defaults.unwrap_or(inherited);
        let [only] = self.fields.as_slice() else {
            return self.synthesize(defaults);
        };
        if !only.is_unnamed() {
            return self.synthesize(defaults);
        }

        let root = only.build(defaults)?;
        if self.top_level_array && only.is_object() {
            let node = ArrayNode::new(vec![Arc::new(root)], None)?;
            return Ok(Processor::new(ProcessorKind::Array(node)));
        }
        Ok(root)
    }

    fn synthesize(&self, defaults: Defaults) -> Result<Processor, ConfigError> {
        if self.fields.is_empty() {
            return Err(ConfigError::EmptyShape {
                context: "response shape declares no fields".to_string(),
            });
        }
        let hash = Processor::new(ProcessorKind::Hash(HashNode::new(self.children(defaults)?)?));
        if !self.top_level_array {
            return Ok(hash);
        }
        let node = ArrayNode::new(vec![Arc::new(hash)], None)?;
        Ok(Processor::new(ProcessorKind::Array(node)))
    }

    fn children(&self, inherited: Defaults) -> Result<Vec<Arc<Processor>>, ConfigError> {
        let defaults = self.defaults.unwrap_or(inherited);
        self.fields
            .iter()
            .map(|spec| spec.build(defaults).map(Arc::new))
            .collect()
    }
}
