//! Array nodes.

use std::sync::Arc;

use serde_json::Value;

use super::{Processor, ProcessorKind};
use crate::error::{ConfigError, ValidationError};
use crate::path::Path;
use crate::value::ShapedValue;

/// An array of objects (one hash child) or of arbitrary values (no child).
///
/// With a child every element is processed in order, and element failures
/// report their index in the path. Without a child the array passes through
/// unchanged, and a single non-array value is wrapped in a one-element array.
#[derive(Debug, Clone, Default)]
pub struct ArrayNode {
    child: Option<Arc<Processor>>,
}

impl ArrayNode {
    /// Creates a node from the declared children.
    ///
    /// `key` names the declaration in the error message.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::InvalidArrayChildren`] when there is more than
    /// one child or the child is not a hash node.
    pub fn new(mut children: Vec<Arc<Processor>>, key: Option<&str>) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidArrayChildren {
            key: key.unwrap_or("<root>").to_string(),
        };
        match children.len() {
            0 => Ok(Self::passthrough()),
            1 => {
                let child = children.pop().ok_or_else(invalid)?;
                if !matches!(child.kind(), ProcessorKind::Hash(_)) {
                    return Err(invalid());
                }
                Ok(Self { child: Some(child) })
            }
            _ => Err(invalid()),
        }
    }

    /// A node without a child.
    pub fn passthrough() -> Self {
        Self { child: None }
    }

    /// The element processor, if any.
    pub fn child(&self) -> Option<&Arc<Processor>> {
        self.child.as_ref()
    }

    /// Processes an array.
    ///
    /// ## Errors
    ///
    /// Returns a type mismatch when a child is declared and `input` is not an
    /// array, or the first element failure.
    pub fn process(&self, input: &Value, path: &Path<'_>) -> Result<ShapedValue, ValidationError> {
        let Some(child) = &self.child else {
            return Ok(match input {
                Value::Array(_) => ShapedValue::from(input.clone()),
                other => ShapedValue::Array(vec![ShapedValue::from(other.clone())]),
            });
        };

        let Value::Array(items) = input else {
            return Err(ValidationError::TypeMismatch {
                path: path.to_string(),
                expected: "array",
                input: input.clone(),
            });
        };

        items
            .iter()
            .enumerate()
            .map(|(index, element)| child.execute(element, path, Some(index)))
            .collect::<Result<Vec<_>, _>>()
            .map(ShapedValue::Array)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::{HashNode, PrimitiveCast};
    use serde_json::json;

    fn item_shape() -> Arc<Processor> {
        let id = Processor::new(ProcessorKind::Primitive(PrimitiveCast::Integer)).keyed("id");
        let hash = HashNode::new(vec![Arc::new(id)]).unwrap();
        Arc::new(Processor::new(ProcessorKind::Hash(hash)))
    }

    #[test]
    fn test_elements_keep_order() {
        let node = ArrayNode::new(vec![item_shape()], Some("items")).unwrap();
        let out = node
            .process(&json!([{"id": 3}, {"id": "1"}, {"id": 2}]), &Path::root())
            .unwrap();
        assert_eq!(out.into_json(), json!([{"id": 3}, {"id": 1}, {"id": 2}]));
    }

    #[test]
    fn test_element_failure_reports_index() {
        let node = ArrayNode::new(vec![item_shape()], Some("items")).unwrap();
        let root = Path::root();
        let items = root.key("items");
        let err = node
            .process(&json!([{"id": 1}, {"name": "x"}]), &items)
            .unwrap_err();
        assert_eq!(err.path(), Some("items[1]->id"));
    }

    #[test]
    fn test_passthrough_wraps_scalars() {
        let node = ArrayNode::passthrough();
        assert_eq!(
            node.process(&json!(["a", 1]), &Path::root()).unwrap().into_json(),
            json!(["a", 1])
        );
        assert_eq!(
            node.process(&json!("solo"), &Path::root()).unwrap().into_json(),
            json!(["solo"])
        );
    }

    #[test]
    fn test_child_requires_array_input() {
        let node = ArrayNode::new(vec![item_shape()], None).unwrap();
        let err = node.process(&json!({"id": 1}), &Path::root()).unwrap_err();
        assert!(matches!(err, ValidationError::TypeMismatch { expected: "array", .. }));
    }

    #[test]
    fn test_invalid_children_rejected() {
        let scalar = Arc::new(Processor::new(ProcessorKind::Primitive(PrimitiveCast::String)));
        assert!(matches!(
            ArrayNode::new(vec![scalar], Some("tags")),
            Err(ConfigError::InvalidArrayChildren { key }) if key == "tags"
        ));
        assert!(ArrayNode::new(vec![item_shape(), item_shape()], None).is_err());
    }
}
