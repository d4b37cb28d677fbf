//! Named, reusable response fragments.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::builder::ShapeBuilder;
use crate::error::ConfigError;
use crate::processor::Processor;

/// A registry of shapes shared between endpoints.
///
/// Fragments are built once and handed out as `Arc`s, so every endpoint that
/// embeds one shares the same tree.
///
/// ## Examples
///
/// ```rust
/// use contour::{ShapeBuilder, ShapeLibrary};
///
/// let mut library = ShapeLibrary::new();
/// library
///     .register("address", ShapeBuilder::new().object(|a| a.string("city").string("zip")))
///     .unwrap();
///
/// let user = ShapeBuilder::new()
///     .string("name")
///     .fragment("address", library.get("address").unwrap());
/// assert!(user.build().is_ok());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ShapeLibrary {
    fragments: IndexMap<String, Arc<Processor>>,
}

impl ShapeLibrary {
    /// Creates an empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds and registers a fragment.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::DuplicateFragment`] when `name` is taken, or the
    /// builder's own error.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        shape: ShapeBuilder,
    ) -> Result<Arc<Processor>, ConfigError> {
        let name = name.into();
        if self.fragments.contains_key(&name) {
            return Err(ConfigError::DuplicateFragment { name });
        }
        let processor = Arc::new(shape.build()?);
        self.fragments.insert(name, Arc::clone(&processor));
        Ok(processor)
    }

    /// Returns the fragment registered under `name`.
    pub fn get(&self, name: &str) -> Option<Arc<Processor>> {
        self.fragments.get(name).cloned()
    }

    /// Fragment names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fragments.keys().map(String::as_str)
    }

    /// Number of fragments.
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// Returns `true` when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_share() {
        let mut library = ShapeLibrary::new();
        let registered = library
            .register("money", ShapeBuilder::new().object(|m| m.float("amount").string("currency")))
            .unwrap();
        let fetched = library.get("money").unwrap();
        assert!(Arc::ptr_eq(&registered, &fetched));
        assert_eq!(library.names().collect::<Vec<_>>(), vec!["money"]);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut library = ShapeLibrary::new();
        library.register("id", ShapeBuilder::new().integer("id")).unwrap();
        let err = library
            .register("id", ShapeBuilder::new().string("id"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateFragment { name } if name == "id"));
        assert_eq!(library.len(), 1);
    }

    #[test]
    fn test_invalid_shape_is_not_registered() {
        let mut library = ShapeLibrary::new();
        assert!(library.register("empty", ShapeBuilder::new()).is_err());
        assert!(library.is_empty());
    }
}
