//! Traversal path tracking for diagnostics.
//!
//! A [`Path`] is a chain of stack frames: each level of the processor tree
//! borrows its parent's path and adds one segment, so tracking the location
//! costs nothing until an error message is rendered.

use std::fmt;

/// One step in a traversal path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// The tree root.
    Root,
    /// An object key.
    Key(&'a str),
    /// An array element index.
    Index(usize),
}

/// Location of a value relative to the root of a response.
///
/// ## Examples
///
/// ```rust
/// use contour::Path;
///
/// let root = Path::root();
/// let items = root.key("items");
/// let second = items.index(1);
/// let id = second.key("id");
/// assert_eq!(id.to_string(), "items[1]->id");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Path<'a> {
    parent: Option<&'a Path<'a>>,
    segment: Segment<'a>,
}

impl Path<'static> {
    /// The empty path.
    pub fn root() -> Self {
        Self {
            parent: None,
            segment: Segment::Root,
        }
    }
}

impl Default for Path<'static> {
    fn default() -> Self {
        Self::root()
    }
}

impl<'a> Path<'a> {
    /// Extends the path with an object key.
    pub fn key<'b>(&'b self, key: &'b str) -> Path<'b> {
        Path {
            parent: Some(self),
            segment: Segment::Key(key),
        }
    }

    /// Extends the path with an array index.
    pub fn index<'b>(&'b self, index: usize) -> Path<'b> {
        Path {
            parent: Some(self),
            segment: Segment::Index(index),
        }
    }

    /// Returns the last segment.
    pub fn segment(&self) -> Segment<'a> {
        self.segment
    }

    /// Returns `true` when no key or index has been added.
    pub fn is_root(&self) -> bool {
        self.segments().is_empty()
    }

    /// Returns the segments from the root down, excluding the root marker.
    pub fn segments(&self) -> Vec<Segment<'a>> {
        let mut out = Vec::new();
        let mut current = Some(self);
        while let Some(path) = current {
            if path.segment != Segment::Root {
                out.push(path.segment);
            }
            current = path.parent;
        }
        out.reverse();
        out
    }
}

impl fmt::Display for Path<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let segments = self.segments();
        if segments.is_empty() {
            return f.write_str("<root>");
        }
        for (position, segment) in segments.iter().enumerate() {
            match segment {
                Segment::Key(key) if position == 0 => f.write_str(key)?,
                Segment::Key(key) => write!(f, "->{key}")?,
                Segment::Index(index) => write!(f, "[{index}]")?,
                Segment::Root => {}
            }
        }
        Ok(())
    }
}
