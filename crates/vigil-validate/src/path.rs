//! Property paths from the validation root to a failing value.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One step of a [`PropertyPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathSegment {
    /// A named member (struct field)
    Field(String),
    /// Position inside a sequence container
    Index(usize),
    /// Key inside a map container
    Key(String),
}

impl PathSegment {
    pub fn field(name: impl Into<String>) -> Self {
        PathSegment::Field(name.into())
    }

    pub fn index(index: usize) -> Self {
        PathSegment::Index(index)
    }

    pub fn key(key: impl Into<String>) -> Self {
        PathSegment::Key(key.into())
    }
}

impl From<&str> for PathSegment {
    fn from(name: &str) -> Self {
        PathSegment::Field(name.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// Ordered sequence of typed segments.
///
/// Comparison is structural. The textual form (`addresses[2].city`,
/// `phones[home].number`) is only for external reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyPath {
    segments: Vec<PathSegment>,
}

impl PropertyPath {
    /// The empty path, denoting the root object itself.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_segments(segments: impl IntoIterator<Item = PathSegment>) -> Self {
        Self {
            segments: segments.into_iter().collect(),
        }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Name of the innermost field segment, if any.
    pub fn leaf_field(&self) -> Option<&str> {
        self.segments.iter().rev().find_map(|s| match s {
            PathSegment::Field(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Copy of this path with one more segment.
    pub fn child(&self, segment: PathSegment) -> Self {
        let mut path = self.clone();
        path.push(segment);
        path
    }

    pub(crate) fn push(&mut self, segment: PathSegment) {
        self.segments.push(segment);
    }

    pub(crate) fn pop(&mut self) {
        self.segments.pop();
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Field(name) if i == 0 => write!(f, "{name}")?,
                PathSegment::Field(name) => write!(f, ".{name}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
                PathSegment::Key(key) => write!(f, "[{key}]")?,
            }
        }
        Ok(())
    }
}

impl<S: Into<PathSegment>> FromIterator<S> for PropertyPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::from_segments(iter.into_iter().map(Into::into))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_dotted_and_bracketed() {
        let path = PropertyPath::from_segments([
            PathSegment::field("addresses"),
            PathSegment::index(2),
            PathSegment::field("city"),
        ]);
        assert_eq!(path.to_string(), "addresses[2].city");

        let path = PropertyPath::from_segments([
            PathSegment::field("phones"),
            PathSegment::key("home"),
            PathSegment::field("number"),
        ]);
        assert_eq!(path.to_string(), "phones[home].number");
    }

    #[test]
    fn root_renders_empty() {
        assert_eq!(PropertyPath::root().to_string(), "");
        assert!(PropertyPath::root().is_root());
    }

    #[test]
    fn structural_equality() {
        let built: PropertyPath = ["address", "city"].into_iter().collect();
        let explicit = PropertyPath::root()
            .child(PathSegment::field("address"))
            .child(PathSegment::field("city"));
        assert_eq!(built, explicit);
        assert_eq!(built.leaf_field(), Some("city"));
    }

    #[test]
    fn serializes_as_segment_list() {
        let path = PropertyPath::from_segments([PathSegment::field("items"), PathSegment::index(1)]);
        let json = serde_json::to_value(&path).unwrap();
        assert_eq!(json, serde_json::json!([{"field": "items"}, {"index": 1}]));
    }
}
