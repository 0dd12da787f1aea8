use crate::error::FilterError;
use model::core::data_type::DataType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Field name of the segment that refers to the root instance itself.
pub const SELF_SEGMENT: &str = "this";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Argument {
    pub name: String,
    pub value: String,
}

/// One dereference step: `source_type.field_name`, yielding `field_type`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathSegment {
    pub source_type: String,
    pub field_type: DataType,
    pub field_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<Argument>,
}

impl PathSegment {
    pub fn new(source_type: &str, field_name: &str, field_type: DataType) -> Self {
        PathSegment {
            source_type: source_type.to_string(),
            field_type,
            field_name: field_name.to_string(),
            arguments: Vec::new(),
        }
    }

    /// A segment that stays on `entity` without reading a field.
    pub fn self_segment(entity: &str) -> Self {
        Self::new(entity, SELF_SEGMENT, DataType::Entity(entity.to_string()))
    }

    pub fn is_self(&self) -> bool {
        self.field_name == SELF_SEGMENT
    }

    /// Add an argument; a repeated name keeps its first position and takes the new value.
    pub fn with_argument(mut self, name: &str, value: &str) -> Self {
        match self.arguments.iter_mut().find(|a| a.name == name) {
            Some(existing) => existing.value = value.to_string(),
            None => self.arguments.push(Argument {
                name: name.to_string(),
                value: value.to_string(),
            }),
        }
        self
    }

    /// Whether this segment traverses a to-many relationship.
    pub fn is_to_many(&self) -> bool {
        matches!(&self.field_type, DataType::Collection(inner) if inner.is_entity())
    }

    /// The entity reached by this segment, if it is a relationship.
    pub fn target_type(&self) -> Option<&str> {
        self.field_type.entity_name()
    }
}

/// A non-empty chain of segments where each segment starts on the entity
/// the previous one reached.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<PathSegment>", into = "Vec<PathSegment>")]
pub struct Path {
    segments: Vec<PathSegment>,
}

impl Path {
    pub fn new(segments: Vec<PathSegment>) -> Result<Self, FilterError> {
        if segments.is_empty() {
            return Err(FilterError::InvalidPath("path has no segments".to_string()));
        }
        for pair in segments.windows(2) {
            let (current, next) = (&pair[0], &pair[1]);
            if current.target_type() != Some(next.source_type.as_str()) {
                return Err(FilterError::InvalidPath(format!(
                    "{}.{} does not lead to {}",
                    current.source_type, current.field_name, next.source_type
                )));
            }
        }
        Ok(Path { segments })
    }

    pub fn from_segment(segment: PathSegment) -> Self {
        Path {
            segments: vec![segment],
        }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn root(&self) -> &PathSegment {
        &self.segments[0]
    }

    pub fn leaf(&self) -> &PathSegment {
        &self.segments[self.segments.len() - 1]
    }

    pub fn root_type(&self) -> &str {
        &self.root().source_type
    }

    pub fn leaf_type(&self) -> &DataType {
        &self.leaf().field_type
    }

    /// Dotted field names, skipping self segments.
    pub fn field_path(&self) -> String {
        self.field_names().collect::<Vec<_>>().join(".")
    }

    /// Identifier-safe name derived from the root type and field names.
    pub fn alias(&self) -> String {
        std::iter::once(self.root_type())
            .chain(self.field_names())
            .collect::<Vec<_>>()
            .join("_")
    }

    fn field_names(&self) -> impl Iterator<Item = &str> {
        self.segments
            .iter()
            .filter(|s| !s.is_self())
            .map(|s| s.field_name.as_str())
    }

    /// Whether any segment before the leaf crosses a to-many relationship.
    pub fn has_to_many_before_leaf(&self) -> bool {
        self.segments[..self.segments.len() - 1]
            .iter()
            .any(PathSegment::is_to_many)
    }

    pub fn has_to_many(&self) -> bool {
        self.segments.iter().any(PathSegment::is_to_many)
    }

    /// Prefix `segment`, which must reach this path's root type.
    pub fn scoped_by(&self, segment: PathSegment) -> Result<Path, FilterError> {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.push(segment);
        segments.extend(self.segments.iter().cloned());
        Path::new(segments)
    }
}

impl TryFrom<Vec<PathSegment>> for Path {
    type Error = FilterError;

    fn try_from(segments: Vec<PathSegment>) -> Result<Self, Self::Error> {
        Path::new(segments)
    }
}

impl From<Path> for Vec<PathSegment> {
    fn from(path: Path) -> Self {
        path.segments
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = self.field_path();
        if fields.is_empty() {
            write!(f, "{}", self.root_type())
        } else {
            write!(f, "{}.{}", self.root_type(), fields)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn author_name() -> Path {
        Path::new(vec![
            PathSegment::new(
                "book",
                "authors",
                DataType::collection_of(DataType::Entity("author".into())),
            ),
            PathSegment::new("author", "name", DataType::String),
        ])
        .unwrap()
    }

    #[test]
    fn test_path_rendering() {
        let path = author_name();
        assert_eq!(path.to_string(), "book.authors.name");
        assert_eq!(path.field_path(), "authors.name");
        assert_eq!(path.alias(), "book_authors_name");
        assert!(path.has_to_many_before_leaf());
    }

    #[test]
    fn test_broken_chain_is_rejected() {
        let result = Path::new(vec![
            PathSegment::new("book", "title", DataType::String),
            PathSegment::new("author", "name", DataType::String),
        ]);
        assert!(matches!(result, Err(FilterError::InvalidPath(_))));
        assert!(Path::new(vec![]).is_err());
    }

    #[test]
    fn test_scoped_by_prefixes_root() {
        let name = Path::from_segment(PathSegment::new("author", "name", DataType::String));
        let scoped = name
            .scoped_by(PathSegment::new(
                "book",
                "authors",
                DataType::collection_of(DataType::Entity("author".into())),
            ))
            .unwrap();
        assert_eq!(scoped, author_name());

        let wrong = name.scoped_by(PathSegment::new("book", "title", DataType::String));
        assert!(wrong.is_err());
    }

    #[test]
    fn test_self_segment_is_skipped_in_names() {
        let path = Path::from_segment(PathSegment::self_segment("book"));
        assert_eq!(path.to_string(), "book");
        assert_eq!(path.alias(), "book");
        let scoped = path.scoped_by(PathSegment::self_segment("book")).unwrap();
        assert_eq!(scoped.segments().len(), 2);
    }

    #[test]
    fn test_repeated_argument_is_replaced() {
        let segment = PathSegment::new("book", "title", DataType::String)
            .with_argument("lang", "en")
            .with_argument("lang", "fr");
        assert_eq!(segment.arguments.len(), 1);
        assert_eq!(segment.arguments[0].value, "fr");
    }
}
