use serde::{Deserialize, Serialize};
use std::{borrow::Cow, fmt};

/// Declared type of an entity field.
///
/// Attributes carry a scalar or collection type; relationships carry the
/// target entity (wrapped in `Collection` for to-many relationships).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    String,
    Int,
    Float,
    Decimal,
    Boolean,
    Uuid,
    Date,
    Timestamp,
    Collection(Box<DataType>),
    Map {
        key: Box<DataType>,
        value: Box<DataType>,
    },
    Entity(String),
}

impl DataType {
    pub fn collection_of(element: DataType) -> Self {
        DataType::Collection(Box::new(element))
    }

    pub fn map_of(key: DataType, value: DataType) -> Self {
        DataType::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, DataType::Collection(_) | DataType::Map { .. })
    }

    pub fn is_entity(&self) -> bool {
        self.entity_name().is_some()
    }

    /// The type of a single member: collection element, map key, or the type itself.
    pub fn element_type(&self) -> &DataType {
        match self {
            DataType::Collection(inner) => inner.element_type(),
            DataType::Map { key, .. } => key.element_type(),
            other => other,
        }
    }

    /// Entity name reached through this type, if it is a relationship type.
    pub fn entity_name(&self) -> Option<&str> {
        match self {
            DataType::Entity(name) => Some(name),
            DataType::Collection(inner) => inner.entity_name(),
            _ => None,
        }
    }

    pub fn name(&self) -> Cow<'_, str> {
        match self {
            DataType::String => Cow::Borrowed("string"),
            DataType::Int => Cow::Borrowed("int"),
            DataType::Float => Cow::Borrowed("float"),
            DataType::Decimal => Cow::Borrowed("decimal"),
            DataType::Boolean => Cow::Borrowed("boolean"),
            DataType::Uuid => Cow::Borrowed("uuid"),
            DataType::Date => Cow::Borrowed("date"),
            DataType::Timestamp => Cow::Borrowed("timestamp"),
            DataType::Collection(inner) => Cow::Owned(format!("collection<{}>", inner.name())),
            DataType::Map { key, value } => {
                Cow::Owned(format!("map<{}, {}>", key.name(), value.name()))
            }
            DataType::Entity(name) => Cow::Borrowed(name),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_type_unwraps_collections() {
        let tags = DataType::collection_of(DataType::String);
        assert_eq!(tags.element_type(), &DataType::String);

        let prices = DataType::map_of(DataType::String, DataType::Decimal);
        assert_eq!(prices.element_type(), &DataType::String);
        assert!(prices.is_collection());
    }

    #[test]
    fn test_entity_name_through_to_many() {
        let books = DataType::collection_of(DataType::Entity("book".to_string()));
        assert_eq!(books.entity_name(), Some("book"));
        assert!(books.is_collection());
        assert_eq!(DataType::Int.entity_name(), None);
    }

    #[test]
    fn test_deserialize_nested_type() {
        let parsed: DataType = serde_json::from_str(r#"{"collection":"string"}"#).unwrap();
        assert_eq!(parsed, DataType::collection_of(DataType::String));
        assert_eq!(parsed.to_string(), "collection<string>");
    }
}
