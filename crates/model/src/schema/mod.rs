use crate::core::data_type::DataType;
use serde::{Deserialize, Serialize};

pub mod dictionary;

pub use dictionary::{EntityDictionary, EntitySchema, FieldKind, FieldSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    ToOne,
    ToMany,
    /// The field is an attribute (or does not exist).
    None,
}

impl Cardinality {
    pub fn is_relationship(self) -> bool {
        !matches!(self, Cardinality::None)
    }

    pub fn is_to_many(self) -> bool {
        matches!(self, Cardinality::ToMany)
    }
}

/// Entity metadata consulted while parsing and evaluating filters.
///
/// Implementations own any caching they do; the filter engine only reads.
pub trait SchemaLookup: Send + Sync {
    fn type_exists(&self, type_name: &str) -> bool;

    fn field_exists(&self, type_name: &str, field: &str) -> bool;

    fn field_type(&self, type_name: &str, field: &str) -> Option<DataType>;

    fn relationship_cardinality(&self, type_name: &str, field: &str) -> Cardinality;

    fn id_field(&self, type_name: &str) -> Option<String>;

    /// Computed fields have no storage column and cannot be filtered by the store.
    fn is_computed(&self, _type_name: &str, _field: &str) -> bool {
        false
    }
}
