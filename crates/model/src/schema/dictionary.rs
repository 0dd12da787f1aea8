use crate::{
    core::data_type::DataType,
    schema::{Cardinality, SchemaLookup},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

fn default_id() -> String {
    "id".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    Attribute {
        #[serde(rename = "type")]
        data_type: DataType,
    },
    ToOne {
        target: String,
    },
    ToMany {
        target: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    #[serde(flatten)]
    pub kind: FieldKind,
    #[serde(default)]
    pub computed: bool,
}

impl FieldSchema {
    pub fn data_type(&self) -> DataType {
        match &self.kind {
            FieldKind::Attribute { data_type } => data_type.clone(),
            FieldKind::ToOne { target } => DataType::Entity(target.clone()),
            FieldKind::ToMany { target } => DataType::collection_of(DataType::Entity(target.clone())),
        }
    }

    pub fn cardinality(&self) -> Cardinality {
        match self.kind {
            FieldKind::Attribute { .. } => Cardinality::None,
            FieldKind::ToOne { .. } => Cardinality::ToOne,
            FieldKind::ToMany { .. } => Cardinality::ToMany,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySchema {
    pub name: String,
    #[serde(default = "default_id")]
    pub id: String,
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
}

impl EntitySchema {
    pub fn new(name: &str) -> Self {
        EntitySchema {
            name: name.to_string(),
            id: default_id(),
            fields: Vec::new(),
        }
    }

    pub fn id_field(mut self, name: &str, data_type: DataType) -> Self {
        self.id = name.to_string();
        self.attribute(name, data_type)
    }

    pub fn attribute(self, name: &str, data_type: DataType) -> Self {
        self.field(name, FieldKind::Attribute { data_type }, false)
    }

    pub fn computed_attribute(self, name: &str, data_type: DataType) -> Self {
        self.field(name, FieldKind::Attribute { data_type }, true)
    }

    pub fn to_one(self, name: &str, target: &str) -> Self {
        let kind = FieldKind::ToOne {
            target: target.to_string(),
        };
        self.field(name, kind, false)
    }

    pub fn to_many(self, name: &str, target: &str) -> Self {
        let kind = FieldKind::ToMany {
            target: target.to_string(),
        };
        self.field(name, kind, false)
    }

    fn field(mut self, name: &str, kind: FieldKind, computed: bool) -> Self {
        self.fields.push(FieldSchema {
            name: name.to_string(),
            kind,
            computed,
        });
        self
    }

    pub fn get(&self, field: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == field)
    }
}

/// In-memory schema registry keyed by entity type name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityDictionary {
    #[serde(with = "entity_list")]
    entities: HashMap<String, EntitySchema>,
}

impl EntityDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entities(entities: impl IntoIterator<Item = EntitySchema>) -> Self {
        let mut dictionary = Self::new();
        for entity in entities {
            dictionary.register(entity);
        }
        dictionary
    }

    pub fn from_json(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }

    /// Register an entity, replacing any previous schema with the same name.
    pub fn register(&mut self, entity: EntitySchema) -> Option<EntitySchema> {
        self.entities.insert(entity.name.clone(), entity)
    }

    pub fn entity(&self, type_name: &str) -> Option<&EntitySchema> {
        self.entities.get(type_name)
    }

    fn field(&self, type_name: &str, field: &str) -> Option<&FieldSchema> {
        self.entity(type_name).and_then(|e| e.get(field))
    }
}

impl SchemaLookup for EntityDictionary {
    fn type_exists(&self, type_name: &str) -> bool {
        self.entities.contains_key(type_name)
    }

    fn field_exists(&self, type_name: &str, field: &str) -> bool {
        self.field(type_name, field).is_some()
    }

    fn field_type(&self, type_name: &str, field: &str) -> Option<DataType> {
        self.field(type_name, field).map(FieldSchema::data_type)
    }

    fn relationship_cardinality(&self, type_name: &str, field: &str) -> Cardinality {
        self.field(type_name, field)
            .map(FieldSchema::cardinality)
            .unwrap_or(Cardinality::None)
    }

    fn id_field(&self, type_name: &str) -> Option<String> {
        self.entity(type_name).map(|e| e.id.clone())
    }

    fn is_computed(&self, type_name: &str, field: &str) -> bool {
        self.field(type_name, field).is_some_and(|f| f.computed)
    }
}

/// Entities are written as a JSON list and indexed by name on load.
mod entity_list {
    use super::EntitySchema;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::HashMap;

    pub fn serialize<S: Serializer>(
        entities: &HashMap<String, EntitySchema>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut list: Vec<&EntitySchema> = entities.values().collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        list.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<HashMap<String, EntitySchema>, D::Error> {
        let list = Vec::<EntitySchema>::deserialize(deserializer)?;
        Ok(list.into_iter().map(|e| (e.name.clone(), e)).collect())
    }
}
