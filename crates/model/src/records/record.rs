use crate::{
    core::{
        coerce::{CoercionError, coerce},
        data_type::DataType,
        value::Value,
    },
    schema::SchemaLookup,
};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldValue {
    pub name: String,
    pub value: Value,
}

/// A materialized entity instance: its type name and field values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    pub entity: String,
    pub field_values: Vec<FieldValue>,
}

impl Record {
    pub fn new(entity: &str, field_values: Vec<FieldValue>) -> Self {
        Record {
            entity: entity.to_string(),
            field_values,
        }
    }

    pub fn with_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set(name, value.into());
        self
    }

    pub fn set(&mut self, name: &str, value: Value) {
        match self.field_values.iter_mut().find(|f| f.name == name) {
            Some(existing) => existing.value = value,
            None => self.field_values.push(FieldValue {
                name: name.to_string(),
                value,
            }),
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.field_values.iter().find(|f| f.name == field)
    }

    pub fn get_value(&self, field: &str) -> Value {
        self.get(field)
            .map(|f| f.value.clone())
            .unwrap_or(Value::Null)
    }

    /// Build a record of `entity` from a JSON object, typing every declared field.
    ///
    /// Fields the schema does not declare are skipped.
    pub fn from_json(
        schema: &dyn SchemaLookup,
        entity: &str,
        json: &Json,
    ) -> Result<Record, CoercionError> {
        let Json::Object(object) = json else {
            return Err(CoercionError {
                value: json.to_string(),
                target: entity.to_string(),
            });
        };

        let mut record = Record::new(entity, Vec::with_capacity(object.len()));
        for (name, raw) in object {
            match schema.field_type(entity, name) {
                Some(data_type) => {
                    let value = value_from_json(schema, &data_type, raw)?;
                    record.set(name, value);
                }
                None => debug!("Skipping undeclared field {}.{}", entity, name),
            }
        }
        Ok(record)
    }

    pub fn to_json(&self) -> Json {
        Json::Object(
            self.field_values
                .iter()
                .map(|f| (f.name.clone(), f.value.to_json()))
                .collect(),
        )
    }
}

fn value_from_json(
    schema: &dyn SchemaLookup,
    data_type: &DataType,
    json: &Json,
) -> Result<Value, CoercionError> {
    match json {
        Json::Null => Ok(Value::Null),
        Json::Array(items) => {
            let element = match data_type {
                DataType::Collection(inner) => inner.as_ref(),
                other => other,
            };
            items
                .iter()
                .map(|item| value_from_json(schema, element, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List)
        }
        Json::Object(object) => match data_type {
            DataType::Entity(name) => Record::from_json(schema, name, json).map(Value::Record),
            DataType::Map { key, value } => object
                .iter()
                .map(|(k, v)| {
                    Ok((
                        coerce(&Value::String(k.clone()), key)?,
                        value_from_json(schema, value, v)?,
                    ))
                })
                .collect::<Result<Vec<_>, CoercionError>>()
                .map(Value::Map),
            other => Err(CoercionError {
                value: json.to_string(),
                target: other.to_string(),
            }),
        },
        Json::Bool(b) => coerce(&Value::Boolean(*b), data_type.element_type()),
        Json::Number(n) => {
            let raw = match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            };
            coerce(&raw, data_type.element_type())
        }
        Json::String(s) => coerce(&Value::String(s.clone()), data_type.element_type()),
    }
}
