use crate::core::value::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AccessError {
    #[error("Cannot read field '{field}' from non-record value '{value}'")]
    NotARecord { field: String, value: String },

    #[error("Field '{field}' is not readable on {entity}")]
    Unreadable { entity: String, field: String },
}

/// Reads a named field off an instance value.
pub trait FieldAccessor: Send + Sync {
    fn get_field(&self, instance: &Value, field: &str) -> Result<Value, AccessError>;
}

/// Accessor over [`Record`](crate::records::record::Record) values.
///
/// Missing fields read as null.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordAccessor;

impl FieldAccessor for RecordAccessor {
    fn get_field(&self, instance: &Value, field: &str) -> Result<Value, AccessError> {
        match instance {
            Value::Record(record) => Ok(record.get_value(field)),
            other => Err(AccessError::NotARecord {
                field: field.to_string(),
                value: other.to_string(),
            }),
        }
    }
}
