use crate::error::Result;
use filter_syntax::Path;
use model::{access::FieldAccessor, core::value::Value};

/// Walk `path` from `instance`.
///
/// A null short-circuits the walk. Through a collection, the field is read off
/// every element; nulls are dropped and collection results are flattened one level.
pub fn resolve_path(accessor: &dyn FieldAccessor, instance: &Value, path: &Path) -> Result<Value> {
    let mut current = instance.clone();
    for segment in path.segments() {
        if segment.is_self() {
            continue;
        }
        current = match current {
            Value::Null => return Ok(Value::Null),
            Value::List(items) => {
                let mut flattened = Vec::with_capacity(items.len());
                for item in &items {
                    match accessor.get_field(item, &segment.field_name)? {
                        Value::Null => {}
                        Value::List(inner) => {
                            flattened.extend(inner.into_iter().filter(|v| !v.is_null()))
                        }
                        other => flattened.push(other),
                    }
                }
                Value::List(flattened)
            }
            single => accessor.get_field(&single, &segment.field_name)?,
        };
    }
    Ok(current)
}
