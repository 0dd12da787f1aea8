use crate::{
    ast::{
        operator::Operator,
        path::{Path, PathSegment},
    },
    error::FilterError,
};
use model::core::{data_type::DataType, value::Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use xxhash_rust::xxh3::xxh3_64;

/// Leaf of a filter expression: `path operator values`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterPredicate {
    pub path: Path,
    pub operator: Operator,
    #[serde(default)]
    pub values: Vec<Value>,
}

/// A named bind parameter for a store query.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterParameter {
    pub name: String,
    pub value: Value,
}

impl FilterParameter {
    pub fn placeholder(&self) -> String {
        format!(":{}", self.name)
    }

    /// The value with `%` escaped, for use inside a LIKE pattern.
    pub fn escape_matching(&self) -> Value {
        match &self.value {
            Value::String(s) => Value::String(s.replace('%', "\\%")),
            other => other.clone(),
        }
    }
}

impl FilterPredicate {
    pub fn new(path: Path, operator: Operator, values: Vec<Value>) -> Self {
        FilterPredicate {
            path,
            operator,
            values,
        }
    }

    pub fn single(path: Path, operator: Operator, value: impl Into<Value>) -> Self {
        Self::new(path, operator, vec![value.into()])
    }

    pub fn in_values(path: Path, values: Vec<Value>) -> Self {
        Self::new(path, Operator::In, values)
    }

    pub fn infix(path: Path, value: impl Into<Value>) -> Self {
        Self::single(path, Operator::Infix, value)
    }

    pub fn is_null(path: Path) -> Self {
        Self::new(path, Operator::IsNull, Vec::new())
    }

    pub fn between(path: Path, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        Self::new(path, Operator::Between, vec![low.into(), high.into()])
    }

    /// Constant predicate on `entity`: `TRUE` when `value` holds, `FALSE` otherwise.
    pub fn constant(entity: &str, value: bool) -> Self {
        let operator = if value { Operator::True } else { Operator::False };
        Self::new(
            Path::from_segment(PathSegment::self_segment(entity)),
            operator,
            Vec::new(),
        )
    }

    /// Name of the leaf field.
    pub fn field(&self) -> &str {
        &self.path.leaf().field_name
    }

    pub fn field_path(&self) -> String {
        self.path.field_path()
    }

    pub fn entity_type(&self) -> &str {
        self.path.root_type()
    }

    pub fn field_type(&self) -> &DataType {
        self.path.leaf_type()
    }

    /// Same path and values under the dual operator.
    pub fn negate(&self) -> Result<FilterPredicate, FilterError> {
        Ok(FilterPredicate {
            path: self.path.clone(),
            operator: self.operator.negate()?,
            values: self.values.clone(),
        })
    }

    pub fn scoped_by(&self, segment: PathSegment) -> Result<FilterPredicate, FilterError> {
        Ok(FilterPredicate {
            path: self.path.scoped_by(segment)?,
            operator: self.operator,
            values: self.values.clone(),
        })
    }

    pub fn validate_arity(&self) -> Result<(), FilterError> {
        self.operator.validate_arity(self.values.len())
    }

    /// Bind parameters, one per value, named after the path alias.
    ///
    /// Names are stable for equal predicates and change when the path changes.
    pub fn parameters(&self) -> Vec<FilterParameter> {
        let base = format!(
            "{}_{:x}",
            self.path.alias(),
            xxh3_64(self.to_string().as_bytes())
        );
        self.values
            .iter()
            .enumerate()
            .map(|(idx, value)| FilterParameter {
                name: format!("{base}_{idx}"),
                value: value.clone(),
            })
            .collect()
    }
}

impl fmt::Display for FilterPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values = self
            .values
            .iter()
            .map(|value| match value {
                Value::String(s) if s.is_empty() => "\"\"".to_string(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{} {} [{}]", self.path, self.operator, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn title() -> Path {
        Path::from_segment(PathSegment::new("book", "title", DataType::String))
    }

    #[test]
    fn test_display_distinguishes_empty_string_from_no_values() {
        let empty = FilterPredicate::single(title(), Operator::In, "");
        assert_eq!(empty.to_string(), "book.title IN [\"\"]");
        let none = FilterPredicate::is_null(title());
        assert_eq!(none.to_string(), "book.title ISNULL []");
    }

    #[test]
    fn test_display() {
        let predicate = FilterPredicate::new(
            title(),
            Operator::In,
            vec![Value::string("Dune"), Value::string("Emma")],
        );
        assert_eq!(predicate.to_string(), "book.title IN [Dune, Emma]");
        assert_eq!(
            FilterPredicate::is_null(title()).to_string(),
            "book.title ISNULL []"
        );
    }

    #[test]
    fn test_equality_is_structural() {
        let a = FilterPredicate::infix(title(), "foo");
        let b = FilterPredicate::infix(title(), "foo");
        assert_eq!(a, b);
        assert_ne!(a, FilterPredicate::infix(title(), "bar"));
    }

    #[test]
    fn test_negate_keeps_path_and_values() {
        let predicate = FilterPredicate::between(title(), "a", "m");
        let negated = predicate.negate().unwrap();
        assert_eq!(negated.operator, Operator::NotBetween);
        assert_eq!(negated.values, predicate.values);
        assert_eq!(negated.negate().unwrap(), predicate);
    }

    #[test]
    fn test_parameters_follow_path_alias() {
        let predicate = FilterPredicate::in_values(title(), vec![Value::Int(1), Value::Int(2)]);
        let params = predicate.parameters();
        assert_eq!(params.len(), 2);
        assert!(params[0].name.starts_with("book_title_"));
        assert!(params[1].name.ends_with("_1"));
        assert_eq!(params[0].placeholder(), format!(":{}", params[0].name));

        let scoped = FilterPredicate::in_values(
            Path::from_segment(PathSegment::new("author", "title", DataType::String)),
            vec![Value::Int(1)],
        );
        assert_ne!(scoped.parameters()[0].name, params[0].name);
    }

    #[test]
    fn test_escape_matching() {
        let param = FilterParameter {
            name: "p".into(),
            value: Value::string("10%"),
        };
        assert_eq!(param.escape_matching(), Value::string("10\\%"));
    }
}
