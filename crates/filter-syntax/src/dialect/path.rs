use crate::{
    ast::{
        operator::Operator,
        path::{Path, PathSegment},
        predicate::FilterPredicate,
    },
    error::{FilterError, ParseError},
};
use model::{
    core::{coerce::coerce, data_type::DataType, value::Value},
    schema::SchemaLookup,
};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref SEGMENT: Regex =
        Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)((?:\[[^\[\]]*\])*)$").unwrap();
    static ref ARGUMENT: Regex = Regex::new(r"\[([^:\[\]]+):([^\[\]]*)\]").unwrap();
}

/// Split a dotted selector on the dots that sit outside `[...]` annotations.
pub fn split_selector(selector: &str) -> Result<Vec<&str>, ParseError> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (idx, ch) in selector.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    ParseError::with_fragment(format!("Unbalanced ']' in {selector}"), selector)
                })?
            }
            '.' if depth == 0 => {
                parts.push(&selector[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(ParseError::with_fragment(
            format!("Unbalanced '[' in {selector}"),
            selector,
        ));
    }
    parts.push(&selector[start..]);

    if let Some(empty) = parts.iter().position(|p| p.is_empty()) {
        return Err(ParseError::with_fragment(
            format!("Empty path segment at position {} in {}", empty, selector),
            selector,
        ));
    }
    Ok(parts)
}

/// Decode a percent-encoded annotation value. Every `%` must start a two digit hex escape.
pub fn decode_argument(raw: &str) -> Result<String, ParseError> {
    let bytes = raw.as_bytes();
    for (idx, byte) in bytes.iter().enumerate() {
        if *byte == b'%' {
            let valid = bytes
                .get(idx + 1..idx + 3)
                .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
            if !valid {
                return Err(ParseError::with_fragment(
                    format!("Invalid percent encoding in argument: {raw}"),
                    raw,
                ));
            }
        }
    }
    urlencoding::decode(raw)
        .map(|decoded| decoded.into_owned())
        .map_err(|_| ParseError::with_fragment(format!("Argument is not valid UTF-8: {raw}"), raw))
}

/// Turns selectors into schema-checked paths and predicates.
pub struct PredicateBuilder<'a> {
    schema: &'a dyn SchemaLookup,
}

impl<'a> PredicateBuilder<'a> {
    pub fn new(schema: &'a dyn SchemaLookup) -> Self {
        PredicateBuilder { schema }
    }

    pub fn require_type(&self, type_name: &str) -> Result<(), ParseError> {
        if self.schema.type_exists(type_name) {
            Ok(())
        } else {
            Err(ParseError::with_fragment(
                format!("Unknown entity in filter: {type_name}"),
                type_name,
            ))
        }
    }

    /// Resolve `segments` starting from `root_type`.
    ///
    /// Every segment but the last must name a relationship.
    pub fn resolve_path(&self, root_type: &str, segments: &[&str]) -> Result<Path, ParseError> {
        self.require_type(root_type)?;
        if segments.is_empty() {
            return Err(ParseError::with_fragment(
                format!("No field given for {root_type}"),
                root_type,
            ));
        }

        let mut resolved = Vec::with_capacity(segments.len());
        let mut current = root_type.to_string();
        for (idx, raw) in segments.iter().enumerate() {
            let (name, arguments) = parse_segment(raw)?;
            let field = self.field_name(&current, name).ok_or_else(|| {
                ParseError::with_fragment(format!("Unknown field in filter: {current}.{name}"), name)
            })?;
            let field_type = self.schema.field_type(&current, &field).ok_or_else(|| {
                ParseError::with_fragment(format!("Unknown field in filter: {current}.{name}"), name)
            })?;

            let is_last = idx == segments.len() - 1;
            let cardinality = self.schema.relationship_cardinality(&current, &field);
            if !is_last && !cardinality.is_relationship() {
                return Err(ParseError::with_fragment(
                    format!("No such association {name} for type {current}"),
                    name,
                ));
            }

            let mut segment = PathSegment::new(&current, &field, field_type.clone());
            for (arg_name, arg_value) in arguments {
                segment = segment.with_argument(&arg_name, &arg_value);
            }
            resolved.push(segment);

            if let Some(target) = field_type.entity_name() {
                current = target.to_string();
            }
        }

        Path::new(resolved).map_err(|e| ParseError::new(e.to_string()))
    }

    /// Declared field for `name`, mapping an undeclared `id` to the type's id field.
    fn field_name(&self, type_name: &str, name: &str) -> Option<String> {
        if self.schema.field_exists(type_name, name) {
            return Some(name.to_string());
        }
        if name.eq_ignore_ascii_case("id") {
            return self
                .schema
                .id_field(type_name)
                .filter(|id| self.schema.field_exists(type_name, id));
        }
        None
    }

    /// Validate the operator against the path and coerce the raw operands.
    pub fn build(
        &self,
        path: Path,
        operator: Operator,
        raw_values: Vec<String>,
    ) -> Result<FilterPredicate, FilterError> {
        let path = self.complete_terminal(path, operator)?;
        validate_operator(&path, operator)?;

        if !operator.is_parameterized() {
            return Ok(FilterPredicate::new(path, operator, Vec::new()));
        }
        operator.validate_arity(raw_values.len())?;

        let target = operand_type(&path, operator);
        let values = raw_values
            .into_iter()
            .map(|raw| coerce(&Value::String(raw), &target))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FilterPredicate::new(path, operator, values))
    }

    /// A value comparison on a relationship compares the related entity's id.
    fn complete_terminal(&self, path: Path, operator: Operator) -> Result<Path, ParseError> {
        let leaf = path.leaf();
        let Some(target) = leaf.target_type().map(str::to_string) else {
            return Ok(path);
        };
        if !is_value_operator(operator) || leaf.is_self() {
            return Ok(path);
        }

        let id = self
            .schema
            .id_field(&target)
            .ok_or_else(|| ParseError::with_fragment(format!("{target} has no id field"), &target))?;
        let id_type = self.schema.field_type(&target, &id).ok_or_else(|| {
            ParseError::with_fragment(format!("Unknown field in filter: {target}.{id}"), &id)
        })?;

        let mut segments = path.segments().to_vec();
        segments.push(PathSegment::new(&target, &id, id_type));
        Path::new(segments).map_err(|e| ParseError::new(e.to_string()))
    }
}

fn parse_segment(raw: &str) -> Result<(&str, Vec<(String, String)>), ParseError> {
    let captures = SEGMENT.captures(raw).ok_or_else(|| {
        ParseError::with_fragment(format!("Invalid path segment: {raw}"), raw)
    })?;
    let name = captures.get(1).map_or("", |m| m.as_str());
    let annotations = captures.get(2).map_or("", |m| m.as_str());

    let mut arguments = Vec::new();
    let mut consumed = 0;
    for argument in ARGUMENT.captures_iter(annotations) {
        let whole = argument.get(0).map_or("", |m| m.as_str());
        consumed += whole.len();
        let key = argument.get(1).map_or("", |m| m.as_str());
        let value = argument.get(2).map_or("", |m| m.as_str());
        arguments.push((decode_argument(key)?, decode_argument(value)?));
    }
    if consumed != annotations.len() {
        return Err(ParseError::with_fragment(
            format!("Invalid argument annotation: {annotations}"),
            annotations,
        ));
    }
    Ok((name, arguments))
}

fn is_value_operator(operator: Operator) -> bool {
    !operator.is_null_operator() && !operator.is_constant() && !operator.is_collection_operator()
}

/// Check that the terminal fits the operator.
pub fn validate_operator(path: &Path, operator: Operator) -> Result<(), ParseError> {
    let leaf_type = path.leaf_type();
    let leaf = path.leaf();
    let fail = |message: &str| {
        ParseError::with_fragment(format!("{message}: {path}"), leaf.field_name.clone())
    };

    match operator {
        Operator::HasMember | Operator::HasNoMember => {
            if path.has_to_many_before_leaf() {
                if leaf_type.is_collection() {
                    return Err(fail("Invalid Path: Last Path Element cannot be a collection type"));
                }
            } else if !leaf_type.is_collection() || leaf.is_to_many() {
                return Err(fail("Invalid Path: Last Path Element has to be a collection type"));
            }
        }
        Operator::IsEmpty | Operator::NotEmpty => {
            if path.has_to_many_before_leaf() {
                return Err(fail(
                    "Invalid toMany join. toMany association has to be the target collection",
                ));
            }
            if !leaf_type.is_collection() {
                return Err(fail("Invalid Path: Last Path Element has to be a collection type"));
            }
        }
        op if op.is_null_operator() || op.is_constant() => {}
        _ => {
            if leaf_type.is_collection() || leaf_type.is_entity() {
                return Err(fail(&format!(
                    "Operator {operator} requires a scalar attribute"
                )));
            }
        }
    }
    Ok(())
}

/// Type literal operands are coerced to before comparison.
fn operand_type(path: &Path, operator: Operator) -> DataType {
    if operator.is_string_operator() {
        DataType::String
    } else {
        path.leaf_type().element_type().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::schema::{EntityDictionary, EntitySchema};

    fn schema() -> EntityDictionary {
        EntityDictionary::from_entities([
            EntitySchema::new("book")
                .id_field("id", DataType::Int)
                .attribute("title", DataType::String)
                .attribute("tags", DataType::collection_of(DataType::String))
                .to_one("publisher", "publisher")
                .to_many("authors", "author"),
            EntitySchema::new("author")
                .id_field("id", DataType::Int)
                .attribute("name", DataType::String),
            EntitySchema::new("publisher")
                .id_field("code", DataType::String)
                .attribute("name", DataType::String),
        ])
    }

    #[test]
    fn test_split_selector_respects_annotations() {
        assert_eq!(
            split_selector("authors.name[locale:en.US]").unwrap(),
            vec!["authors", "name[locale:en.US]"]
        );
        assert!(split_selector("authors..name").is_err());
        assert!(split_selector("name[x:y").is_err());
    }

    #[test]
    fn test_decode_argument() {
        assert_eq!(decode_argument("a%20b").unwrap(), "a b");
        let err = decode_argument("100%").unwrap_err();
        assert_eq!(err.fragment.as_deref(), Some("100%"));
        assert!(decode_argument("%zz").is_err());
    }

    #[test]
    fn test_resolve_path_with_arguments() {
        let schema = schema();
        let builder = PredicateBuilder::new(&schema);
        let path = builder
            .resolve_path("book", &["authors", "name[lang:en][fmt:a%2Cb]"])
            .unwrap();
        assert_eq!(path.to_string(), "book.authors.name");
        let args = &path.leaf().arguments;
        assert_eq!(args.len(), 2);
        assert_eq!(args[1].value, "a,b");
    }

    #[test]
    fn test_unknown_field_names_fragment() {
        let schema = schema();
        let builder = PredicateBuilder::new(&schema);
        let err = builder.resolve_path("book", &["badfield"]).unwrap_err();
        assert_eq!(err.fragment.as_deref(), Some("badfield"));
        assert!(err.message.contains("badfield"));

        let err = builder.resolve_path("book", &["title", "name"]).unwrap_err();
        assert_eq!(err.fragment.as_deref(), Some("title"));
    }

    #[test]
    fn test_id_alias_maps_to_id_field() {
        let schema = schema();
        let builder = PredicateBuilder::new(&schema);
        let path = builder.resolve_path("book", &["publisher", "id"]).unwrap();
        assert_eq!(path.leaf().field_name, "code");
    }

    #[test]
    fn test_relationship_terminal_compares_ids() {
        let schema = schema();
        let builder = PredicateBuilder::new(&schema);
        let path = builder.resolve_path("book", &["authors"]).unwrap();
        let predicate = builder
            .build(path, Operator::In, vec!["1".into(), "2".into()])
            .unwrap();
        assert_eq!(predicate.path.to_string(), "book.authors.id");
        assert_eq!(predicate.values, vec![Value::Int(1), Value::Int(2)]);
    }

    #[test]
    fn test_hasmember_requires_collection_terminal() {
        let schema = schema();
        let builder = PredicateBuilder::new(&schema);
        let title = builder.resolve_path("book", &["title"]).unwrap();
        let err = builder
            .build(title, Operator::HasMember, vec!["x".into()])
            .unwrap_err();
        assert!(matches!(err, FilterError::Parse(_)));

        let tags = builder.resolve_path("book", &["tags"]).unwrap();
        assert!(builder.build(tags, Operator::HasMember, vec!["x".into()]).is_ok());

        let names = builder.resolve_path("book", &["authors", "name"]).unwrap();
        assert!(builder.build(names, Operator::HasMember, vec!["x".into()]).is_ok());
    }

    #[test]
    fn test_isempty_rejects_nested_to_many() {
        let schema = schema();
        let builder = PredicateBuilder::new(&schema);
        let authors = builder.resolve_path("book", &["authors"]).unwrap();
        assert!(builder.build(authors, Operator::IsEmpty, vec![]).is_ok());

        let names = builder.resolve_path("book", &["authors", "name"]).unwrap();
        assert!(builder.build(names, Operator::IsEmpty, vec![]).is_err());
    }

    #[test]
    fn test_arity_and_coercion_errors() {
        let schema = schema();
        let builder = PredicateBuilder::new(&schema);
        let title = builder.resolve_path("book", &["title"]).unwrap();
        let err = builder
            .build(title, Operator::Prefix, vec!["a".into(), "b".into()])
            .unwrap_err();
        assert!(matches!(err, FilterError::BadRequest(_)));

        let id = builder.resolve_path("book", &["id"]).unwrap();
        let err = builder.build(id, Operator::Lt, vec!["ten".into()]).unwrap_err();
        assert!(matches!(err, FilterError::TypeCoercion(_)));
    }
}
