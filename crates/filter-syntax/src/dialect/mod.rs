use crate::{ast::expr::FilterExpression, error::ParseError, error::Result};
use indexmap::IndexMap;
use model::schema::SchemaLookup;

pub mod bracketed;
pub mod case_sensitivity;
pub mod chain;
pub mod path;
pub mod rsql;

/// Query parameters in request order; a key may carry several values.
pub type QueryParams = IndexMap<String, Vec<String>>;

/// Sub-expressions keyed by the entity type they filter.
pub type TypedExpressions = IndexMap<String, FilterExpression>;

/// One textual filter grammar.
pub trait FilterDialect: Send + Sync {
    fn name(&self) -> &'static str;

    /// Parse a single expression rooted at the collection `url_path` addresses.
    fn parse_global_expression(&self, url_path: &str, params: &QueryParams)
    -> Result<FilterExpression>;

    /// Parse one expression per filtered type.
    fn parse_typed_expression(&self, url_path: &str, params: &QueryParams)
    -> Result<TypedExpressions>;

    /// Whether the parameter keys have this dialect's shape.
    ///
    /// A chain reports the fragment of a failure from a dialect that recognized the keys.
    fn recognizes(&self, _params: &QueryParams) -> bool {
        true
    }
}

/// Build query params from `key=value` pairs, keeping their order.
pub fn query_params<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> QueryParams
where
    K: Into<String>,
    V: Into<String>,
{
    let mut params = QueryParams::new();
    for (key, value) in pairs {
        params.entry(key.into()).or_default().push(value.into());
    }
    params
}

/// Normalize a URL path into its non-empty components, applying `.` and `..`.
pub fn path_components(url_path: &str) -> Vec<&str> {
    let mut components: Vec<&str> = Vec::new();
    for part in url_path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                components.pop();
            }
            other => components.push(other),
        }
    }
    components
}

/// The first collection named in `url_path`.
pub fn first_collection(url_path: &str) -> Option<&str> {
    path_components(url_path).first().copied()
}

/// Entity type of the collection `url_path` ends in.
///
/// The first component is a collection; after it components alternate between
/// an id and a relationship of the entity reached so far.
pub fn resolve_collection_type(
    schema: &dyn SchemaLookup,
    url_path: &str,
) -> std::result::Result<String, ParseError> {
    let components = path_components(url_path);
    let Some(first) = components.first() else {
        return Err(ParseError::new("No such collection: "));
    };
    if !schema.type_exists(first) {
        return Err(ParseError::with_fragment(
            format!("No such collection: {first}"),
            *first,
        ));
    }

    let mut current = first.to_string();
    for relationship in components.iter().skip(2).step_by(2) {
        let target = schema
            .field_type(&current, relationship)
            .filter(|_| {
                schema
                    .relationship_cardinality(&current, relationship)
                    .is_relationship()
            })
            .and_then(|t| t.entity_name().map(str::to_string));
        match target {
            Some(target) => current = target,
            None => {
                return Err(ParseError::with_fragment(
                    format!("No such collection: {relationship}"),
                    *relationship,
                ));
            }
        }
    }
    Ok(current)
}
