use crate::{
    ast::{expr::FilterExpression, operator::Operator, predicate::FilterPredicate},
    dialect::{
        FilterDialect, QueryParams, TypedExpressions, first_collection,
        path::{PredicateBuilder, split_selector},
    },
    error::{ParseError, Result},
};
use indexmap::IndexMap;
use model::schema::SchemaLookup;
use std::sync::Arc;

/// `filter[<type>.<path>][<operator>]=v1,v2` query parameters.
pub struct BracketedDialect {
    schema: Arc<dyn SchemaLookup>,
}

struct FilterKey<'k> {
    selector: &'k str,
    operator: Option<&'k str>,
}

impl BracketedDialect {
    pub fn new(schema: Arc<dyn SchemaLookup>) -> Self {
        BracketedDialect { schema }
    }

    fn extract_predicates(&self, params: &QueryParams) -> Result<Vec<FilterPredicate>> {
        let builder = PredicateBuilder::new(self.schema.as_ref());
        let mut predicates = Vec::new();

        for (key, values) in params {
            let invalid = || ParseError::with_fragment(format!("Invalid filter format: {key}"), key);
            let parsed = parse_key(key).ok_or_else(invalid)?;

            let parts = split_selector(parsed.selector)?;
            if parts.len() < 2 {
                return Err(invalid().into());
            }
            let operator = match parsed.operator {
                Some(notation) => Operator::from_notation(notation)?,
                None => Operator::In,
            };

            let path = builder.resolve_path(parts[0], &parts[1..])?;
            let raw_values = values
                .iter()
                .flat_map(|v| v.split(','))
                .map(str::to_string)
                .collect();
            predicates.push(builder.build(path, operator, raw_values)?);
        }

        Ok(predicates)
    }
}

/// Split `filter[selector]` or `filter[selector][op]`, allowing annotations inside the selector.
fn parse_key(key: &str) -> Option<FilterKey<'_>> {
    let rest = key.strip_prefix("filter[")?;

    let mut depth = 1usize;
    let mut close = None;
    for (idx, ch) in rest.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    close = Some(idx);
                    break;
                }
            }
            _ => {}
        }
    }
    let close = close?;
    let selector = &rest[..close];
    if selector.is_empty() {
        return None;
    }

    let tail = &rest[close + 1..];
    let operator = if tail.is_empty() {
        None
    } else {
        let op = tail.strip_prefix('[')?.strip_suffix(']')?;
        if op.is_empty() || op.contains(['[', ']']) {
            return None;
        }
        Some(op)
    };
    Some(FilterKey { selector, operator })
}

impl FilterDialect for BracketedDialect {
    fn name(&self) -> &'static str {
        "bracketed"
    }

    fn recognizes(&self, params: &QueryParams) -> bool {
        !params.is_empty()
            && params
                .keys()
                .all(|key| parse_key(key).is_some_and(|parsed| parsed.selector.contains('.')))
    }

    fn parse_global_expression(
        &self,
        url_path: &str,
        params: &QueryParams,
    ) -> Result<FilterExpression> {
        let predicates = self.extract_predicates(params)?;
        let collection = first_collection(url_path).unwrap_or_default();

        for predicate in &predicates {
            // Predicates must start on the first collection in the URL
            if predicate.entity_type() != collection {
                return Err(ParseError::with_fragment(
                    format!("Invalid predicate: {predicate}"),
                    predicate.entity_type(),
                )
                .into());
            }
        }

        FilterExpression::and_all(predicates.into_iter().map(FilterExpression::from))
            .ok_or_else(|| ParseError::new("No filter parameters given").into())
    }

    fn parse_typed_expression(
        &self,
        _url_path: &str,
        params: &QueryParams,
    ) -> Result<TypedExpressions> {
        let mut grouped: IndexMap<String, Vec<FilterExpression>> = IndexMap::new();
        for predicate in self.extract_predicates(params)? {
            grouped
                .entry(predicate.entity_type().to_string())
                .or_default()
                .push(predicate.into());
        }

        let expressions: TypedExpressions = grouped
            .into_iter()
            .filter_map(|(entity, predicates)| {
                FilterExpression::and_all(predicates).map(|expr| (entity, expr))
            })
            .collect();
        Ok(expressions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key() {
        let key = parse_key("filter[book.title][prefix]").unwrap();
        assert_eq!(key.selector, "book.title");
        assert_eq!(key.operator, Some("prefix"));

        let key = parse_key("filter[book.title[lang:en]]").unwrap();
        assert_eq!(key.selector, "book.title[lang:en]");
        assert_eq!(key.operator, None);

        assert!(parse_key("filter").is_none());
        assert!(parse_key("filter[]").is_none());
        assert!(parse_key("filter[book.title]junk").is_none());
        assert!(parse_key("sort").is_none());
    }
}
