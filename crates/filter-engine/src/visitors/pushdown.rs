use filter_syntax::{FilterExpression, FilterPredicate};
use model::schema::SchemaLookup;
use std::sync::Arc;
use tracing::debug;

/// Decides whether the store can evaluate a leaf without materializing the entity.
pub trait PushdownOracle: Send + Sync {
    fn is_pushdown_eligible(&self, predicate: &FilterPredicate) -> bool;
}

impl<F> PushdownOracle for F
where
    F: Fn(&FilterPredicate) -> bool + Send + Sync,
{
    fn is_pushdown_eligible(&self, predicate: &FilterPredicate) -> bool {
        self(predicate)
    }
}

/// Rejects leaves whose path reads a computed field.
pub struct SchemaPushdownOracle {
    schema: Arc<dyn SchemaLookup>,
}

impl SchemaPushdownOracle {
    pub fn new(schema: Arc<dyn SchemaLookup>) -> Self {
        SchemaPushdownOracle { schema }
    }
}

impl PushdownOracle for SchemaPushdownOracle {
    fn is_pushdown_eligible(&self, predicate: &FilterPredicate) -> bool {
        predicate
            .path
            .segments()
            .iter()
            .filter(|segment| !segment.is_self())
            .all(|segment| {
                !self
                    .schema
                    .is_computed(&segment.source_type, &segment.field_name)
            })
    }
}

enum Extraction {
    /// Equivalent to the input.
    Full(FilterExpression),
    /// Implied by the input, but weaker.
    Partial(FilterExpression),
    None,
}

impl Extraction {
    fn into_expr(self) -> Option<FilterExpression> {
        match self {
            Extraction::Full(expr) | Extraction::Partial(expr) => Some(expr),
            Extraction::None => None,
        }
    }
}

/// The largest part of `expr` the store can evaluate, or `None`.
///
/// Whenever the result is not the whole expression, the caller must evaluate the
/// full expression again in memory over what the store returns.
pub fn extract_pushdown(
    expr: &FilterExpression,
    oracle: &dyn PushdownOracle,
) -> Option<FilterExpression> {
    let extracted = extract(expr, oracle).into_expr();
    match &extracted {
        Some(store) => debug!("Pushdown of {} keeps {}", expr, store),
        None => debug!("Nothing in {} can be pushed down", expr),
    }
    extracted
}

fn extract(expr: &FilterExpression, oracle: &dyn PushdownOracle) -> Extraction {
    use Extraction::*;

    match expr {
        FilterExpression::Predicate(predicate) => {
            if oracle.is_pushdown_eligible(predicate) {
                Full(expr.clone())
            } else {
                None
            }
        }
        FilterExpression::And(left, right) => match (extract(left, oracle), extract(right, oracle)) {
            (Full(l), Full(r)) => Full(FilterExpression::and(l, r)),
            (Full(l) | Partial(l), Full(r) | Partial(r)) => Partial(FilterExpression::and(l, r)),
            (Full(only) | Partial(only), None) | (None, Full(only) | Partial(only)) => {
                Partial(only)
            }
            (None, None) => None,
        },
        // Dropping either branch of an OR would lose rows the store must return
        FilterExpression::Or(left, right) => match (extract(left, oracle), extract(right, oracle)) {
            (Full(l), Full(r)) => Full(FilterExpression::or(l, r)),
            (Full(l) | Partial(l), Full(r) | Partial(r)) => Partial(FilterExpression::or(l, r)),
            _ => None,
        },
        FilterExpression::Not(operand) => match extract(operand, oracle) {
            Full(inner) => Full(FilterExpression::not(inner)),
            Partial(_) | None => None,
        },
    }
}
