use crate::error::Result;
use filter_syntax::{FilterExpression, PathSegment};

/// Prefix `segment` to every leaf path.
///
/// Bind parameter names derive from the path, so they change with it.
pub fn rescope(expr: &FilterExpression, segment: &PathSegment) -> Result<FilterExpression> {
    Ok(match expr {
        FilterExpression::Predicate(predicate) => {
            FilterExpression::Predicate(predicate.scoped_by(segment.clone())?)
        }
        FilterExpression::And(left, right) => {
            FilterExpression::and(rescope(left, segment)?, rescope(right, segment)?)
        }
        FilterExpression::Or(left, right) => {
            FilterExpression::or(rescope(left, segment)?, rescope(right, segment)?)
        }
        FilterExpression::Not(operand) => FilterExpression::not(rescope(operand, segment)?),
    })
}

/// Prefix several segments; the resulting paths start with `segments` in slice order.
pub fn rescope_all(expr: &FilterExpression, segments: &[PathSegment]) -> Result<FilterExpression> {
    segments
        .iter()
        .rev()
        .try_fold(expr.clone(), |scoped, segment| rescope(&scoped, segment))
}
