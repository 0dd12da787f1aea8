use crate::error::Result;
use filter_syntax::FilterExpression;

/// Push every `NOT` down to the leaves by De Morgan's laws.
///
/// `NOT (NOT e)` becomes `e` and `NOT leaf` becomes the leaf under its dual operator.
pub fn normalize(expr: &FilterExpression) -> Result<FilterExpression> {
    Ok(match expr {
        FilterExpression::Predicate(predicate) => FilterExpression::Predicate(predicate.clone()),
        FilterExpression::And(left, right) => {
            FilterExpression::and(normalize(left)?, normalize(right)?)
        }
        FilterExpression::Or(left, right) => FilterExpression::or(normalize(left)?, normalize(right)?),
        FilterExpression::Not(operand) => negate(operand)?,
    })
}

fn negate(expr: &FilterExpression) -> Result<FilterExpression> {
    Ok(match expr {
        FilterExpression::Predicate(predicate) => FilterExpression::Predicate(predicate.negate()?),
        FilterExpression::And(left, right) => FilterExpression::or(negate(left)?, negate(right)?),
        FilterExpression::Or(left, right) => FilterExpression::and(negate(left)?, negate(right)?),
        FilterExpression::Not(operand) => normalize(operand)?,
    })
}
