use filter_syntax::FilterExpression;

/// Deep copy with freshly allocated nodes throughout.
pub fn clone_expression(expr: &FilterExpression) -> FilterExpression {
    match expr {
        FilterExpression::Predicate(predicate) => FilterExpression::Predicate(predicate.clone()),
        FilterExpression::And(left, right) => {
            FilterExpression::and(clone_expression(left), clone_expression(right))
        }
        FilterExpression::Or(left, right) => {
            FilterExpression::or(clone_expression(left), clone_expression(right))
        }
        FilterExpression::Not(operand) => FilterExpression::not(clone_expression(operand)),
    }
}
