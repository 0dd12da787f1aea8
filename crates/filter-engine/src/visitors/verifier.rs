use crate::visitors::pushdown::PushdownOracle;
use filter_syntax::FilterExpression;

/// Whether any leaf must be evaluated over materialized instances.
pub fn should_execute_in_memory(expr: &FilterExpression, oracle: &dyn PushdownOracle) -> bool {
    match expr {
        FilterExpression::Predicate(predicate) => !oracle.is_pushdown_eligible(predicate),
        FilterExpression::And(left, right) | FilterExpression::Or(left, right) => {
            should_execute_in_memory(left, oracle) || should_execute_in_memory(right, oracle)
        }
        FilterExpression::Not(operand) => should_execute_in_memory(operand, oracle),
    }
}
