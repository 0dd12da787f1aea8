use filter_syntax::{FilterExpression, FilterPredicate};
use std::collections::HashSet;

/// Every distinct leaf predicate.
pub fn collect_predicates(expr: &FilterExpression) -> HashSet<FilterPredicate> {
    let mut leaves = HashSet::new();
    visit_leaves(expr, &mut |predicate| {
        leaves.insert(predicate.clone());
    });
    leaves
}

/// Leaf predicates in left-to-right order, keeping the first of any duplicates.
pub fn collect_predicates_ordered(expr: &FilterExpression) -> Vec<FilterPredicate> {
    let mut seen = HashSet::new();
    let mut leaves = Vec::new();
    visit_leaves(expr, &mut |predicate| {
        if seen.insert(predicate) {
            leaves.push(predicate.clone());
        }
    });
    leaves
}

fn visit_leaves<'e>(expr: &'e FilterExpression, visit: &mut impl FnMut(&'e FilterPredicate)) {
    match expr {
        FilterExpression::Predicate(predicate) => visit(predicate),
        FilterExpression::And(left, right) | FilterExpression::Or(left, right) => {
            visit_leaves(left, visit);
            visit_leaves(right, visit);
        }
        FilterExpression::Not(operand) => visit_leaves(operand, visit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filter_syntax::{Operator, Path, PathSegment};
    use model::core::{data_type::DataType, value::Value};

    fn genre_is(value: &str) -> FilterExpression {
        let path = Path::from_segment(PathSegment::new("book", "genre", DataType::String));
        FilterPredicate::single(path, Operator::In, value).into()
    }

    #[test]
    fn test_duplicate_leaves_are_collected_once() {
        let expr = FilterExpression::or(
            FilterExpression::and(genre_is("scifi"), genre_is("drama")),
            FilterExpression::not(genre_is("scifi")),
        );
        assert_eq!(collect_predicates(&expr).len(), 2);

        let ordered: Vec<String> = collect_predicates_ordered(&expr)
            .iter()
            .map(|p| p.to_string())
            .collect();
        assert_eq!(ordered, vec!["book.genre IN [scifi]", "book.genre IN [drama]"]);
    }

    #[test]
    fn test_nan_valued_duplicates_collapse() {
        let path = Path::from_segment(PathSegment::new("book", "score", DataType::Float));
        let nan = || -> FilterExpression {
            FilterPredicate::single(path.clone(), Operator::Lt, Value::Float(f64::NAN)).into()
        };
        let expr = FilterExpression::or(nan(), nan());
        assert_eq!(collect_predicates(&expr).len(), 1);
        assert_eq!(collect_predicates_ordered(&expr).len(), 1);
    }
}
