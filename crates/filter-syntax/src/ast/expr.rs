use crate::ast::predicate::FilterPredicate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Boolean filter tree. Trees are never mutated; transformations build new ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterExpression {
    Predicate(FilterPredicate),
    And(Box<FilterExpression>, Box<FilterExpression>),
    Or(Box<FilterExpression>, Box<FilterExpression>),
    Not(Box<FilterExpression>),
}

impl FilterExpression {
    pub fn and(left: FilterExpression, right: FilterExpression) -> Self {
        FilterExpression::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: FilterExpression, right: FilterExpression) -> Self {
        FilterExpression::Or(Box::new(left), Box::new(right))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(operand: FilterExpression) -> Self {
        FilterExpression::Not(Box::new(operand))
    }

    /// Fold expressions left to right with AND; `None` when there are none.
    pub fn and_all(expressions: impl IntoIterator<Item = FilterExpression>) -> Option<Self> {
        expressions.into_iter().reduce(FilterExpression::and)
    }

    pub fn or_all(expressions: impl IntoIterator<Item = FilterExpression>) -> Option<Self> {
        expressions.into_iter().reduce(FilterExpression::or)
    }

    pub fn as_predicate(&self) -> Option<&FilterPredicate> {
        match self {
            FilterExpression::Predicate(predicate) => Some(predicate),
            _ => None,
        }
    }

    /// Root type of the left-most leaf.
    pub fn entity_type(&self) -> &str {
        match self {
            FilterExpression::Predicate(predicate) => predicate.entity_type(),
            FilterExpression::And(left, _)
            | FilterExpression::Or(left, _)
            | FilterExpression::Not(left) => left.entity_type(),
        }
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            FilterExpression::Predicate(_) => 1,
            FilterExpression::And(l, r) | FilterExpression::Or(l, r) => {
                l.leaf_count() + r.leaf_count()
            }
            FilterExpression::Not(e) => e.leaf_count(),
        }
    }
}

impl From<FilterPredicate> for FilterExpression {
    fn from(predicate: FilterPredicate) -> Self {
        FilterExpression::Predicate(predicate)
    }
}

impl fmt::Display for FilterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterExpression::Predicate(predicate) => write!(f, "{predicate}"),
            FilterExpression::And(left, right) => write!(f, "({left} AND {right})"),
            FilterExpression::Or(left, right) => write!(f, "({left} OR {right})"),
            FilterExpression::Not(operand) => write!(f, "NOT ({operand})"),
        }
    }
}
