use crate::ast::operator::Operator;
use std::fmt;

/// Chooses the operator an RSQL equality or matching comparison maps to.
pub trait CaseSensitivityStrategy: Send + Sync + fmt::Debug {
    fn map_operator(&self, operator: Operator) -> Operator;
}

/// Leave case handling to the store's column collation.
#[derive(Debug, Clone, Copy, Default)]
pub struct UseColumnCollation;

impl CaseSensitivityStrategy for UseColumnCollation {
    fn map_operator(&self, operator: Operator) -> Operator {
        operator
    }
}

/// Compare case-insensitively regardless of the store's collation.
#[derive(Debug, Clone, Copy, Default)]
pub struct FoldCase;

impl CaseSensitivityStrategy for FoldCase {
    fn map_operator(&self, operator: Operator) -> Operator {
        use Operator::*;
        match operator {
            In => InInsensitive,
            Not => NotInsensitive,
            Prefix => PrefixInsensitive,
            NotPrefix => NotPrefixInsensitive,
            Postfix => PostfixInsensitive,
            NotPostfix => NotPostfixInsensitive,
            Infix => InfixInsensitive,
            NotInfix => NotInfixInsensitive,
            other => other,
        }
    }
}
