use crate::error::FilterError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Filter comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    In,
    InInsensitive,
    Not,
    NotInsensitive,
    Prefix,
    PrefixInsensitive,
    NotPrefix,
    NotPrefixInsensitive,
    Postfix,
    PostfixInsensitive,
    NotPostfix,
    NotPostfixInsensitive,
    Infix,
    InfixInsensitive,
    NotInfix,
    NotInfixInsensitive,
    IsNull,
    NotNull,
    Lt,
    Le,
    Gt,
    Ge,
    True,
    False,
    IsEmpty,
    NotEmpty,
    HasMember,
    HasNoMember,
    Between,
    NotBetween,
}

/// Number of literal operands an operator accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    None,
    Exactly(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::None => count == 0,
            Arity::Exactly(n) => count == n,
            Arity::AtLeast(n) => count >= n,
        }
    }
}

/// Pairs of dual operators. Every operator appears exactly once.
const NEGATIONS: &[(Operator, Operator)] = &[
    (Operator::In, Operator::Not),
    (Operator::InInsensitive, Operator::NotInsensitive),
    (Operator::Prefix, Operator::NotPrefix),
    (Operator::PrefixInsensitive, Operator::NotPrefixInsensitive),
    (Operator::Postfix, Operator::NotPostfix),
    (Operator::PostfixInsensitive, Operator::NotPostfixInsensitive),
    (Operator::Infix, Operator::NotInfix),
    (Operator::InfixInsensitive, Operator::NotInfixInsensitive),
    (Operator::IsNull, Operator::NotNull),
    (Operator::Lt, Operator::Ge),
    (Operator::Gt, Operator::Le),
    (Operator::True, Operator::False),
    (Operator::IsEmpty, Operator::NotEmpty),
    (Operator::HasMember, Operator::HasNoMember),
    (Operator::Between, Operator::NotBetween),
];

impl Operator {
    pub const ALL: [Operator; 30] = [
        Operator::In,
        Operator::InInsensitive,
        Operator::Not,
        Operator::NotInsensitive,
        Operator::Prefix,
        Operator::PrefixInsensitive,
        Operator::NotPrefix,
        Operator::NotPrefixInsensitive,
        Operator::Postfix,
        Operator::PostfixInsensitive,
        Operator::NotPostfix,
        Operator::NotPostfixInsensitive,
        Operator::Infix,
        Operator::InfixInsensitive,
        Operator::NotInfix,
        Operator::NotInfixInsensitive,
        Operator::IsNull,
        Operator::NotNull,
        Operator::Lt,
        Operator::Le,
        Operator::Gt,
        Operator::Ge,
        Operator::True,
        Operator::False,
        Operator::IsEmpty,
        Operator::NotEmpty,
        Operator::HasMember,
        Operator::HasNoMember,
        Operator::Between,
        Operator::NotBetween,
    ];

    /// Stable wire notation used by the bracketed query-parameter form.
    pub fn notation(self) -> &'static str {
        use Operator::*;
        match self {
            In => "in",
            InInsensitive => "ini",
            Not => "not",
            NotInsensitive => "noti",
            Prefix => "prefix",
            PrefixInsensitive => "prefixi",
            NotPrefix => "notprefix",
            NotPrefixInsensitive => "notprefixi",
            Postfix => "postfix",
            PostfixInsensitive => "postfixi",
            NotPostfix => "notpostfix",
            NotPostfixInsensitive => "notpostfixi",
            Infix => "infix",
            InfixInsensitive => "infixi",
            NotInfix => "notinfix",
            NotInfixInsensitive => "notinfixi",
            IsNull => "isnull",
            NotNull => "notnull",
            Lt => "lt",
            Le => "le",
            Gt => "gt",
            Ge => "ge",
            True => "true",
            False => "false",
            IsEmpty => "isempty",
            NotEmpty => "notempty",
            HasMember => "hasmember",
            HasNoMember => "hasnomember",
            Between => "between",
            NotBetween => "notbetween",
        }
    }

    /// Upper-case name used in the canonical rendering of predicates.
    pub fn name(self) -> &'static str {
        use Operator::*;
        match self {
            In => "IN",
            InInsensitive => "IN_INSENSITIVE",
            Not => "NOT",
            NotInsensitive => "NOT_INSENSITIVE",
            Prefix => "PREFIX",
            PrefixInsensitive => "PREFIX_CASE_INSENSITIVE",
            NotPrefix => "NOT_PREFIX",
            NotPrefixInsensitive => "NOT_PREFIX_CASE_INSENSITIVE",
            Postfix => "POSTFIX",
            PostfixInsensitive => "POSTFIX_CASE_INSENSITIVE",
            NotPostfix => "NOT_POSTFIX",
            NotPostfixInsensitive => "NOT_POSTFIX_CASE_INSENSITIVE",
            Infix => "INFIX",
            InfixInsensitive => "INFIX_CASE_INSENSITIVE",
            NotInfix => "NOT_INFIX",
            NotInfixInsensitive => "NOT_INFIX_CASE_INSENSITIVE",
            IsNull => "ISNULL",
            NotNull => "NOTNULL",
            Lt => "LT",
            Le => "LE",
            Gt => "GT",
            Ge => "GE",
            True => "TRUE",
            False => "FALSE",
            IsEmpty => "ISEMPTY",
            NotEmpty => "NOTEMPTY",
            HasMember => "HASMEMBER",
            HasNoMember => "HASNOMEMBER",
            Between => "BETWEEN",
            NotBetween => "NOTBETWEEN",
        }
    }

    pub fn from_notation(notation: &str) -> Result<Operator, FilterError> {
        Operator::ALL
            .into_iter()
            .find(|op| op.notation() == notation)
            .ok_or_else(|| FilterError::bad_request(format!("Unknown operator in filter: {notation}")))
    }

    /// Whether the operator takes literal operands.
    pub fn is_parameterized(self) -> bool {
        !matches!(self.arity(), Arity::None)
    }

    pub fn arity(self) -> Arity {
        use Operator::*;
        match self {
            In | InInsensitive | Not | NotInsensitive | Lt | Le | Gt | Ge => Arity::AtLeast(1),
            Prefix
            | PrefixInsensitive
            | NotPrefix
            | NotPrefixInsensitive
            | Postfix
            | PostfixInsensitive
            | NotPostfix
            | NotPostfixInsensitive
            | Infix
            | InfixInsensitive
            | NotInfix
            | NotInfixInsensitive
            | HasMember
            | HasNoMember => Arity::Exactly(1),
            Between | NotBetween => Arity::Exactly(2),
            IsNull | NotNull | True | False | IsEmpty | NotEmpty => Arity::None,
        }
    }

    /// Check the operand count, returning a client error when it is wrong.
    pub fn validate_arity(self, count: usize) -> Result<(), FilterError> {
        if self.arity().accepts(count) {
            return Ok(());
        }
        let expected = match self.arity() {
            Arity::None => "no arguments".to_string(),
            Arity::Exactly(1) => "exactly one argument".to_string(),
            Arity::Exactly(n) => format!("exactly {n} arguments"),
            Arity::AtLeast(n) => format!("at least {n} argument(s)"),
        };
        Err(FilterError::bad_request(format!(
            "{} takes {}, got {}",
            self.name(),
            expected,
            count
        )))
    }

    /// The De Morgan dual of this operator.
    pub fn negate(self) -> Result<Operator, FilterError> {
        NEGATIONS
            .iter()
            .find_map(|&(positive, negative)| {
                if positive == self {
                    Some(negative)
                } else if negative == self {
                    Some(positive)
                } else {
                    None
                }
            })
            .ok_or_else(|| FilterError::InvalidNegation(self.name().to_string()))
    }

    /// Negated operators are evaluated by inverting their dual.
    pub fn is_negated(self) -> bool {
        use Operator::*;
        matches!(
            self,
            Not | NotInsensitive
                | NotPrefix
                | NotPrefixInsensitive
                | NotPostfix
                | NotPostfixInsensitive
                | NotInfix
                | NotInfixInsensitive
                | NotNull
                | False
                | NotEmpty
                | HasNoMember
                | NotBetween
        )
    }

    /// Positive prefix, postfix and infix operators of either case.
    pub fn is_matching_operator(self) -> bool {
        use Operator::*;
        matches!(
            self,
            Prefix
                | PrefixInsensitive
                | Postfix
                | PostfixInsensitive
                | Infix
                | InfixInsensitive
        )
    }

    /// Operators whose operands are compared as strings.
    pub fn is_string_operator(self) -> bool {
        use Operator::*;
        self.is_matching_operator()
            || matches!(
                self,
                NotPrefix
                    | NotPrefixInsensitive
                    | NotPostfix
                    | NotPostfixInsensitive
                    | NotInfix
                    | NotInfixInsensitive
            )
    }

    pub fn is_case_insensitive(self) -> bool {
        use Operator::*;
        matches!(
            self,
            InInsensitive
                | NotInsensitive
                | PrefixInsensitive
                | NotPrefixInsensitive
                | PostfixInsensitive
                | NotPostfixInsensitive
                | InfixInsensitive
                | NotInfixInsensitive
        )
    }

    /// Operators that inspect the resolved collection as a whole instead of its members.
    pub fn is_collection_operator(self) -> bool {
        use Operator::*;
        matches!(self, IsEmpty | NotEmpty | HasMember | HasNoMember)
    }

    pub fn is_null_operator(self) -> bool {
        matches!(self, Operator::IsNull | Operator::NotNull)
    }

    pub fn is_constant(self) -> bool {
        matches!(self, Operator::True | Operator::False)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Serialize for Operator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.notation())
    }
}

impl<'de> Deserialize<'de> for Operator {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let notation = String::deserialize(deserializer)?;
        Operator::from_notation(&notation).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negation_is_an_involution() {
        for op in Operator::ALL {
            let dual = op.negate().unwrap();
            assert_ne!(op, dual, "{op} must not be its own dual");
            assert_eq!(dual.negate().unwrap(), op);
        }
    }

    #[test]
    fn test_exactly_one_of_each_pair_is_negated() {
        for (positive, negative) in NEGATIONS {
            match (positive, negative) {
                // Ordering duals are both evaluated directly
                (Operator::Lt, Operator::Ge) | (Operator::Gt, Operator::Le) => {
                    assert!(!positive.is_negated() && !negative.is_negated());
                }
                _ => {
                    assert!(!positive.is_negated(), "{positive}");
                    assert!(negative.is_negated(), "{negative}");
                }
            }
        }
    }

    #[test]
    fn test_notation_round_trip() {
        for op in Operator::ALL {
            assert_eq!(Operator::from_notation(op.notation()).unwrap(), op);
        }
    }

    #[test]
    fn test_unknown_notation_is_bad_request() {
        let err = Operator::from_notation("like").unwrap_err();
        assert_eq!(
            err,
            FilterError::BadRequest("Unknown operator in filter: like".to_string())
        );
    }

    #[test]
    fn test_arity() {
        assert!(Operator::Infix.validate_arity(1).is_ok());
        assert!(Operator::Infix.validate_arity(2).is_err());
        assert!(Operator::Between.validate_arity(1).is_err());
        assert!(Operator::In.validate_arity(3).is_ok());
        assert!(Operator::Lt.validate_arity(0).is_err());
        assert!(!Operator::IsNull.is_parameterized());
        assert!(Operator::HasMember.is_parameterized());
    }
}
