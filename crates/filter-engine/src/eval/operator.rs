use crate::{
    error::{FilterError, Result},
    eval::{compare, resolve::resolve_path},
};
use filter_syntax::{FilterPredicate, Operator, Path};
use model::{
    access::FieldAccessor,
    core::{coerce::coerce, data_type::DataType, value::Value},
};

/// Apply `operator` to a resolved value.
///
/// Negated operators invert their dual. Apart from the collection operators, a
/// resolved collection matches when any of its members does.
pub fn evaluate(operator: Operator, resolved: &Value, operands: &[Value]) -> Result<bool> {
    use Operator::*;

    if operator.is_negated() {
        return Ok(!evaluate(operator.negate()?, resolved, operands)?);
    }

    let insensitive = operator.is_case_insensitive();
    let matched = match operator {
        In | InInsensitive => any_member(resolved, |v| {
            operands.iter().any(|o| compare::equals(v, o, insensitive))
        }),
        Prefix | PrefixInsensitive => {
            match_text(operator, resolved, operands, |v, o| v.starts_with(o))?
        }
        Postfix | PostfixInsensitive => {
            match_text(operator, resolved, operands, |v, o| v.ends_with(o))?
        }
        Infix | InfixInsensitive => {
            match_text(operator, resolved, operands, |v, o| v.contains(o))?
        }
        IsNull => resolved.is_null(),
        Lt => any_ordering(resolved, operands, |ord| ord.is_lt()),
        Le => any_ordering(resolved, operands, |ord| ord.is_le()),
        Gt => any_ordering(resolved, operands, |ord| ord.is_gt()),
        Ge => any_ordering(resolved, operands, |ord| ord.is_ge()),
        True => true,
        IsEmpty => match resolved {
            Value::List(items) => items.is_empty(),
            Value::Map(entries) => entries.is_empty(),
            Value::Null => true,
            _ => false,
        },
        HasMember => {
            let member = single_operand(operator, operands)?;
            match resolved {
                Value::List(items) => items.iter().any(|item| item.equal(member)),
                Value::Map(entries) => entries.iter().any(|(key, _)| key.equal(member)),
                _ => false,
            }
        }
        Between => {
            let [low, high] = operands else {
                return Err(arity_error(operator, operands));
            };
            any_member(resolved, |v| compare::within(v, low, high))
        }
        Not | NotInsensitive | NotPrefix | NotPrefixInsensitive | NotPostfix
        | NotPostfixInsensitive | NotInfix | NotInfixInsensitive | NotNull | False | NotEmpty
        | HasNoMember | NotBetween => return Err(FilterError::InvalidNegation(operator.to_string())),
    };
    Ok(matched)
}

fn any_member(resolved: &Value, test: impl Fn(&Value) -> bool) -> bool {
    match resolved {
        Value::Null => false,
        Value::List(items) => items.iter().filter(|v| !v.is_null()).any(test),
        single => test(single),
    }
}

/// Multiple operands are alternatives: the comparison holds if it holds for any of them.
fn any_ordering(
    resolved: &Value,
    operands: &[Value],
    accept: impl Fn(std::cmp::Ordering) -> bool,
) -> bool {
    any_member(resolved, |v| {
        operands
            .iter()
            .any(|o| compare::ordering(v, o).is_some_and(&accept))
    })
}

fn match_text(
    operator: Operator,
    resolved: &Value,
    operands: &[Value],
    test: impl Fn(&str, &str) -> bool,
) -> Result<bool> {
    let insensitive = operator.is_case_insensitive();
    let operand = single_operand(operator, operands)?;
    let Some(pattern) = compare::text(operand, insensitive) else {
        return Ok(false);
    };
    Ok(any_member(resolved, |v| {
        compare::text(v, insensitive).is_some_and(|actual| test(&actual, &pattern))
    }))
}

fn single_operand(operator: Operator, operands: &[Value]) -> Result<&Value> {
    match operands {
        [single] => Ok(single),
        _ => Err(arity_error(operator, operands)),
    }
}

fn arity_error(operator: Operator, operands: &[Value]) -> FilterError {
    operator
        .validate_arity(operands.len())
        .err()
        .unwrap_or_else(|| FilterError::bad_request(format!("Invalid operands for {operator}")))
}

/// A predicate prepared for repeated evaluation: arity checked, operands coerced.
#[derive(Debug, Clone)]
pub struct CompiledPredicate {
    path: Path,
    operator: Operator,
    operands: Vec<Value>,
}

impl CompiledPredicate {
    pub fn new(predicate: &FilterPredicate) -> Result<Self> {
        let operator = predicate.operator;
        predicate.validate_arity()?;
        if !operator.is_parameterized() {
            return Ok(CompiledPredicate {
                path: predicate.path.clone(),
                operator,
                operands: Vec::new(),
            });
        }

        let target = if operator.is_string_operator() {
            DataType::String
        } else {
            predicate.field_type().element_type().clone()
        };
        let operands = predicate
            .values
            .iter()
            .map(|v| -> Result<Value> {
                let coerced = coerce(v, &target)?;
                Ok(if operator.is_case_insensitive() {
                    compare::fold_case(&coerced)
                } else {
                    coerced
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(CompiledPredicate {
            path: predicate.path.clone(),
            operator,
            operands,
        })
    }

    pub fn test(&self, accessor: &dyn FieldAccessor, instance: &Value) -> Result<bool> {
        // Constants ignore the path entirely
        if self.operator.is_constant() {
            return evaluate(self.operator, &Value::Null, &[]);
        }
        let resolved = resolve_path(accessor, instance, &self.path)?;
        evaluate(self.operator, &resolved, &self.operands)
    }
}
