use model::core::value::Value;
use std::cmp::Ordering;

/// Lower-case string values; everything else is returned unchanged.
pub fn fold_case(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(s.to_lowercase()),
        other => other.clone(),
    }
}

pub fn equals(actual: &Value, operand: &Value, insensitive: bool) -> bool {
    if insensitive {
        fold_case(actual).equal(operand)
    } else {
        actual.equal(operand)
    }
}

/// String form used by the matching operators; `None` for values without one.
pub fn text(value: &Value, insensitive: bool) -> Option<String> {
    let text = value.as_string()?;
    Some(if insensitive { text.to_lowercase() } else { text })
}

pub fn ordering(actual: &Value, operand: &Value) -> Option<Ordering> {
    actual.compare(operand)
}

/// Inclusive range check; incomparable bounds never match.
pub fn within(actual: &Value, low: &Value, high: &Value) -> bool {
    matches!(ordering(actual, low), Some(Ordering::Greater | Ordering::Equal))
        && matches!(ordering(actual, high), Some(Ordering::Less | Ordering::Equal))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insensitive_equality() {
        assert!(equals(&Value::string("Dune"), &Value::string("dune"), true));
        assert!(!equals(&Value::string("Dune"), &Value::string("dune"), false));
        assert!(equals(&Value::Int(3), &Value::Float(3.0), true));
    }

    #[test]
    fn test_within_is_inclusive() {
        let (low, high) = (Value::Int(1), Value::Int(3));
        assert!(within(&Value::Int(1), &low, &high));
        assert!(within(&Value::Int(3), &low, &high));
        assert!(!within(&Value::Int(4), &low, &high));
        assert!(!within(&Value::string("2"), &low, &high));
    }
}
