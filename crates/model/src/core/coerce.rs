use crate::core::{data_type::DataType, value::Value};
use bigdecimal::{BigDecimal, FromPrimitive, ToPrimitive};
use chrono::{DateTime, NaiveDate, Utc};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Error)]
#[error("Unable to coerce '{value}' to {target}")]
pub struct CoercionError {
    pub value: String,
    pub target: String,
}

impl CoercionError {
    pub fn new(value: &Value, target: &DataType) -> Self {
        CoercionError {
            value: value.to_string(),
            target: target.to_string(),
        }
    }
}

/// Coerce a value to the given declared type.
///
/// Collection, map and entity targets are not coerced; the value is returned unchanged.
/// Null coerces to null for every target.
pub fn coerce(value: &Value, target: &DataType) -> Result<Value, CoercionError> {
    let fail = || CoercionError::new(value, target);

    if value.is_null() {
        return Ok(Value::Null);
    }

    match target {
        DataType::String => value.as_string().map(Value::String).ok_or_else(fail),
        DataType::Int => match value {
            Value::Int(v) => Ok(Value::Int(*v)),
            // i64::MAX is not representable as f64, so the upper bound is exclusive
            Value::Float(v)
                if v.fract() == 0.0 && *v >= i64::MIN as f64 && *v < i64::MAX as f64 =>
            {
                Ok(Value::Int(*v as i64))
            }
            Value::Decimal(v) if v.is_integer() => v.to_i64().map(Value::Int).ok_or_else(fail),
            Value::String(s) => s.trim().parse::<i64>().map(Value::Int).map_err(|_| fail()),
            _ => Err(fail()),
        },
        DataType::Float => match value {
            Value::Int(v) => Ok(Value::Float(*v as f64)),
            Value::Float(v) => Ok(Value::Float(*v)),
            Value::Decimal(v) => v.to_f64().map(Value::Float).ok_or_else(fail),
            Value::String(s) => s.trim().parse::<f64>().map(Value::Float).map_err(|_| fail()),
            _ => Err(fail()),
        },
        DataType::Decimal => match value {
            Value::Int(v) => Ok(Value::Decimal(BigDecimal::from(*v))),
            Value::Float(v) => BigDecimal::from_f64(*v).map(Value::Decimal).ok_or_else(fail),
            Value::Decimal(v) => Ok(Value::Decimal(v.clone())),
            Value::String(s) => BigDecimal::from_str(s.trim())
                .map(Value::Decimal)
                .map_err(|_| fail()),
            _ => Err(fail()),
        },
        DataType::Boolean => match value {
            Value::Boolean(_) | Value::Int(_) | Value::String(_) => {
                value.as_bool().map(Value::Boolean).ok_or_else(fail)
            }
            _ => Err(fail()),
        },
        DataType::Uuid => match value {
            Value::Uuid(v) => Ok(Value::Uuid(*v)),
            Value::String(s) => Uuid::parse_str(s.trim()).map(Value::Uuid).map_err(|_| fail()),
            _ => Err(fail()),
        },
        DataType::Date => match value {
            Value::Date(v) => Ok(Value::Date(*v)),
            Value::Timestamp(v) => Ok(Value::Date(v.date_naive())),
            Value::String(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .map(Value::Date)
                .map_err(|_| fail()),
            _ => Err(fail()),
        },
        DataType::Timestamp => match value {
            Value::Timestamp(v) => Ok(Value::Timestamp(*v)),
            Value::Date(v) => v
                .and_hms_opt(0, 0, 0)
                .map(|dt| Value::Timestamp(dt.and_utc()))
                .ok_or_else(fail),
            // Integers are epoch milliseconds
            Value::Int(millis) => DateTime::<Utc>::from_timestamp_millis(*millis)
                .map(Value::Timestamp)
                .ok_or_else(fail),
            Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
                .map(|dt| Value::Timestamp(dt.with_timezone(&Utc)))
                .map_err(|_| fail()),
            _ => Err(fail()),
        },
        DataType::Collection(_) | DataType::Map { .. } | DataType::Entity(_) => Ok(value.clone()),
    }
}
