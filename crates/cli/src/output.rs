use crate::error::CliError;
use filter_engine::FilterSplit;
use filter_syntax::{FilterExpression, dialect::TypedExpressions};
use model::core::value::Value;
use serde_json::{Value as Json, json};

pub fn render_expression(expr: &FilterExpression, as_json: bool) -> Result<String, CliError> {
    if as_json {
        serde_json::to_string_pretty(expr).map_err(CliError::JsonSerialize)
    } else {
        Ok(expr.to_string())
    }
}

pub fn render_typed(expressions: &TypedExpressions, as_json: bool) -> Result<String, CliError> {
    if as_json {
        return serde_json::to_string_pretty(expressions).map_err(CliError::JsonSerialize);
    }
    Ok(expressions
        .iter()
        .map(|(type_name, expr)| format!("{type_name}: {expr}"))
        .collect::<Vec<_>>()
        .join("\n"))
}

pub fn render_split(split: &FilterSplit) -> Result<String, CliError> {
    let part = |expr: &Option<FilterExpression>| match expr {
        Some(expr) => Json::String(expr.to_string()),
        None => Json::Null,
    };
    let report = json!({
        "store": part(&split.store),
        "in_memory": part(&split.in_memory),
    });
    serde_json::to_string_pretty(&report).map_err(CliError::JsonSerialize)
}

pub fn render_records(records: &[Value]) -> Result<String, CliError> {
    let rendered = Json::Array(records.iter().map(Value::to_json).collect());
    serde_json::to_string_pretty(&rendered).map_err(CliError::JsonSerialize)
}
