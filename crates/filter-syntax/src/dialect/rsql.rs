use crate::{
    ast::{expr::FilterExpression, operator::Operator},
    dialect::{
        FilterDialect, QueryParams, TypedExpressions,
        case_sensitivity::{CaseSensitivityStrategy, UseColumnCollation},
        path::{PredicateBuilder, split_selector},
        resolve_collection_type,
    },
    error::{FilterError, ParseError, Result},
    parser::{Rule, RsqlParser},
};
use lazy_static::lazy_static;
use model::{core::value::Value, schema::SchemaLookup};
use pest::{Parser, iterators::Pair};
use regex::Regex;
use std::sync::Arc;

lazy_static! {
    static ref TYPED_FILTER: Regex = Regex::new(r"^filter\[([^\[\]]+)\]$").unwrap();
}

/// RSQL expressions such as `title==*foo*;authors.name=ini=Hemingway`.
pub struct RsqlDialect {
    schema: Arc<dyn SchemaLookup>,
    strategy: Box<dyn CaseSensitivityStrategy>,
    allow_nested_to_many_in_typed: bool,
}

#[derive(Clone, Copy)]
struct Scope<'s> {
    root_type: &'s str,
    typed: bool,
}

impl RsqlDialect {
    pub fn new(schema: Arc<dyn SchemaLookup>) -> Self {
        RsqlDialect {
            schema,
            strategy: Box::new(UseColumnCollation),
            allow_nested_to_many_in_typed: false,
        }
    }

    pub fn with_strategy(mut self, strategy: Box<dyn CaseSensitivityStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn allow_nested_to_many_in_typed(mut self, allow: bool) -> Self {
        self.allow_nested_to_many_in_typed = allow;
        self
    }

    /// Parse `text` as an expression over `root_type`.
    pub fn parse_expression(&self, root_type: &str, text: &str) -> Result<FilterExpression> {
        self.parse_scoped(
            Scope {
                root_type,
                typed: false,
            },
            text,
        )
    }

    fn parse_scoped(&self, scope: Scope<'_>, text: &str) -> Result<FilterExpression> {
        let mut pairs =
            RsqlParser::parse(Rule::filter, text).map_err(ParseError::from_pest_error)?;
        let or_expr = pairs
            .next()
            .and_then(|filter| filter.into_inner().next())
            .ok_or_else(|| ParseError::new("Empty filter expression"))?;
        self.build_or(scope, or_expr)
    }

    fn build_or(&self, scope: Scope<'_>, pair: Pair<'_, Rule>) -> Result<FilterExpression> {
        let mut combined: Option<FilterExpression> = None;
        for and_expr in pair.into_inner() {
            let operand = self.build_and(scope, and_expr)?;
            combined = Some(match combined {
                Some(left) => FilterExpression::or(left, operand),
                None => operand,
            });
        }
        combined.ok_or_else(|| ParseError::new("Logical OR requires an operand").into())
    }

    fn build_and(&self, scope: Scope<'_>, pair: Pair<'_, Rule>) -> Result<FilterExpression> {
        let mut combined: Option<FilterExpression> = None;
        for constraint in pair.into_inner() {
            let operand = match constraint.as_rule() {
                Rule::group => {
                    let inner = constraint
                        .into_inner()
                        .next()
                        .ok_or_else(|| ParseError::new("Empty group"))?;
                    self.build_or(scope, inner)?
                }
                Rule::comparison => self.build_comparison(scope, constraint)?,
                other => {
                    return Err(ParseError::new(format!("Unexpected rule {other:?}")).into());
                }
            };
            combined = Some(match combined {
                Some(left) => FilterExpression::and(left, operand),
                None => operand,
            });
        }
        combined.ok_or_else(|| ParseError::new("Logical AND requires an operand").into())
    }

    fn build_comparison(&self, scope: Scope<'_>, pair: Pair<'_, Rule>) -> Result<FilterExpression> {
        let mut inner = pair.into_inner();
        let (Some(selector), Some(comparator), Some(arguments)) =
            (inner.next(), inner.next(), inner.next())
        else {
            return Err(ParseError::new("Incomplete comparison").into());
        };
        let selector = selector.as_str();
        let comparator = comparator.as_str();
        let arguments: Vec<String> = arguments.into_inner().map(argument_text).collect();

        let builder = PredicateBuilder::new(self.schema.as_ref());
        let parts = split_selector(selector)?;
        let path = builder.resolve_path(scope.root_type, &parts)?;

        let (operator, arguments) = self.select_operator(comparator, arguments)?;
        let predicate = builder.build(path, operator, arguments)?;

        if scope.typed
            && !self.allow_nested_to_many_in_typed
            && predicate.path.has_to_many_before_leaf()
        {
            return Err(ParseError::with_fragment(
                format!("Invalid toMany join: {selector}"),
                selector,
            )
            .into());
        }
        Ok(predicate.into())
    }

    /// Map a comparator and its arguments to an operator and its operands.
    fn select_operator(
        &self,
        comparator: &str,
        mut arguments: Vec<String>,
    ) -> Result<(Operator, Vec<String>)> {
        let mapped = |op: Operator| self.strategy.map_operator(op);

        let operator = match comparator {
            "==" | "!=" => {
                if arguments.len() != 1 {
                    return Err(ParseError::with_fragment(
                        format!("Operator {comparator} takes exactly one argument"),
                        comparator,
                    )
                    .into());
                }
                let (operator, stripped) = match_wildcards(&arguments[0]);
                arguments[0] = stripped;
                let operator = if comparator == "!=" {
                    operator.negate()?
                } else {
                    operator
                };
                mapped(operator)
            }
            "=in=" => mapped(Operator::In),
            "=out=" => mapped(Operator::Not),
            "=ini=" => Operator::InInsensitive,
            "=outi=" => Operator::NotInsensitive,
            "<" | "=lt=" => Operator::Lt,
            "<=" | "=le=" => Operator::Le,
            ">" | "=gt=" => Operator::Gt,
            ">=" | "=ge=" => Operator::Ge,
            "=isnull=" => {
                let isnull = boolean_argument(comparator, &arguments)?;
                return Ok((
                    if isnull { Operator::IsNull } else { Operator::NotNull },
                    Vec::new(),
                ));
            }
            "=isempty=" => {
                let isempty = boolean_argument(comparator, &arguments)?;
                return Ok((
                    if isempty { Operator::IsEmpty } else { Operator::NotEmpty },
                    Vec::new(),
                ));
            }
            "=hasmember=" => Operator::HasMember,
            "=hasnomember=" => Operator::HasNoMember,
            "=between=" => Operator::Between,
            "=notbetween=" => Operator::NotBetween,
            other => {
                return Err(ParseError::with_fragment(format!("Invalid operator {other}"), other).into());
            }
        };
        Ok((operator, arguments))
    }
}

/// `*x*` is infix, `*x` postfix and `x*` prefix; anything else is equality.
fn match_wildcards(argument: &str) -> (Operator, String) {
    let len = argument.chars().count();
    let starts = argument.starts_with('*');
    let ends = argument.ends_with('*');
    if starts && ends && len > 2 {
        (Operator::Infix, argument[1..argument.len() - 1].to_string())
    } else if starts && len > 1 {
        (Operator::Postfix, argument[1..].to_string())
    } else if ends && len > 1 {
        (Operator::Prefix, argument[..argument.len() - 1].to_string())
    } else {
        (Operator::In, argument.to_string())
    }
}

fn boolean_argument(comparator: &str, arguments: &[String]) -> Result<bool> {
    let parsed = match arguments {
        [single] => Value::string(single.as_str()).as_bool(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        FilterError::from(ParseError::with_fragment(
            format!("Invalid value for operator {comparator}"),
            comparator,
        ))
    })
}

fn argument_text(pair: Pair<'_, Rule>) -> String {
    match pair.as_rule() {
        Rule::double_quoted | Rule::single_quoted => pair
            .into_inner()
            .next()
            .map(|chars| unescape(chars.as_str()))
            .unwrap_or_default(),
        _ => pair.as_str().to_string(),
    }
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(ch);
        }
    }
    out
}

impl FilterDialect for RsqlDialect {
    fn name(&self) -> &'static str {
        "rsql"
    }

    fn recognizes(&self, params: &QueryParams) -> bool {
        !params.is_empty()
            && params.keys().all(|key| {
                key == "filter"
                    || TYPED_FILTER
                        .captures(key)
                        .and_then(|c| c.get(1))
                        .is_some_and(|m| !m.as_str().contains('.'))
            })
    }

    fn parse_global_expression(
        &self,
        url_path: &str,
        params: &QueryParams,
    ) -> Result<FilterExpression> {
        let single = || ParseError::new("There can only be a single filter query parameter");
        let (key, values) = match params.len() {
            1 => params.first().ok_or_else(single)?,
            _ => return Err(single().into()),
        };
        if key != "filter" {
            return Err(
                ParseError::with_fragment(format!("Invalid query parameter: {key}"), key).into(),
            );
        }
        let [text] = values.as_slice() else {
            return Err(single().into());
        };

        let root_type = resolve_collection_type(self.schema.as_ref(), url_path)?;
        self.parse_scoped(
            Scope {
                root_type: &root_type,
                typed: false,
            },
            text,
        )
    }

    fn parse_typed_expression(
        &self,
        _url_path: &str,
        params: &QueryParams,
    ) -> Result<TypedExpressions> {
        let mut expressions = TypedExpressions::new();
        for (key, values) in params {
            let invalid =
                || ParseError::with_fragment(format!("Invalid query parameter: {key}"), key);
            let type_name = TYPED_FILTER
                .captures(key)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str())
                .ok_or_else(invalid)?;
            let [text] = values.as_slice() else {
                return Err(ParseError::with_fragment(
                    format!("Exactly one RSQL expression must be defined for type : {type_name}"),
                    type_name,
                )
                .into());
            };
            if !self.schema.type_exists(type_name) {
                return Err(invalid().into());
            }

            let expr = self.parse_scoped(
                Scope {
                    root_type: type_name,
                    typed: true,
                },
                text,
            )?;
            expressions.insert(type_name.to_string(), expr);
        }
        Ok(expressions)
    }
}
