use crate::{
    ast::expr::FilterExpression,
    dialect::{FilterDialect, QueryParams, TypedExpressions},
    error::{FilterError, ParseError, Result},
};
use tracing::debug;

/// Tries dialects in registration order; the first successful parse wins.
///
/// Only parse errors move on to the next dialect. Any other error is returned as is.
pub struct DialectChain {
    dialects: Vec<Box<dyn FilterDialect>>,
}

impl DialectChain {
    pub fn new(dialects: Vec<Box<dyn FilterDialect>>) -> Self {
        DialectChain { dialects }
    }

    pub fn with(mut self, dialect: impl FilterDialect + 'static) -> Self {
        self.dialects.push(Box::new(dialect));
        self
    }

    pub fn dialect_names(&self) -> Vec<&'static str> {
        self.dialects.iter().map(|d| d.name()).collect()
    }

    pub fn parse_global_expression(
        &self,
        url_path: &str,
        params: &QueryParams,
    ) -> Result<FilterExpression> {
        self.attempt(params, |dialect| dialect.parse_global_expression(url_path, params))
    }

    pub fn parse_typed_expression(
        &self,
        url_path: &str,
        params: &QueryParams,
    ) -> Result<TypedExpressions> {
        self.attempt(params, |dialect| dialect.parse_typed_expression(url_path, params))
    }

    fn attempt<T>(
        &self,
        params: &QueryParams,
        parse: impl Fn(&dyn FilterDialect) -> Result<T>,
    ) -> Result<T> {
        if self.dialects.is_empty() {
            return Err(ParseError::new("No filter dialect configured").into());
        }

        // Each failure with whether its dialect recognized the parameter keys
        let mut failures: Vec<(bool, ParseError)> = Vec::with_capacity(self.dialects.len());
        for dialect in &self.dialects {
            match parse(dialect.as_ref()) {
                Ok(parsed) => return Ok(parsed),
                Err(FilterError::Parse(err)) => {
                    debug!("{} dialect rejected filter: {}", dialect.name(), err);
                    failures.push((dialect.recognizes(params), err));
                }
                Err(other) => return Err(other),
            }
        }

        // Most recent failure first
        let message = failures
            .iter()
            .rev()
            .map(|(_, e)| e.message.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let fragment = failures
            .iter()
            .rev()
            .find(|(recognized, _)| *recognized)
            .or(failures.last())
            .and_then(|(_, e)| e.fragment.clone());
        Err(ParseError { message, fragment }.into())
    }
}
