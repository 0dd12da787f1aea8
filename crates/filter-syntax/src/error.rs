use crate::parser::Rule;
use model::{access::AccessError, core::coerce::CoercionError};
use pest::error::Error as PestError;
use thiserror::Error;

/// Malformed filter text or a path/operator combination the schema rejects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    /// The part of the input the error is about, when one can be singled out.
    pub fragment: Option<String>,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        ParseError {
            message: message.into(),
            fragment: None,
        }
    }

    pub fn with_fragment(message: impl Into<String>, fragment: impl Into<String>) -> Self {
        ParseError {
            message: message.into(),
            fragment: Some(fragment.into()),
        }
    }

    pub fn from_pest_error(err: PestError<Rule>) -> Self {
        use pest::error::LineColLocation;

        let column = match err.line_col {
            LineColLocation::Pos((_, c)) => c,
            LineColLocation::Span((_, c), _) => c,
        };
        let snippet = err.line().to_string();
        let fragment: String = snippet.chars().skip(column.saturating_sub(1)).collect();

        ParseError {
            message: format!(
                "Invalid filter at column {}: {}\n{}\n{}^",
                column,
                err.variant.message(),
                snippet,
                " ".repeat(column.saturating_sub(1)),
            ),
            fragment: Some(fragment),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    TypeCoercion(#[from] CoercionError),

    #[error("Invalid negation of operator {0}")]
    InvalidNegation(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error(transparent)]
    Access(#[from] AccessError),
}

impl FilterError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        FilterError::BadRequest(message.into())
    }

    /// Whether the error was caused by the request rather than by internal misuse.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            FilterError::InvalidNegation(_) | FilterError::InvalidPath(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, FilterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors() {
        assert!(FilterError::bad_request("arity").is_client_error());
        assert!(FilterError::from(ParseError::new("bad")).is_client_error());
        assert!(!FilterError::InvalidNegation("IN".into()).is_client_error());
    }

    #[test]
    fn test_parse_error_display_is_message() {
        let err = ParseError::with_fragment("Unknown field badfield", "badfield");
        assert_eq!(err.to_string(), "Unknown field badfield");
        assert_eq!(err.fragment.as_deref(), Some("badfield"));
    }
}
