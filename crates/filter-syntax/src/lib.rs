pub mod ast;
pub mod dialect;
pub mod error;
pub mod parser;
pub mod settings;

pub use ast::{
    expr::FilterExpression,
    operator::Operator,
    path::{Path, PathSegment},
    predicate::{FilterParameter, FilterPredicate},
};
pub use dialect::{FilterDialect, QueryParams, chain::DialectChain};
pub use error::{FilterError, ParseError, Result};
pub use settings::FilterSettings;
