pub mod expr;
pub mod operator;
pub mod path;
pub mod predicate;
