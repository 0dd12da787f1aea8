pub mod compare;
pub mod operator;
pub mod resolve;
