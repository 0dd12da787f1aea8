use filter_syntax::FilterError;
use model::core::coerce::CoercionError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to read input file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to deserialize JSON input: {0}")]
    JsonDeserialize(#[from] serde_json::Error),

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(serde_json::Error),

    #[error("{0}")]
    Filter(#[from] FilterError),

    #[error("Invalid record: {0}")]
    Record(#[from] CoercionError),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
}
