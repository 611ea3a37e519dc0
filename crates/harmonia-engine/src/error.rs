use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("dataset '{0}' is not bound")]
    UnknownDataset(String),
    #[error("column '{column}' not found in dataset '{dataset}'")]
    UnknownColumn { dataset: String, column: String },
    #[error("column '{0}' exists on both sides of the join")]
    DuplicateColumn(String),
    #[error("no common identifier to join on")]
    NoJoinKeys,
    #[error("unsupported statement: {0}")]
    Unsupported(String),
    #[error("invalid expression '{expression}': {message}")]
    Expression { expression: String, message: String },
    #[error(transparent)]
    Polars(#[from] PolarsError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
