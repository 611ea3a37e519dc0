use harmonia_model::ModelError;
use thiserror::Error;

/// Fatal pipeline errors. Recoverable problems are [`crate::Issue`]s instead.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("no metadata registered for mode '{0}'")]
    UnknownMode(String),
    #[error("binding '{0}' does not exist")]
    MissingBinding(String),
    #[error("metadata source failed for mode '{mode}': {message}")]
    MetadataSource { mode: String, message: String },
    #[error("execution engine failure: {0}")]
    Engine(String),
}

pub type Result<T> = std::result::Result<T, TransformError>;
