use rebac_cache::CacheError;
use rebac_models::ModelError;
use rebac_store::StoreError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors the evaluator lets escape. Missing tuples, cycles and exhausted
/// depth are all expressed as deny, never as an error.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("Invalid input: {0}")]
    Validation(String),
}

impl From<ModelError> for EngineError {
    fn from(err: ModelError) -> Self {
        EngineError::Validation(err.to_string())
    }
}
