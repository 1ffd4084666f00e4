use thiserror::Error;

pub type Result<T> = std::result::Result<T, ModelError>;

#[derive(Debug, Clone, Error)]
pub enum ModelError {
    #[error("Invalid subject: {0}")]
    InvalidSubject(String),

    #[error("Invalid input: {0}")]
    Validation(String),
}
