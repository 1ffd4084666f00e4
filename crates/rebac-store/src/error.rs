use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Filter does not cover an indexed prefix: {0}")]
    UnindexedFilter(String),

    #[error("Corrupt tuple row: {0}")]
    Corrupt(String),

    #[error("Storage error: {0}")]
    Other(String),
}

impl StoreError {
    /// True when the backend itself is unreachable rather than rejecting the
    /// request; the API maps this to 503 instead of 500.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            StoreError::Database(
                sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
            )
        )
    }
}
