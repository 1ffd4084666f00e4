use thiserror::Error;

pub type Result<T> = std::result::Result<T, CacheError>;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cache error: {0}")]
    Other(String),
}

impl CacheError {
    /// True when the cache backend is unreachable rather than rejecting the
    /// request; the API maps this to 503 instead of 500.
    pub fn is_unavailable(&self) -> bool {
        match self {
            CacheError::Redis(e) => {
                e.is_io_error() || e.is_timeout() || e.is_connection_refusal()
            }
            _ => false,
        }
    }
}
