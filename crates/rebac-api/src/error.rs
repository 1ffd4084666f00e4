use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rebac_cache::CacheError;
use rebac_engine::EngineError;
use rebac_store::StoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Request deadline exceeded")]
    Timeout,

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Engine(EngineError::Store(err))
    }
}

impl From<CacheError> for ApiError {
    fn from(err: CacheError) -> Self {
        ApiError::Engine(EngineError::Cache(err))
    }
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            ApiError::Timeout => (StatusCode::REQUEST_TIMEOUT, "timeout"),
            ApiError::Engine(EngineError::Validation(_)) => {
                (StatusCode::BAD_REQUEST, "validation_error")
            }
            // A filter outside the indexed prefixes is a caller mistake, not
            // a backend fault.
            ApiError::Engine(EngineError::Store(StoreError::UnindexedFilter(_))) => {
                (StatusCode::BAD_REQUEST, "validation_error")
            }
            ApiError::Engine(EngineError::Store(e)) if e.is_unavailable() => {
                (StatusCode::SERVICE_UNAVAILABLE, "storage_unavailable")
            }
            ApiError::Engine(EngineError::Store(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "storage_error")
            }
            ApiError::Engine(EngineError::Cache(e)) if e.is_unavailable() => {
                (StatusCode::SERVICE_UNAVAILABLE, "cache_unavailable")
            }
            ApiError::Engine(EngineError::Cache(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "cache_error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        (status, Json(ErrorResponse::new(code, &self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_400() {
        let (status, code) = ApiError::Validation("empty namespace".to_string()).status_and_code();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(code, "validation_error");
    }

    #[test]
    fn timeout_maps_to_408() {
        let (status, _) = ApiError::Timeout.status_and_code();
        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    }

    #[test]
    fn unindexed_filter_maps_to_400() {
        let err = ApiError::from(StoreError::UnindexedFilter("no prefix".to_string()));
        let (status, _) = err.status_and_code();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn storage_rejection_maps_to_500() {
        let err = ApiError::from(StoreError::Other("boom".to_string()));
        let (status, code) = err.status_and_code();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, "storage_error");
    }

    #[test]
    fn pool_exhaustion_maps_to_503() {
        let err = ApiError::from(StoreError::Database(sqlx::Error::PoolTimedOut));
        let (status, code) = err.status_and_code();
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(code, "storage_unavailable");
    }
}
