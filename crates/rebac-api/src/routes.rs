use crate::handlers;
use crate::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health::health_check))
        // Authorization engine
        .route("/api/v1/check", post(handlers::check::check_permission))
        .route("/api/v1/write", post(handlers::write::write_tuples))
        .route("/api/v1/read", post(handlers::read::read_tuples))
        .route("/api/v1/batch_check", post(handlers::batch::batch_check))
        .with_state(state)
}
