use crate::error::ApiError;
use crate::handlers::with_deadline;
use crate::AppState;
use axum::{extract::State, Json};
use rebac_engine::Zookie;
use rebac_models::{validate_tuple_key, TupleKey};
use rebac_store::TupleStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOperation {
    Insert,
    Delete,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteUpdate {
    pub operation: WriteOperation,
    pub tuple: TupleKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreconditionMode {
    MustExist,
    MustNotExist,
}

impl Default for PreconditionMode {
    fn default() -> Self {
        PreconditionMode::MustExist
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Precondition {
    pub tuple: TupleKey,
    #[serde(default)]
    pub mode: PreconditionMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteRequest {
    pub updates: Vec<WriteUpdate>,
    #[serde(default)]
    pub preconditions: Vec<Precondition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteResponse {
    pub zookie: Zookie,
}

/// Apply a batch of tuple mutations.
///
/// Updates apply in submitted order; a failure fails the batch but earlier
/// effects may persist (no cross-update rollback). Preconditions are
/// evaluated against pre-batch state before the first update. Cache
/// invalidation runs as a post-step and its failure fails the Write, since
/// a stale positive may not outlive a revoke. The zookie is stamped after
/// the last update succeeds.
pub async fn write_tuples(
    State(state): State<Arc<AppState>>,
    Json(request): Json<WriteRequest>,
) -> Result<Json<WriteResponse>, ApiError> {
    if request.updates.is_empty() {
        return Err(ApiError::Validation("updates must not be empty".to_string()));
    }
    for update in &request.updates {
        validate_tuple_key(&update.tuple).map_err(|e| ApiError::Validation(e.to_string()))?;
    }
    for precondition in &request.preconditions {
        validate_tuple_key(&precondition.tuple)
            .map_err(|e| ApiError::Validation(e.to_string()))?;
    }

    let response = with_deadline(state.config.request_timeout, async {
        for precondition in &request.preconditions {
            let tuple = &precondition.tuple;
            let exists = state
                .store
                .find_direct(&tuple.namespace, &tuple.object_id, &tuple.relation, &tuple.subject)
                .await?;
            let satisfied = match precondition.mode {
                PreconditionMode::MustExist => exists,
                PreconditionMode::MustNotExist => !exists,
            };
            if !satisfied {
                return Err(ApiError::Validation(format!(
                    "precondition failed for {}",
                    tuple
                )));
            }
        }

        for update in &request.updates {
            match update.operation {
                WriteOperation::Insert => state.store.insert(&update.tuple).await?,
                WriteOperation::Delete => state.store.delete(&update.tuple).await?,
            }
        }

        for update in &request.updates {
            state.decisions.invalidate_for(&update.tuple).await?;
        }

        Ok(WriteResponse {
            zookie: state.zookies.now(),
        })
    })
    .await?;

    Ok(Json(response))
}
