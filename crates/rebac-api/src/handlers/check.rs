use crate::error::ApiError;
use crate::handlers::with_deadline;
use crate::AppState;
use axum::{extract::State, Json};
use rebac_engine::{CheckRequest, CheckResponse};
use rebac_models::{validate_tuple_key, Subject, TupleKey};
use std::sync::Arc;
use validator::Validate;

/// Full boundary validation of a check request: shape bounds, charset and
/// subject syntax. Runs before any store or cache dispatch.
pub(crate) fn validate_check(request: &CheckRequest) -> Result<TupleKey, ApiError> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;
    let subject = Subject::from_parts(&request.user_type, &request.user_id)
        .map_err(|e| ApiError::Validation(e.to_string()))?;
    let key = TupleKey::new(
        &request.namespace,
        &request.object_id,
        &request.relation,
        subject,
    );
    validate_tuple_key(&key).map_err(|e| ApiError::Validation(e.to_string()))?;
    Ok(key)
}

/// Decide whether a subject holds a relation on an object.
pub async fn check_permission(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CheckRequest>,
) -> Result<Json<CheckResponse>, ApiError> {
    validate_check(&request)?;

    let response = with_deadline(state.config.request_timeout, async {
        Ok(state.checker.check(&request).await?)
    })
    .await?;

    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::test_state;
    use rebac_store::TupleStore;

    fn request(namespace: &str, object_id: &str, relation: &str, user_id: &str) -> CheckRequest {
        CheckRequest {
            namespace: namespace.to_string(),
            object_id: object_id.to_string(),
            relation: relation.to_string(),
            user_id: user_id.to_string(),
            user_type: "user".to_string(),
            zookie: None,
        }
    }

    #[tokio::test]
    async fn check_allows_through_inheritance() {
        let state = test_state();
        state
            .store
            .insert(&TupleKey::new("document", "d1", "owner", Subject::user("alice")))
            .await
            .unwrap();

        let Json(response) = check_permission(
            State(state),
            Json(request("document", "d1", "viewer", "alice")),
        )
        .await
        .unwrap();

        assert!(response.allowed);
        assert!(!response.zookie.as_str().is_empty());
    }

    #[tokio::test]
    async fn empty_fields_are_rejected_before_dispatch() {
        let state = test_state();
        let result = check_permission(
            State(state),
            Json(request("", "d1", "viewer", "alice")),
        )
        .await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }

    #[tokio::test]
    async fn undecodable_zookie_is_rejected() {
        let state = test_state();
        let mut bad = request("document", "d1", "viewer", "alice");
        bad.zookie = Some("???".to_string());

        let result = check_permission(State(state), Json(bad)).await;
        assert!(matches!(
            result,
            Err(ApiError::Engine(rebac_engine::EngineError::Validation(_)))
        ));
    }

    #[tokio::test]
    async fn bad_namespace_charset_is_rejected() {
        let state = test_state();
        let result = check_permission(
            State(state),
            Json(request("docu ment", "d1", "viewer", "alice")),
        )
        .await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }
}
