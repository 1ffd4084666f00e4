use crate::error::ApiError;
use crate::handlers::check::validate_check;
use crate::handlers::with_deadline;
use crate::AppState;
use axum::{extract::State, Json};
use rebac_engine::{CheckRequest, Zookie};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchCheckRequest {
    pub checks: Vec<CheckRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zookie: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchCheckResult {
    pub index: usize,
    pub allowed: bool,
    pub debug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchTotals {
    pub allowed: usize,
    pub denied: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchCheckResponse {
    pub results: Vec<BatchCheckResult>,
    pub totals: BatchTotals,
    pub zookie: Zookie,
}

/// Decide many checks at once. Identical entries are deduplicated before
/// dispatch; the result vector is reassembled in input order. The shared
/// zookie applies to every check that does not carry its own.
pub async fn batch_check(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BatchCheckRequest>,
) -> Result<Json<BatchCheckResponse>, ApiError> {
    if let Some(zookie) = &request.zookie {
        Zookie::parse(zookie)?;
    }

    let effective: Vec<CheckRequest> = request
        .checks
        .into_iter()
        .map(|mut check| {
            if check.zookie.is_none() {
                check.zookie = request.zookie.clone();
            }
            check
        })
        .collect();

    // Dedupe on the canonical check key plus the effective zookie.
    let mut unique: Vec<CheckRequest> = Vec::new();
    let mut slot_of: Vec<usize> = Vec::with_capacity(effective.len());
    let mut slot_by_key: HashMap<(String, Option<String>), usize> = HashMap::new();
    for check in &effective {
        let canonical = validate_check(check)?;
        let key = (canonical.to_string(), check.zookie.clone());
        let slot = *slot_by_key.entry(key).or_insert_with(|| {
            unique.push(check.clone());
            unique.len() - 1
        });
        slot_of.push(slot);
    }

    let outcomes = with_deadline(state.config.request_timeout, async {
        let responses =
            futures::future::join_all(unique.iter().map(|check| state.checker.check(check))).await;
        responses
            .into_iter()
            .collect::<Result<Vec<_>, _>>()
            .map_err(ApiError::from)
    })
    .await?;

    let results: Vec<BatchCheckResult> = effective
        .iter()
        .enumerate()
        .map(|(index, check)| {
            let outcome = &outcomes[slot_of[index]];
            BatchCheckResult {
                index,
                allowed: outcome.allowed,
                debug: format!(
                    "{}:{}#{}@{}:{} => {}",
                    check.namespace,
                    check.object_id,
                    check.relation,
                    check.user_type,
                    check.user_id,
                    if outcome.allowed { "allowed" } else { "denied" }
                ),
            }
        })
        .collect();

    let allowed = results.iter().filter(|r| r.allowed).count();
    let totals = BatchTotals {
        allowed,
        denied: results.len() - allowed,
    };

    Ok(Json(BatchCheckResponse {
        results,
        totals,
        zookie: state.zookies.now(),
    }))
}
