use crate::error::ApiError;
use crate::handlers::with_deadline;
use crate::AppState;
use axum::{extract::State, Json};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rebac_engine::Zookie;
use rebac_models::{validate_filter, RelationTuple, TupleFilter};
use rebac_store::TupleStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const DEFAULT_PAGE_SIZE: i64 = 100;
const MAX_PAGE_SIZE: i64 = 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadRequest {
    pub tuple_filter: TupleFilter,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zookie: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadResponse {
    pub tuples: Vec<RelationTuple>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
    pub zookie: Zookie,
}

fn encode_page_token(offset: i64) -> String {
    URL_SAFE_NO_PAD.encode(offset.to_string())
}

fn decode_page_token(token: &str) -> Result<i64, ApiError> {
    URL_SAFE_NO_PAD
        .decode(token)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .and_then(|text| text.parse::<i64>().ok())
        .filter(|offset| *offset >= 0)
        .ok_or_else(|| ApiError::Validation("undecodable page_token".to_string()))
}

/// Enumerate tuples matching a filter. The filter's most selective
/// populated prefix picks the index; reads always hit the store fresh, so
/// an input zookie only has to decode.
pub async fn read_tuples(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ReadRequest>,
) -> Result<Json<ReadResponse>, ApiError> {
    validate_filter(&request.tuple_filter).map_err(|e| ApiError::Validation(e.to_string()))?;
    if let Some(zookie) = &request.zookie {
        Zookie::parse(zookie)?;
    }

    let page_size = request
        .page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = match &request.page_token {
        Some(token) => decode_page_token(token)?,
        None => 0,
    };

    let response = with_deadline(state.config.request_timeout, async {
        // One extra row tells us whether another page exists.
        let mut tuples = state
            .store
            .query(&request.tuple_filter, page_size + 1, offset)
            .await?;

        let next_page_token = if tuples.len() as i64 > page_size {
            tuples.truncate(page_size as usize);
            Some(encode_page_token(offset + page_size))
        } else {
            None
        };

        Ok(ReadResponse {
            tuples,
            next_page_token,
            zookie: state.zookies.now(),
        })
    })
    .await?;

    Ok(Json(response))
}
