use crate::AppState;
use axum::{extract::State, Json};
use rebac_store::TupleStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub store: String,
    pub cache: String,
}

fn up_or_down(up: bool) -> String {
    if up { "up" } else { "down" }.to_string()
}

/// Liveness probe over the engine's two backing dependencies. A cache
/// outage only degrades checks (they fall through to the store), so it
/// reports `degraded`; an unreachable tuple store reports `unhealthy`.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let store_up = state.store.ping().await.is_ok();
    let cache_up = state.decisions.ping().await.is_ok();

    let status = match (store_up, cache_up) {
        (true, true) => "healthy",
        (true, false) => "degraded",
        (false, _) => "unhealthy",
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store: up_or_down(store_up),
        cache: up_or_down(cache_up),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::handlers::testing::test_state;
    use async_trait::async_trait;
    use rebac_cache::{Cache, CacheError, DecisionCache, DEFAULT_TTL_SECONDS};
    use rebac_engine::{CheckerConfig, PermissionChecker, ZookieManager};
    use rebac_store::MemoryTupleStore;

    #[tokio::test]
    async fn reports_healthy_with_reachable_dependencies() {
        let Json(response) = health_check(State(test_state())).await;
        assert_eq!(response.status, "healthy");
        assert_eq!(response.store, "up");
        assert_eq!(response.cache, "up");
        assert!(!response.version.is_empty());
    }

    struct UnreachableCache;

    #[async_trait]
    impl Cache for UnreachableCache {
        async fn get(&self, _key: &str) -> rebac_cache::Result<Option<String>> {
            Err(CacheError::Other("down".to_string()))
        }
        async fn set(&self, _key: &str, _value: &str, _ttl: u64) -> rebac_cache::Result<()> {
            Err(CacheError::Other("down".to_string()))
        }
        async fn delete_pattern(&self, _pattern: &str) -> rebac_cache::Result<u64> {
            Err(CacheError::Other("down".to_string()))
        }
        async fn ping(&self) -> rebac_cache::Result<()> {
            Err(CacheError::Other("down".to_string()))
        }
    }

    #[tokio::test]
    async fn cache_outage_reports_degraded() {
        let store = Arc::new(MemoryTupleStore::new());
        let decisions = DecisionCache::new(Arc::new(UnreachableCache), DEFAULT_TTL_SECONDS);
        let zookies = Arc::new(ZookieManager::new());
        let checker = PermissionChecker::new(
            store.clone(),
            decisions.clone(),
            zookies.clone(),
            CheckerConfig::default(),
        );
        let state = Arc::new(crate::AppState {
            store,
            decisions,
            zookies,
            checker,
            config: Config::default(),
        });

        let Json(response) = health_check(State(state)).await;
        assert_eq!(response.status, "degraded");
        assert_eq!(response.store, "up");
        assert_eq!(response.cache, "down");
    }
}
