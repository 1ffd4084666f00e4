// ReBAC API Server
// Main entry point for the relationship-based authorization engine

mod config;
mod error;
mod handlers;
mod routes;

use config::Config;
use dotenvy::dotenv;
use rebac_cache::{DecisionCache, RedisCache};
use rebac_engine::{PermissionChecker, ZookieManager};
use rebac_store::{PostgresTupleStore, TupleStore};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub struct AppState {
    pub store: Arc<dyn TupleStore>,
    pub decisions: DecisionCache,
    pub zookies: Arc<ZookieManager>,
    pub checker: PermissionChecker,
    pub config: Config,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,rebac_api=debug,tower_http=debug".to_string()),
        )
        .init();

    tracing::info!("🚀 Starting ReBAC API Server");
    tracing::info!("📦 Version: {}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Config::from_env();
    tracing::info!("🔌 Server: {}:{}", config.server_host, config.server_port);

    // Initialize tuple store
    tracing::info!("🗄️  Connecting to tuple store...");
    let store = PostgresTupleStore::connect(config.store.clone())
        .await
        .expect("Failed to connect to tuple store");
    store.ensure_schema().await.expect("Failed to create tuple store schema");
    let store: Arc<dyn TupleStore> = Arc::new(store);
    tracing::info!(
        "✅ Tuple store ready (pool ceiling {})",
        config.store.max_connections
    );

    // Initialize decision cache
    tracing::info!("⚡ Connecting to Redis...");
    let redis = RedisCache::new(config.cache.clone())
        .await
        .expect("Failed to connect to Redis");
    let decisions = DecisionCache::new(Arc::new(redis), config.cache_ttl_seconds);
    decisions.ping().await.expect("Redis ping failed");
    tracing::info!("✅ Decision cache ready (TTL {}s)", config.cache_ttl_seconds);

    // Zookie manager
    let zookies = Arc::new(ZookieManager::new());

    // Permission checker
    let checker = PermissionChecker::new(
        store.clone(),
        decisions.clone(),
        zookies.clone(),
        config.checker.clone(),
    );
    tracing::info!(
        "🛡️  Permission checker ready (depth bound {}, fanout {})",
        config.checker.max_depth,
        config.checker.fanout
    );

    // Create app state
    let state = Arc::new(AppState {
        store,
        decisions,
        zookies,
        checker,
        config: config.clone(),
    });

    // Create router
    let app = routes::create_router(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    tracing::info!("📡 Routes configured:");
    tracing::info!("   GET  /health");
    tracing::info!("   POST /api/v1/check");
    tracing::info!("   POST /api/v1/write");
    tracing::info!("   POST /api/v1/read");
    tracing::info!("   POST /api/v1/batch_check");

    // Start server
    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("✅ Server ready at http://{}", addr);

    axum::serve(listener, app).await.expect("Server error");

    Ok(())
}
