use rebac_cache::{CacheConfig, DEFAULT_TTL_SECONDS};
use rebac_engine::CheckerConfig;
use rebac_store::StoreConfig;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub store: StoreConfig,
    pub cache: CacheConfig,
    pub checker: CheckerConfig,
    pub cache_ttl_seconds: u64,
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: "0.0.0.0".to_string(),
            server_port: 3000,
            store: StoreConfig::default(),
            cache: CacheConfig::default(),
            checker: CheckerConfig::default(),
            cache_ttl_seconds: DEFAULT_TTL_SECONDS,
            request_timeout: Duration::from_millis(2_000),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = CheckerConfig::default();
        Self {
            server_host: std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: std::env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            store: StoreConfig::from_env(),
            cache: CacheConfig::from_env(),
            checker: CheckerConfig {
                max_depth: std::env::var("CHECK_MAX_DEPTH")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.max_depth),
                fanout: std::env::var("CHECK_FANOUT")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.fanout),
            },
            cache_ttl_seconds: std::env::var("CACHE_TTL_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TTL_SECONDS),
            request_timeout: Duration::from_millis(
                std::env::var("REQUEST_TIMEOUT_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(2_000),
            ),
        }
    }
}
