pub mod decision;
pub mod error;
pub mod memory;
pub mod redis_cache;

pub use decision::{CachedDecision, DecisionCache, DEFAULT_TTL_SECONDS};
pub use error::{CacheError, Result};
pub use memory::MemoryCache;
pub use redis_cache::{Cache, CacheConfig, RedisCache};
