//! Hot-set cache implementations.

pub mod memory_cache;
pub mod null_cache;
pub mod redis_cache;
pub mod service;

pub use memory_cache::MemoryHotSetCache;
pub use null_cache::NullCache;
pub use redis_cache::RedisHotSetCache;
pub use service::{CacheError, CacheResult, HotSetCache};

#[cfg(test)]
pub use service::MockHotSetCache;
