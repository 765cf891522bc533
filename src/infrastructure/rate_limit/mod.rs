//! Quota counter store implementations.

pub mod memory_rate_limit;
pub mod redis_rate_limit;

pub use memory_rate_limit::MemoryRateLimitStore;
pub use redis_rate_limit::RedisRateLimitStore;
