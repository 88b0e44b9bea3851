//! Primary OTP store adapters
//!
//! Both adapters implement `sf_core`'s `PrimaryStore` and write the shared
//! backend state the OTP manager reads.

pub mod memory_store;
pub mod redis_client;

#[cfg(test)]
mod tests;

pub use memory_store::InMemoryPrimaryStore;
pub use redis_client::RedisPrimaryStore;

// Re-export commonly used types
pub use sf_shared::config::{CacheConfig, CacheType};
