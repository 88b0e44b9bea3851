//! Cache configuration module

use serde::{Deserialize, Serialize};

use super::env_or;

/// Primary store backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheType {
    /// External Redis server
    Redis,
    /// Process-local store (development and tests)
    Memory,
}

impl std::str::FromStr for CacheType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "redis" => Ok(CacheType::Redis),
            "memory" | "in-memory" => Ok(CacheType::Memory),
            _ => Err(format!("Invalid cache type: {}", s)),
        }
    }
}

/// Redis cache configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Backend used as the primary OTP store
    #[serde(default = "default_cache_type")]
    pub cache_type: CacheType,

    /// Redis connection URL
    pub url: String,

    /// Connection timeout in seconds
    pub connection_timeout: u64,

    /// Response timeout in seconds
    pub response_timeout: u64,

    /// Connection attempts before giving up until the next health check
    #[serde(default = "default_max_connect_attempts")]
    pub max_connect_attempts: u32,

    /// Backoff step between connection attempts in milliseconds
    #[serde(default = "default_retry_base_delay")]
    pub retry_base_delay_ms: u64,

    /// Upper bound on the backoff delay in milliseconds
    #[serde(default = "default_retry_max_delay")]
    pub retry_max_delay_ms: u64,

    /// Seconds between health checks
    #[serde(default = "default_health_check_interval")]
    pub health_check_interval_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_type: default_cache_type(),
            url: String::from("redis://localhost:6379"),
            connection_timeout: 5,
            response_timeout: 5,
            max_connect_attempts: default_max_connect_attempts(),
            retry_base_delay_ms: default_retry_base_delay(),
            retry_max_delay_ms: default_retry_max_delay(),
            health_check_interval_seconds: default_health_check_interval(),
        }
    }
}

impl CacheConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let url = std::env::var("REDIS_URL")
            .unwrap_or_else(|_| "redis://localhost:6379".to_string());

        Self {
            cache_type: env_or("CACHE_TYPE", default_cache_type()),
            url,
            connection_timeout: env_or("REDIS_CONNECTION_TIMEOUT", 5),
            response_timeout: env_or("REDIS_RESPONSE_TIMEOUT", 5),
            max_connect_attempts: env_or("REDIS_MAX_CONNECT_ATTEMPTS", default_max_connect_attempts()),
            retry_base_delay_ms: env_or("REDIS_RETRY_BASE_DELAY_MS", default_retry_base_delay()),
            retry_max_delay_ms: env_or("REDIS_RETRY_MAX_DELAY_MS", default_retry_max_delay()),
            health_check_interval_seconds: env_or(
                "REDIS_HEALTH_CHECK_INTERVAL",
                default_health_check_interval(),
            ),
        }
    }

    /// Create a new cache configuration with URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Backoff delay after the given (1-based) failed connection attempt
    ///
    /// Doubles from `retry_base_delay_ms` and is capped at `retry_max_delay_ms`.
    pub fn backoff_delay_ms(&self, attempt: u32) -> u64 {
        let exponent = attempt.saturating_sub(1).min(20);
        self.retry_base_delay_ms
            .saturating_mul(1u64 << exponent)
            .min(self.retry_max_delay_ms)
    }
}

fn default_cache_type() -> CacheType {
    CacheType::Redis
}

fn default_max_connect_attempts() -> u32 {
    5
}

fn default_retry_base_delay() -> u64 {
    50
}

fn default_retry_max_delay() -> u64 {
    2000
}

fn default_health_check_interval() -> u64 {
    30
}
