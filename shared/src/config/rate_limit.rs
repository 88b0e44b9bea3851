//! Per-client request limits for the OTP endpoints

use serde::{Deserialize, Serialize};

use super::{env_flag, env_or};

/// Fixed-window limit applied per client IP
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Set to false to let every request through
    pub enabled: bool,

    /// Requests allowed per client within one window
    pub max_requests: u32,

    /// Window length in seconds
    pub window_seconds: u64,

    /// Key clients by `X-Forwarded-For` / `X-Real-IP` instead of the peer
    /// address; only safe behind a proxy that overwrites those headers
    #[serde(default)]
    pub trust_proxy: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 50,
            window_seconds: 15 * 60,
            trust_proxy: false,
        }
    }
}

impl RateLimitConfig {
    pub fn new(max_requests: u32, window_seconds: u64) -> Self {
        Self {
            enabled: true,
            max_requests,
            window_seconds: window_seconds.max(1),
            trust_proxy: false,
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: env_flag("RATE_LIMIT_ENABLED", defaults.enabled),
            max_requests: env_or("RATE_LIMIT_MAX_REQUESTS", defaults.max_requests),
            window_seconds: env_or("RATE_LIMIT_WINDOW_SECONDS", defaults.window_seconds).max(1),
            trust_proxy: env_flag("RATE_LIMIT_TRUST_PROXY", defaults.trust_proxy),
        }
    }
}
