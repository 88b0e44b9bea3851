//! Configuration module with business-specific sub-modules
//!
//! This module organizes configuration into logical business areas:
//! - `auth` - JWT credential configuration
//! - `cache` - Primary OTP store (Redis) configuration
//! - `database` - Database connection and pool configuration
//! - `environment` - Environment detection and logging configuration
//! - `otp` - One-time passcode lifecycle settings
//! - `rate_limit` - Per-client request limits
//! - `server` - HTTP server configuration
//! - `sms` - SMS gateway configuration

pub mod auth;
pub mod cache;
pub mod database;
pub mod environment;
pub mod otp;
pub mod rate_limit;
pub mod server;
pub mod sms;

use serde::{Deserialize, Serialize};
use std::str::FromStr;

// Re-export commonly used types
pub use auth::{AuthConfig, JwtConfig};
pub use cache::{CacheConfig, CacheType};
pub use database::DatabaseConfig;
pub use environment::{Environment, LogFormat, LoggingConfig};
pub use otp::OtpConfig;
pub use rate_limit::RateLimitConfig;
pub use server::ServerConfig;
pub use sms::SmsConfig;

/// Complete application configuration combining all sub-configurations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Environment configuration
    pub environment: Environment,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration; `None` keeps ban and user data in memory
    #[serde(default)]
    pub database: Option<DatabaseConfig>,

    /// Authentication configuration
    pub auth: AuthConfig,

    /// Primary store configuration
    pub cache: CacheConfig,

    /// OTP lifecycle configuration
    pub otp: OtpConfig,

    /// SMS gateway configuration
    pub sms: SmsConfig,

    /// Per-client request limits on the OTP routes
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let env = Environment::default();
        Self {
            environment: env,
            server: ServerConfig::default(),
            database: None,
            auth: AuthConfig::default(),
            cache: CacheConfig::default(),
            otp: OtpConfig::default(),
            sms: SmsConfig::default(),
            rate_limit: RateLimitConfig::default(),
            logging: LoggingConfig::for_environment(env),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment
    pub fn from_env() -> Self {
        let environment = Environment::from_env();
        let database = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .map(|_| DatabaseConfig::from_env());

        Self {
            environment,
            server: ServerConfig::from_env(),
            database,
            auth: AuthConfig::from_env(),
            cache: CacheConfig::from_env(),
            otp: OtpConfig::from_env(),
            sms: SmsConfig::from_env(),
            rate_limit: RateLimitConfig::from_env(),
            logging: LoggingConfig::for_environment(environment).with_env_override(),
        }
    }
}

/// Read and parse an environment variable, falling back to `default`
/// when it is unset or unparsable.
pub(crate) fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Read a boolean flag; accepts `true/false`, `1/0`, `yes/no`.
pub(crate) fn env_flag(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(value) => match value.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => true,
            "false" | "0" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert!(config.database.is_none());
        assert_eq!(config.otp.validity_duration_seconds, 300);
        assert_eq!(config.cache.cache_type, CacheType::Redis);
    }

    #[test]
    fn test_env_or_falls_back_on_garbage() {
        std::env::set_var("SF_TEST_ENV_OR_GARBAGE", "not-a-number");
        assert_eq!(env_or::<u64>("SF_TEST_ENV_OR_GARBAGE", 42), 42);
        std::env::set_var("SF_TEST_ENV_OR_GARBAGE", " 7 ");
        assert_eq!(env_or::<u64>("SF_TEST_ENV_OR_GARBAGE", 42), 7);
        std::env::remove_var("SF_TEST_ENV_OR_GARBAGE");
    }

    #[test]
    fn test_env_flag() {
        std::env::set_var("SF_TEST_ENV_FLAG", "no");
        assert!(!env_flag("SF_TEST_ENV_FLAG", true));
        std::env::set_var("SF_TEST_ENV_FLAG", "1");
        assert!(env_flag("SF_TEST_ENV_FLAG", false));
        std::env::set_var("SF_TEST_ENV_FLAG", "maybe");
        assert!(env_flag("SF_TEST_ENV_FLAG", true));
        std::env::remove_var("SF_TEST_ENV_FLAG");
    }
}
