//! Shared utilities and common types for the Storefront server
//!
//! This crate provides common functionality used across all server modules:
//! - Configuration types loaded from the environment
//! - Error response structures
//! - Utility functions (phone validation and masking)
//! - Common response wrappers and language selection

pub mod config;
pub mod errors;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, AuthConfig, CacheConfig, CacheType, DatabaseConfig, Environment, JwtConfig,
    LoggingConfig, OtpConfig, ServerConfig, SmsConfig,
};
pub use errors::{error_codes, ErrorResponse};
pub use types::{ApiResponse, Language};
pub use utils::phone;
