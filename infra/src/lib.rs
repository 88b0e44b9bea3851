//! # Infrastructure Layer
//!
//! Concrete implementations of the seams `sf_core` defines for the OTP
//! lifecycle:
//! - **Cache**: the Redis primary store with its connection supervisor, and a
//!   process-local primary store for development
//! - **Database**: MySQL ban list and user repositories using SQLx
//! - **SMS**: delivery of issued codes through the Kavenegar gateway or a mock
//!
//! ## Features
//!
//! - `mysql`: Enable MySQL database support (default)
//! - `redis-cache`: Enable Redis primary store support (default)

use sf_core::errors::DomainError;

/// Cache module - primary OTP store adapters
pub mod cache;

/// Database module - MySQL implementations using SQLx
#[cfg(feature = "mysql")]
pub mod database;

/// SMS module - delivery of issued codes
pub mod sms;

pub use cache::{InMemoryPrimaryStore, RedisPrimaryStore};
pub use sms::{create_sms_service, SmsOtpDelivery, SmsService};

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Database connection error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Redis error
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// HTTP request error for external services
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// SMS gateway error
    #[error("SMS service error: {0}")]
    Sms(String),

    /// An external call did not answer in time
    #[error("Timed out: {0}")]
    Timeout(String),
}

impl From<InfrastructureError> for DomainError {
    fn from(err: InfrastructureError) -> Self {
        match err {
            InfrastructureError::Database(e) => DomainError::Database(e.to_string()),
            other => DomainError::Internal {
                message: other.to_string(),
            },
        }
    }
}
