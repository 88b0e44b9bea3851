//! Ban list lookup consumed before issuing a passcode.

use async_trait::async_trait;

use crate::errors::DomainError;

/// Repository trait for the phone ban list
#[async_trait]
pub trait BanRepository: Send + Sync {
    /// Check whether a normalized phone number is banned
    async fn is_banned(&self, phone: &str) -> Result<bool, DomainError>;
}
