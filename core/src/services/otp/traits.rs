//! Seams between the OTP manager and its stores and collaborators

use async_trait::async_trait;

use crate::domain::entities::user::User;
use crate::domain::value_objects::IdentityGrant;
use crate::errors::DomainResult;

use super::backend_state::StorageBackendState;
use super::types::{StoreClaim, StoreWrite};

/// Primary expiring key-value store
///
/// No method surfaces a transport error. Failures come back as `None`,
/// `Failed` or `-1`, and the implementation marks the shared backend state
/// degraded.
#[async_trait]
pub trait PrimaryStore: Send + Sync {
    /// Read a value; absent on miss or transport failure
    async fn get(&self, key: &str) -> Option<String>;

    /// Write a value with a TTL, replacing any previous value
    async fn set_with_expiry(&self, key: &str, value: &str, ttl_seconds: u64) -> StoreWrite;

    /// Write a value with a TTL only when the key is absent
    async fn set_if_absent_with_expiry(
        &self,
        key: &str,
        value: &str,
        ttl_seconds: u64,
    ) -> StoreClaim;

    /// Remaining seconds, `-2` when the key is absent, or `-1` when the
    /// expiry is unknown or the store is unreachable
    async fn ttl(&self, key: &str) -> i64;

    /// Best-effort delete
    async fn delete(&self, key: &str);

    /// Increment a counter, setting its TTL on creation
    async fn increment_with_expiry(&self, key: &str, ttl_seconds: u64) -> Option<i64>;

    /// Reachability state this store writes
    fn backend_state(&self) -> &StorageBackendState;
}

/// Trait for SMS delivery of issued codes
#[async_trait]
pub trait OtpDelivery: Send + Sync {
    /// Send a code to a phone number; returns the provider message id
    async fn send_otp(&self, phone: &str, code: &str) -> Result<String, String>;
}

/// Resolves a verified phone number into an identity and credential
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Find the user for a phone number, creating it when absent
    async fn find_or_create_identity(&self, phone: &str) -> DomainResult<IdentityGrant>;

    /// Load the user a previously issued credential belongs to
    async fn authenticate(&self, token: &str) -> DomainResult<User>;
}
