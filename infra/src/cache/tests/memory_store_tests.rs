//! Unit tests for the in-memory primary store

use std::sync::Arc;
use std::time::Duration;

use sf_core::services::otp::{
    BackendStatus, FallbackStore, IssueOutcome, OtpManager, PrimaryStore, StoreClaim, StoreWrite,
};
use sf_core::{IdentityService, InMemoryBanRepository, InMemoryUserRepository, OtpError};
use sf_core::services::token::CredentialService;
use sf_shared::config::{JwtConfig, OtpConfig};

use crate::cache::InMemoryPrimaryStore;
use crate::sms::{MockSmsService, SmsOtpDelivery};

#[tokio::test]
async fn test_starts_available() {
    let store = InMemoryPrimaryStore::new();
    assert_eq!(store.backend_state().status(), BackendStatus::Available);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_set_get_ttl_delete() {
    let store = InMemoryPrimaryStore::new();

    assert_eq!(store.set_with_expiry("OTP:k", "hash", 300).await, StoreWrite::Stored);
    assert_eq!(store.get("OTP:k").await, Some("hash".to_string()));
    assert_eq!(store.ttl("OTP:k").await, 300);

    store.delete("OTP:k").await;
    store.delete("OTP:k").await;
    assert_eq!(store.get("OTP:k").await, None);
    assert_eq!(store.ttl("OTP:k").await, -2);
}

#[tokio::test]
async fn test_set_if_absent() {
    let store = InMemoryPrimaryStore::new();

    assert_eq!(store.set_if_absent_with_expiry("k", "a", 300).await, StoreClaim::Claimed);
    assert_eq!(store.set_if_absent_with_expiry("k", "b", 300).await, StoreClaim::Occupied);
    assert_eq!(store.get("k").await, Some("a".to_string()));
}

#[tokio::test]
async fn test_entries_expire() {
    let store = InMemoryPrimaryStore::new();
    store.set_with_expiry("k", "v", 1).await;

    tokio::time::sleep(Duration::from_millis(1100)).await;

    assert_eq!(store.get("k").await, None);
    assert_eq!(store.set_if_absent_with_expiry("k", "w", 1).await, StoreClaim::Claimed);
}

#[tokio::test]
async fn test_increment_keeps_first_expiry() {
    let store = InMemoryPrimaryStore::new();

    assert_eq!(store.increment_with_expiry("c", 300).await, Some(1));
    assert_eq!(store.increment_with_expiry("c", 5).await, Some(2));
    assert!(store.ttl("c").await > 5);
}

#[tokio::test]
async fn test_outage_answers_degraded() {
    let store = InMemoryPrimaryStore::new();
    store.set_with_expiry("k", "v", 300).await;

    store.set_outage(true);
    assert_eq!(store.backend_state().status(), BackendStatus::Degraded);
    assert_eq!(store.get("k").await, None);
    assert_eq!(store.set_with_expiry("k", "v", 300).await, StoreWrite::Failed);
    assert_eq!(store.set_if_absent_with_expiry("k", "v", 300).await, StoreClaim::Failed);
    assert_eq!(store.ttl("k").await, -1);
    assert_eq!(store.increment_with_expiry("c", 300).await, None);

    store.set_outage(false);
    assert!(store.backend_state().is_available());
    assert_eq!(store.get("k").await, Some("v".to_string()));
}

#[tokio::test]
async fn test_manager_survives_outage_with_mirroring() {
    let primary = Arc::new(InMemoryPrimaryStore::new());
    let sms = Arc::new(MockSmsService::new());
    let users = Arc::new(InMemoryUserRepository::new());
    let credentials = Arc::new(CredentialService::new(JwtConfig::new("test-secret")));
    let manager = OtpManager::new(
        primary.clone(),
        Arc::new(FallbackStore::new()),
        Arc::new(SmsOtpDelivery::new(sms.clone())),
        Arc::new(InMemoryBanRepository::new()),
        Arc::new(IdentityService::new(users, credentials)),
        OtpConfig::default().with_hash_cost(4).with_fixed_code("123456"),
    );

    let outcome = manager.issue("09120000000").await.unwrap();
    assert!(matches!(outcome, IssueOutcome::Issued { .. }));
    assert_eq!(sms.get_message_count(), 1);

    primary.set_outage(true);
    let err = manager.verify("09120000000", "000000").await.unwrap_err();
    assert_eq!(err.as_otp(), Some(&OtpError::Incorrect));

    let verified = manager.verify("09120000000", "123456").await.unwrap();
    assert!(verified.grant.created);
}
