//! Unit tests for the OTP manager

use std::sync::Arc;
use std::time::Duration;

use sf_shared::config::{JwtConfig, OtpConfig};

use crate::domain::entities::user::Role;
use crate::errors::{DomainError, OtpError};
use crate::repositories::{InMemoryBanRepository, InMemoryUserRepository, UserRepository};
use crate::services::identity::IdentityService;
use crate::services::otp::{
    BackendStatus, DeliveryStatus, FallbackStore, IssueOutcome, OtpManager, StoredIn,
};
use crate::services::token::CredentialService;

use super::mocks::{MockDelivery, MockPrimaryStore};

const PHONE: &str = "09120000000";

type TestManager =
    OtpManager<MockPrimaryStore, MockDelivery, InMemoryBanRepository, IdentityService<InMemoryUserRepository>>;

struct Harness {
    manager: Arc<TestManager>,
    primary: Arc<MockPrimaryStore>,
    fallback: Arc<FallbackStore>,
    delivery: Arc<MockDelivery>,
    bans: Arc<InMemoryBanRepository>,
    users: Arc<InMemoryUserRepository>,
}

fn test_config() -> OtpConfig {
    OtpConfig::default().with_hash_cost(4)
}

fn harness_with(primary: MockPrimaryStore, delivery: MockDelivery, config: OtpConfig) -> Harness {
    let primary = Arc::new(primary);
    let fallback = Arc::new(FallbackStore::new());
    let delivery = Arc::new(delivery);
    let bans = Arc::new(InMemoryBanRepository::new());
    let users = Arc::new(InMemoryUserRepository::new());
    let credentials = Arc::new(CredentialService::new(JwtConfig::new("test-secret")));
    let identity = Arc::new(IdentityService::new(users.clone(), credentials));

    let manager = Arc::new(OtpManager::new(
        primary.clone(),
        fallback.clone(),
        delivery.clone(),
        bans.clone(),
        identity,
        config,
    ));

    Harness {
        manager,
        primary,
        fallback,
        delivery,
        bans,
        users,
    }
}

fn harness(config: OtpConfig) -> Harness {
    harness_with(MockPrimaryStore::available(), MockDelivery::new(false), config)
}

fn issued_code(outcome: &IssueOutcome) -> String {
    match outcome {
        IssueOutcome::Issued { code, .. } => code.clone(),
        other => panic!("Expected Issued, got {:?}", other),
    }
}

fn stored_in(outcome: &IssueOutcome) -> StoredIn {
    match outcome {
        IssueOutcome::Issued { stored_in, .. } => *stored_in,
        other => panic!("Expected Issued, got {:?}", other),
    }
}

fn pending_seconds(outcome: &IssueOutcome) -> u64 {
    match outcome {
        IssueOutcome::AlreadyPending { remaining_time } => {
            let (minutes, seconds) = remaining_time
                .split_once(": ")
                .expect("remaining time uses `MM: SS`");
            minutes.parse::<u64>().unwrap() * 60 + seconds.parse::<u64>().unwrap()
        }
        other => panic!("Expected AlreadyPending, got {:?}", other),
    }
}

fn otp_error(err: DomainError) -> OtpError {
    match err {
        DomainError::Otp(otp) => otp,
        other => panic!("Expected OTP error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_issue_then_verify_succeeds_exactly_once() {
    let h = harness(test_config());

    let outcome = h.manager.issue(PHONE).await.unwrap();
    let code = issued_code(&outcome);
    assert_eq!(h.delivery.last_code(PHONE), Some(code.clone()));

    let verified = h.manager.verify(PHONE, &code).await.unwrap();
    assert_eq!(verified.grant.user.phone, PHONE);
    assert!(!verified.grant.token.is_empty());

    let again = h.manager.verify(PHONE, &code).await.unwrap_err();
    assert_eq!(otp_error(again), OtpError::Expired);
}

#[tokio::test]
async fn test_primary_holds_hash_not_plaintext() {
    let h = harness(test_config());

    let code = issued_code(&h.manager.issue(PHONE).await.unwrap());

    let stored = h.primary.value("OTP:09120000000").expect("stored under OTP:<phone>");
    assert_ne!(stored, code);
    assert!(stored.starts_with("$2"));
}

#[tokio::test]
async fn test_second_issue_is_pending_with_decreasing_time() {
    let h = harness(test_config());

    let first = h.manager.issue(PHONE).await.unwrap();
    assert!(first.is_issued());

    let second = pending_seconds(&h.manager.issue(PHONE).await.unwrap());
    tokio::time::sleep(Duration::from_millis(1100)).await;
    let third = pending_seconds(&h.manager.issue(PHONE).await.unwrap());

    assert!(second <= 300);
    assert!(third < second);
    assert_eq!(h.delivery.sent_count(), 1);
}

#[tokio::test]
async fn test_rounded_down_ttl_reports_last_second() {
    let h = harness(test_config());
    h.manager.issue(PHONE).await.unwrap();

    h.primary.force_ttl(Some(0));
    let pending = h.manager.issue(PHONE).await.unwrap();

    assert_eq!(pending_seconds(&pending), 1);
}

#[tokio::test]
async fn test_key_expiring_between_reads_is_not_pending() {
    let h = harness(test_config());
    h.manager.issue(PHONE).await.unwrap();

    h.primary.force_ttl(Some(-2));
    let status = h.manager.status(PHONE).await.unwrap();
    assert!(status.expired);

    h.primary.force_ttl(Some(-1));
    let status = h.manager.status(PHONE).await.unwrap();
    assert_eq!(status.remaining_time, "05: 00");
}

#[tokio::test]
async fn test_wrong_code_keeps_record_live() {
    let h = harness(test_config().with_fixed_code("123456"));

    h.manager.issue(PHONE).await.unwrap();

    let err = h.manager.verify(PHONE, "000000").await.unwrap_err();
    assert_eq!(otp_error(err), OtpError::Incorrect);
    assert!(!h.manager.status(PHONE).await.unwrap().expired);

    assert!(h.manager.verify(PHONE, "123456").await.is_ok());
}

#[tokio::test]
async fn test_fixed_code_scenario() {
    let h = harness(test_config().with_fixed_code("123456"));

    let outcome = h.manager.issue(PHONE).await.unwrap();
    assert_eq!(issued_code(&outcome), "123456");
    let verified = h.manager.verify(PHONE, "123456").await.unwrap();
    assert!(verified.grant.created);

    h.manager.issue("09121111111").await.unwrap();
    let err = h.manager.verify("09121111111", "000000").await.unwrap_err();
    assert_eq!(otp_error(err), OtpError::Incorrect);
}

#[tokio::test]
async fn test_banned_phone_is_forbidden() {
    let h = harness(test_config());
    h.bans.ban(PHONE).await;

    let err = h.manager.issue(PHONE).await.unwrap_err();

    assert_eq!(otp_error(err), OtpError::Forbidden);
    assert_eq!(h.delivery.sent_count(), 0);
    assert!(!h.primary.contains("OTP:09120000000"));
}

#[tokio::test]
async fn test_verify_after_expiry_is_expired() {
    let h = harness(test_config().with_fixed_code("123456").with_validity_seconds(1));

    h.manager.issue(PHONE).await.unwrap();
    tokio::time::sleep(Duration::from_millis(1200)).await;

    let err = h.manager.verify(PHONE, "123456").await.unwrap_err();
    assert_eq!(otp_error(err), OtpError::Expired);
}

#[tokio::test]
async fn test_verify_without_issue_is_expired() {
    let h = harness(test_config());

    let err = h.manager.verify(PHONE, "123456").await.unwrap_err();
    assert_eq!(otp_error(err), OtpError::Expired);
}

#[tokio::test]
async fn test_invalid_phone_is_rejected() {
    let h = harness(test_config());

    let err = h.manager.issue("12345").await.unwrap_err();
    assert!(matches!(otp_error(err), OtpError::InvalidIdentity { .. }));

    let err = h.manager.verify("not-a-phone", "123456").await.unwrap_err();
    assert!(matches!(otp_error(err), OtpError::InvalidIdentity { .. }));
}

#[tokio::test]
async fn test_international_spelling_maps_to_same_identity() {
    let h = harness(test_config().with_fixed_code("123456"));

    h.manager.issue("+98 912 000 0000").await.unwrap();
    let pending = h.manager.issue(PHONE).await.unwrap();

    assert!(!pending.is_issued());
    assert!(h.manager.verify(PHONE, "123456").await.is_ok());
}

#[tokio::test]
async fn test_status_reports_live_and_expired() {
    let h = harness(test_config());

    let before = h.manager.status(PHONE).await.unwrap();
    assert!(before.expired);
    assert_eq!(before.remaining_time, "00: 00");

    h.manager.issue(PHONE).await.unwrap();

    let after = h.manager.status(PHONE).await.unwrap();
    assert!(!after.expired);
    assert!(after.remaining_time == "05: 00" || after.remaining_time == "04: 59");
}

#[tokio::test]
async fn test_random_codes_have_configured_length() {
    let mut config = test_config();
    config.code_length = 4;
    let h = harness(config);

    let code = issued_code(&h.manager.issue(PHONE).await.unwrap());

    assert_eq!(code.len(), 4);
    assert!(code.chars().all(|c| c.is_ascii_digit()));
}

#[tokio::test]
async fn test_degraded_issue_uses_fallback_only() {
    let h = harness_with(
        MockPrimaryStore::unreachable(),
        MockDelivery::new(false),
        test_config(),
    );
    assert_eq!(h.manager.backend_status(), BackendStatus::Degraded);

    let outcome = h.manager.issue(PHONE).await.unwrap();
    assert_eq!(stored_in(&outcome), StoredIn::Fallback);
    assert_eq!(h.primary.writes.load(std::sync::atomic::Ordering::SeqCst), 0);

    let pending = h.manager.issue(PHONE).await.unwrap();
    assert!(!pending.is_issued());

    let code = issued_code(&outcome);
    assert!(h.manager.verify(PHONE, &code).await.is_ok());
    assert!(h.fallback.get(PHONE).await.is_none());
}

#[tokio::test]
async fn test_mirrored_record_survives_degradation() {
    let h = harness(test_config());

    let outcome = h.manager.issue(PHONE).await.unwrap();
    assert_eq!(stored_in(&outcome), StoredIn::PrimaryAndFallback);

    h.primary.set_down(true);

    let code = issued_code(&outcome);
    assert!(h.manager.verify(PHONE, &code).await.is_ok());
}

#[tokio::test]
async fn test_unmirrored_record_is_lost_on_degradation() {
    let mut config = test_config();
    config.mirror_to_fallback = false;
    let h = harness(config);

    let outcome = h.manager.issue(PHONE).await.unwrap();
    assert_eq!(stored_in(&outcome), StoredIn::Primary);
    assert!(h.fallback.is_empty().await);

    h.primary.set_down(true);

    // Accepted gap: only the primary knew about the code
    let err = h.manager.verify(PHONE, &issued_code(&outcome)).await.unwrap_err();
    assert_eq!(otp_error(err), OtpError::Expired);
}

#[tokio::test]
async fn test_fallback_is_ignored_while_primary_available() {
    let h = harness(test_config());
    h.fallback.put(PHONE, "$2b$04$stale", 300).await;

    let outcome = h.manager.issue(PHONE).await.unwrap();

    assert!(outcome.is_issued());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_issue_while_degraded_issues_once() {
    let h = harness_with(
        MockPrimaryStore::unreachable(),
        MockDelivery::new(false),
        test_config(),
    );

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let manager = h.manager.clone();
            tokio::spawn(async move { manager.issue(PHONE).await })
        })
        .collect();

    let mut issued = 0;
    for handle in handles {
        if handle.await.unwrap().unwrap().is_issued() {
            issued += 1;
        }
    }

    assert_eq!(issued, 1);
    assert_eq!(h.delivery.sent_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_issue_while_available_issues_once() {
    let h = harness(test_config());

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let manager = h.manager.clone();
            tokio::spawn(async move { manager.issue(PHONE).await })
        })
        .collect();

    let mut issued = 0;
    for handle in handles {
        if handle.await.unwrap().unwrap().is_issued() {
            issued += 1;
        }
    }

    assert_eq!(issued, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_verify_succeeds_once() {
    let h = harness(test_config().with_fixed_code("123456"));
    h.manager.issue(PHONE).await.unwrap();

    let handles: Vec<_> = (0..5)
        .map(|_| {
            let manager = h.manager.clone();
            tokio::spawn(async move { manager.verify(PHONE, "123456").await })
        })
        .collect();

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(err) => assert_eq!(otp_error(err), OtpError::Expired),
        }
    }

    assert_eq!(successes, 1);
}

#[tokio::test]
async fn test_lockout_revokes_code_after_max_attempts() {
    let mut config = test_config().with_fixed_code("123456");
    config.max_verify_attempts = 3;
    let h = harness(config);
    h.manager.issue(PHONE).await.unwrap();

    for _ in 0..2 {
        let err = h.manager.verify(PHONE, "000000").await.unwrap_err();
        assert_eq!(otp_error(err), OtpError::Incorrect);
    }
    let err = h.manager.verify(PHONE, "000000").await.unwrap_err();
    assert_eq!(otp_error(err), OtpError::TooManyAttempts);

    let err = h.manager.verify(PHONE, "123456").await.unwrap_err();
    assert_eq!(otp_error(err), OtpError::Expired);
    assert!(!h.primary.contains("OTP_ATTEMPTS:09120000000"));
}

#[tokio::test]
async fn test_lockout_counts_on_fallback_while_degraded() {
    let mut config = test_config().with_fixed_code("123456");
    config.max_verify_attempts = 2;
    let h = harness_with(MockPrimaryStore::unreachable(), MockDelivery::new(false), config);
    h.manager.issue(PHONE).await.unwrap();

    let err = h.manager.verify(PHONE, "000000").await.unwrap_err();
    assert_eq!(otp_error(err), OtpError::Incorrect);
    let err = h.manager.verify(PHONE, "000000").await.unwrap_err();
    assert_eq!(otp_error(err), OtpError::TooManyAttempts);

    assert!(h.fallback.get(PHONE).await.is_none());
}

#[tokio::test]
async fn test_disabled_lockout_allows_unbounded_retries() {
    let mut config = test_config().with_fixed_code("123456");
    config.max_verify_attempts = 0;
    let h = harness(config);
    h.manager.issue(PHONE).await.unwrap();

    for _ in 0..8 {
        let err = h.manager.verify(PHONE, "000000").await.unwrap_err();
        assert_eq!(otp_error(err), OtpError::Incorrect);
    }

    assert!(h.manager.verify(PHONE, "123456").await.is_ok());
}

#[tokio::test]
async fn test_reissue_after_consumption_resets_attempts() {
    let mut config = test_config().with_fixed_code("123456");
    config.max_verify_attempts = 2;
    let h = harness(config);

    h.manager.issue(PHONE).await.unwrap();
    h.manager.verify(PHONE, "000000").await.unwrap_err();
    h.manager.verify(PHONE, "123456").await.unwrap();

    h.manager.issue(PHONE).await.unwrap();
    let err = h.manager.verify(PHONE, "000000").await.unwrap_err();
    assert_eq!(otp_error(err), OtpError::Incorrect);
}

#[tokio::test]
async fn test_delivery_failure_keeps_record() {
    let h = harness_with(
        MockPrimaryStore::available(),
        MockDelivery::new(true),
        test_config().with_fixed_code("123456"),
    );

    let outcome = h.manager.issue(PHONE).await.unwrap();
    match &outcome {
        IssueOutcome::Issued { delivery, .. } => {
            assert!(matches!(delivery, DeliveryStatus::Failed { .. }));
        }
        other => panic!("Expected Issued, got {:?}", other),
    }

    assert!(h.manager.verify(PHONE, "123456").await.is_ok());
}

#[tokio::test]
async fn test_first_verified_user_is_admin() {
    let h = harness(test_config().with_fixed_code("123456"));

    h.manager.issue(PHONE).await.unwrap();
    let first = h.manager.verify(PHONE, "123456").await.unwrap();

    h.manager.issue("09121111111").await.unwrap();
    let second = h.manager.verify("09121111111", "123456").await.unwrap();

    assert_eq!(first.grant.user.roles, vec![Role::Admin]);
    assert_eq!(second.grant.user.roles, vec![Role::User]);
    assert_eq!(h.users.count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_returning_user_is_not_recreated() {
    let h = harness(test_config().with_fixed_code("123456"));

    h.manager.issue(PHONE).await.unwrap();
    let first = h.manager.verify(PHONE, "123456").await.unwrap();
    h.manager.issue(PHONE).await.unwrap();
    let second = h.manager.verify(PHONE, "123456").await.unwrap();

    assert!(first.grant.created);
    assert!(!second.grant.created);
    assert_eq!(first.grant.user.id, second.grant.user.id);
}
