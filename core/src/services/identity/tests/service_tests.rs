//! Unit tests for identity resolution

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use sf_shared::config::JwtConfig;

use crate::domain::entities::user::{Role, User};
use crate::errors::{CredentialError, DomainError};
use crate::repositories::{InMemoryUserRepository, UserRepository};
use crate::services::identity::IdentityService;
use crate::services::otp::IdentityResolver;
use crate::services::token::CredentialService;

fn setup() -> (
    Arc<InMemoryUserRepository>,
    Arc<CredentialService>,
    IdentityService<InMemoryUserRepository>,
) {
    let users = Arc::new(InMemoryUserRepository::new());
    let credentials = Arc::new(CredentialService::new(JwtConfig::new("test-secret")));
    let service = IdentityService::new(users.clone(), credentials.clone());
    (users, credentials, service)
}

#[tokio::test]
async fn test_first_user_is_admin() {
    let (_, _, service) = setup();

    let grant = service.find_or_create_identity("09120000000").await.unwrap();

    assert!(grant.created);
    assert_eq!(grant.user.roles, vec![Role::Admin]);
    assert_eq!(grant.user.username, "09120000000");
}

#[tokio::test]
async fn test_later_users_get_user_role() {
    let (_, _, service) = setup();

    service.find_or_create_identity("09120000000").await.unwrap();
    let grant = service.find_or_create_identity("09121111111").await.unwrap();

    assert!(grant.created);
    assert_eq!(grant.user.roles, vec![Role::User]);
}

#[tokio::test]
async fn test_existing_user_is_returned_not_recreated() {
    let (users, _, service) = setup();

    let first = service.find_or_create_identity("09120000000").await.unwrap();
    let second = service.find_or_create_identity("09120000000").await.unwrap();

    assert!(!second.created);
    assert_eq!(first.user.id, second.user.id);
    assert_eq!(users.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_grant_token_identifies_user() {
    let (_, credentials, service) = setup();

    let grant = service.find_or_create_identity("09120000000").await.unwrap();
    let claims = credentials.decode(&grant.token).unwrap();

    assert_eq!(claims.user_id, grant.user.id.to_string());
    assert_eq!(claims.roles, vec!["ADMIN".to_string()]);
}

#[tokio::test]
async fn test_authenticate_loads_credential_owner() {
    let (_, _, service) = setup();

    let grant = service.find_or_create_identity("09120000000").await.unwrap();
    let user = service.authenticate(&grant.token).await.unwrap();

    assert_eq!(user.id, grant.user.id);
    assert_eq!(user.phone, "09120000000");
}

#[tokio::test]
async fn test_authenticate_rejects_foreign_credential() {
    let (_, _, service) = setup();
    let user = User::new("09120000000".to_string(), Role::User);
    let foreign = CredentialService::new(JwtConfig::new("another-secret"))
        .issue(&user)
        .unwrap();

    let result = service.authenticate(&foreign).await;

    assert!(matches!(
        result,
        Err(DomainError::Credential(CredentialError::Invalid))
    ));
}

#[tokio::test]
async fn test_authenticate_reports_missing_user() {
    let (_, credentials, service) = setup();
    let unknown = User::new("09120000000".to_string(), Role::User);
    let token = credentials.issue(&unknown).unwrap();

    let result = service.authenticate(&token).await;

    assert!(matches!(result, Err(DomainError::NotFound { .. })));
}

#[tokio::test]
async fn test_concurrent_registration_yields_one_user() {
    let (users, _, service) = setup();
    let service = Arc::new(service);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move { service.find_or_create_identity("09120000000").await })
        })
        .collect();

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().unwrap().user.id);
    }

    ids.dedup();
    assert_eq!(ids.len(), 1);
    assert_eq!(users.count().await.unwrap(), 1);
}

// User store whose count takes a database round trip
struct SlowCountRepository {
    inner: InMemoryUserRepository,
}

#[async_trait]
impl UserRepository for SlowCountRepository {
    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, DomainError> {
        self.inner.find_by_phone(phone).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        self.inner.find_by_id(id).await
    }

    async fn create(&self, user: User) -> Result<User, DomainError> {
        self.inner.create(user).await
    }

    async fn count(&self) -> Result<u64, DomainError> {
        let total = self.inner.count().await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        total
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_first_users_grant_one_admin() {
    let users = Arc::new(SlowCountRepository {
        inner: InMemoryUserRepository::new(),
    });
    let credentials = Arc::new(CredentialService::new(JwtConfig::new("test-secret")));
    let service = Arc::new(IdentityService::new(users.clone(), credentials));

    let first = {
        let service = service.clone();
        tokio::spawn(async move { service.find_or_create_identity("09120000001").await })
    };
    let second = {
        let service = service.clone();
        tokio::spawn(async move { service.find_or_create_identity("09120000002").await })
    };

    let first = first.await.unwrap().unwrap();
    let second = second.await.unwrap().unwrap();

    let admins = [&first, &second]
        .iter()
        .filter(|grant| grant.user.roles.contains(&Role::Admin))
        .count();
    assert_eq!(admins, 1);
    assert_eq!(users.count().await.unwrap(), 2);
}
