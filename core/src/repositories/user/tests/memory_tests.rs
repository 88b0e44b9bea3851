//! Unit tests for the in-memory user repository

use crate::domain::entities::user::{Role, User};
use crate::errors::DomainError;
use crate::repositories::user::{InMemoryUserRepository, UserRepository};

#[tokio::test]
async fn test_create_and_find_by_phone() {
    let repo = InMemoryUserRepository::new();
    let user = User::new("09120000000".to_string(), Role::Admin);

    let created = repo.create(user.clone()).await.unwrap();
    assert_eq!(created.id, user.id);

    let found = repo.find_by_phone("09120000000").await.unwrap();
    assert_eq!(found.map(|u| u.id), Some(user.id));
    assert!(repo.find_by_phone("09121111111").await.unwrap().is_none());
}

#[tokio::test]
async fn test_find_by_id() {
    let repo = InMemoryUserRepository::new();
    let user = repo
        .create(User::new("09120000000".to_string(), Role::User))
        .await
        .unwrap();

    let found = repo.find_by_id(user.id).await.unwrap();
    assert_eq!(found.map(|u| u.phone), Some("09120000000".to_string()));
    assert!(repo.find_by_id(uuid::Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_duplicate_phone_is_rejected() {
    let repo = InMemoryUserRepository::new();
    repo.create(User::new("09120000000".to_string(), Role::Admin))
        .await
        .unwrap();

    let result = repo
        .create(User::new("09120000000".to_string(), Role::User))
        .await;

    assert!(matches!(result, Err(DomainError::Validation { .. })));
    assert_eq!(repo.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_count_tracks_created_users() {
    let repo = InMemoryUserRepository::new();
    assert_eq!(repo.count().await.unwrap(), 0);

    repo.create(User::new("09120000000".to_string(), Role::Admin))
        .await
        .unwrap();
    repo.create(User::new("09121111111".to_string(), Role::User))
        .await
        .unwrap();

    assert_eq!(repo.count().await.unwrap(), 2);
}
