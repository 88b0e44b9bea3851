//! Runtime-selected store and repository backends
//!
//! The OTP manager is generic over its collaborators. The server picks Redis
//! or the in-process store, and MySQL or in-memory repositories, from the
//! environment; these enums give that choice a single concrete type.

use async_trait::async_trait;
use uuid::Uuid;

use sf_core::errors::DomainError;
use sf_core::repositories::{
    BanRepository, InMemoryBanRepository, InMemoryUserRepository, UserRepository,
};
use sf_core::services::otp::{PrimaryStore, StorageBackendState, StoreClaim, StoreWrite};
use sf_core::User;
use sf_infra::database::{MySqlBanRepository, MySqlUserRepository};
use sf_infra::{InMemoryPrimaryStore, RedisPrimaryStore};

/// Primary OTP store chosen by `CACHE_TYPE`
pub enum PrimaryBackend {
    Redis(RedisPrimaryStore),
    Memory(InMemoryPrimaryStore),
}

impl PrimaryBackend {
    pub fn kind(&self) -> &'static str {
        match self {
            PrimaryBackend::Redis(_) => "redis",
            PrimaryBackend::Memory(_) => "memory",
        }
    }
}

#[async_trait]
impl PrimaryStore for PrimaryBackend {
    async fn get(&self, key: &str) -> Option<String> {
        match self {
            PrimaryBackend::Redis(store) => store.get(key).await,
            PrimaryBackend::Memory(store) => store.get(key).await,
        }
    }

    async fn set_with_expiry(&self, key: &str, value: &str, ttl_seconds: u64) -> StoreWrite {
        match self {
            PrimaryBackend::Redis(store) => store.set_with_expiry(key, value, ttl_seconds).await,
            PrimaryBackend::Memory(store) => store.set_with_expiry(key, value, ttl_seconds).await,
        }
    }

    async fn set_if_absent_with_expiry(
        &self,
        key: &str,
        value: &str,
        ttl_seconds: u64,
    ) -> StoreClaim {
        match self {
            PrimaryBackend::Redis(store) => {
                store.set_if_absent_with_expiry(key, value, ttl_seconds).await
            }
            PrimaryBackend::Memory(store) => {
                store.set_if_absent_with_expiry(key, value, ttl_seconds).await
            }
        }
    }

    async fn ttl(&self, key: &str) -> i64 {
        match self {
            PrimaryBackend::Redis(store) => store.ttl(key).await,
            PrimaryBackend::Memory(store) => store.ttl(key).await,
        }
    }

    async fn delete(&self, key: &str) {
        match self {
            PrimaryBackend::Redis(store) => store.delete(key).await,
            PrimaryBackend::Memory(store) => store.delete(key).await,
        }
    }

    async fn increment_with_expiry(&self, key: &str, ttl_seconds: u64) -> Option<i64> {
        match self {
            PrimaryBackend::Redis(store) => store.increment_with_expiry(key, ttl_seconds).await,
            PrimaryBackend::Memory(store) => store.increment_with_expiry(key, ttl_seconds).await,
        }
    }

    fn backend_state(&self) -> &StorageBackendState {
        match self {
            PrimaryBackend::Redis(store) => store.backend_state(),
            PrimaryBackend::Memory(store) => store.backend_state(),
        }
    }
}

/// Ban list, MySQL when `DATABASE_URL` is set
pub enum BanBackend {
    MySql(MySqlBanRepository),
    Memory(InMemoryBanRepository),
}

#[async_trait]
impl BanRepository for BanBackend {
    async fn is_banned(&self, phone: &str) -> Result<bool, DomainError> {
        match self {
            BanBackend::MySql(repo) => repo.is_banned(phone).await,
            BanBackend::Memory(repo) => repo.is_banned(phone).await,
        }
    }
}

/// User store, MySQL when `DATABASE_URL` is set
pub enum UserBackend {
    MySql(MySqlUserRepository),
    Memory(InMemoryUserRepository),
}

#[async_trait]
impl UserRepository for UserBackend {
    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, DomainError> {
        match self {
            UserBackend::MySql(repo) => repo.find_by_phone(phone).await,
            UserBackend::Memory(repo) => repo.find_by_phone(phone).await,
        }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        match self {
            UserBackend::MySql(repo) => repo.find_by_id(id).await,
            UserBackend::Memory(repo) => repo.find_by_id(id).await,
        }
    }

    async fn create(&self, user: User) -> Result<User, DomainError> {
        match self {
            UserBackend::MySql(repo) => repo.create(user).await,
            UserBackend::Memory(repo) => repo.create(user).await,
        }
    }

    async fn count(&self) -> Result<u64, DomainError> {
        match self {
            UserBackend::MySql(repo) => repo.count().await,
            UserBackend::Memory(repo) => repo.count().await,
        }
    }
}
