//! In-memory implementation of BanRepository

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::errors::DomainError;

use super::trait_::BanRepository;

/// Process-local ban list
#[derive(Clone, Default)]
pub struct InMemoryBanRepository {
    banned: Arc<RwLock<HashSet<String>>>,
}

impl InMemoryBanRepository {
    /// Create an empty ban list
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ban list seeded with the given phone numbers
    pub fn with_banned<I, S>(phones: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            banned: Arc::new(RwLock::new(phones.into_iter().map(Into::into).collect())),
        }
    }

    /// Add a phone number to the ban list
    pub async fn ban(&self, phone: &str) {
        self.banned.write().await.insert(phone.to_string());
    }

    /// Remove a phone number from the ban list; returns whether it was banned
    pub async fn unban(&self, phone: &str) -> bool {
        self.banned.write().await.remove(phone)
    }
}

#[async_trait]
impl BanRepository for InMemoryBanRepository {
    async fn is_banned(&self, phone: &str) -> Result<bool, DomainError> {
        Ok(self.banned.read().await.contains(phone))
    }
}
