//! MySQL implementation of the BanRepository trait.

use async_trait::async_trait;
use sqlx::{MySqlPool, Row};

use sf_core::errors::DomainError;
use sf_core::repositories::BanRepository;

/// Ban list stored in the `bans` table
pub struct MySqlBanRepository {
    pool: MySqlPool,
}

impl MySqlBanRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Add a phone number to the ban list; banning twice is a no-op
    pub async fn ban(&self, phone: &str) -> Result<(), DomainError> {
        sqlx::query("INSERT IGNORE INTO bans (phone) VALUES (?)")
            .bind(phone)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::Database(format!("Failed to ban phone: {}", e)))?;
        Ok(())
    }

    /// Remove a phone number from the ban list; returns whether it was banned
    pub async fn unban(&self, phone: &str) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM bans WHERE phone = ?")
            .bind(phone)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::Database(format!("Failed to unban phone: {}", e)))?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl BanRepository for MySqlBanRepository {
    async fn is_banned(&self, phone: &str) -> Result<bool, DomainError> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM bans WHERE phone = ?) AS banned")
            .bind(phone)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::Database(format!("Ban lookup failed: {}", e)))?;

        let banned: i64 = row
            .try_get("banned")
            .map_err(|e| DomainError::Database(format!("Failed to get banned: {}", e)))?;

        Ok(banned == 1)
    }
}
