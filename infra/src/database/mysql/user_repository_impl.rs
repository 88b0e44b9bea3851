//! MySQL implementation of the UserRepository trait.
//!
//! Roles are stored as a comma-separated list in the `roles` column.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row};
use uuid::Uuid;

use sf_core::domain::entities::user::{Role, User};
use sf_core::errors::DomainError;
use sf_core::repositories::UserRepository;

/// Users stored in the `users` table
pub struct MySqlUserRepository {
    /// Database connection pool
    pool: MySqlPool,
}

impl MySqlUserRepository {
    /// Create a new MySQL user repository
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Convert database row to User entity
    fn row_to_user(row: &sqlx::mysql::MySqlRow) -> Result<User, DomainError> {
        let id: String = row
            .try_get("id")
            .map_err(|e| DomainError::Database(format!("Failed to get id: {}", e)))?;
        let roles: String = row
            .try_get("roles")
            .map_err(|e| DomainError::Database(format!("Failed to get roles: {}", e)))?;

        Ok(User {
            id: Uuid::parse_str(&id)
                .map_err(|e| DomainError::Database(format!("Invalid UUID: {}", e)))?,
            phone: row
                .try_get("phone")
                .map_err(|e| DomainError::Database(format!("Failed to get phone: {}", e)))?,
            username: row
                .try_get("username")
                .map_err(|e| DomainError::Database(format!("Failed to get username: {}", e)))?,
            roles: decode_roles(&roles)?,
            created_at: row
                .try_get::<DateTime<Utc>, _>("created_at")
                .map_err(|e| DomainError::Database(format!("Failed to get created_at: {}", e)))?,
            updated_at: row
                .try_get::<DateTime<Utc>, _>("updated_at")
                .map_err(|e| DomainError::Database(format!("Failed to get updated_at: {}", e)))?,
        })
    }
}

/// Join roles into the stored column value
pub fn encode_roles(roles: &[Role]) -> String {
    roles
        .iter()
        .map(Role::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

/// Parse the stored column value
pub fn decode_roles(value: &str) -> Result<Vec<Role>, DomainError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|role| !role.is_empty())
        .map(|role| role.parse::<Role>().map_err(DomainError::Database))
        .collect()
}

#[async_trait]
impl UserRepository for MySqlUserRepository {
    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, DomainError> {
        let query = r#"
            SELECT id, phone, username, roles, created_at, updated_at
            FROM users
            WHERE phone = ?
            LIMIT 1
        "#;

        let result = sqlx::query(query)
            .bind(phone)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::Database(format!("Database query failed: {}", e)))?;

        match result {
            Some(row) => Ok(Some(Self::row_to_user(&row)?)),
            None => Ok(None),
        }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        let query = r#"
            SELECT id, phone, username, roles, created_at, updated_at
            FROM users
            WHERE id = ?
            LIMIT 1
        "#;

        let result = sqlx::query(query)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::Database(format!("Database query failed: {}", e)))?;

        result.map(|row| Self::row_to_user(&row)).transpose()
    }

    async fn create(&self, user: User) -> Result<User, DomainError> {
        let query = r#"
            INSERT INTO users (id, phone, username, roles, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
        "#;

        sqlx::query(query)
            .bind(user.id.to_string())
            .bind(&user.phone)
            .bind(&user.username)
            .bind(encode_roles(&user.roles))
            .bind(user.created_at)
            .bind(user.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => DomainError::Validation {
                    message: "Phone number already registered".to_string(),
                },
                other => DomainError::Database(format!("Failed to create user: {}", other)),
            })?;

        Ok(user)
    }

    async fn count(&self) -> Result<u64, DomainError> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::Database(format!("Failed to count users: {}", e)))?;

        let total: i64 = row
            .try_get("total")
            .map_err(|e| DomainError::Database(format!("Failed to get total: {}", e)))?;

        Ok(total.max(0) as u64)
    }
}
