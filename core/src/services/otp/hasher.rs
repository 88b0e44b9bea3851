//! bcrypt hashing of passcodes, offloaded from the async runtime.

use crate::errors::{DomainError, DomainResult};

/// Lowest cost bcrypt accepts
pub const MIN_HASH_COST: u32 = 4;

/// Highest cost bcrypt accepts
pub const MAX_HASH_COST: u32 = 31;

/// One-way hashing and comparison of plaintext codes
#[derive(Debug, Clone, Copy)]
pub struct SecretHasher {
    cost: u32,
}

impl SecretHasher {
    /// Create a hasher with the given work factor, clamped to bcrypt's range
    pub fn new(cost: u32) -> Self {
        Self {
            cost: cost.clamp(MIN_HASH_COST, MAX_HASH_COST),
        }
    }

    /// Effective work factor
    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a plaintext code
    pub async fn hash(&self, plaintext: &str) -> DomainResult<String> {
        let plaintext = plaintext.to_owned();
        let cost = self.cost;

        tokio::task::spawn_blocking(move || bcrypt::hash(plaintext, cost))
            .await
            .map_err(|e| DomainError::Internal {
                message: format!("Hashing task failed: {}", e),
            })?
            .map_err(|e| DomainError::Internal {
                message: format!("Failed to hash code: {}", e),
            })
    }

    /// Compare a plaintext code against a stored hash
    ///
    /// Malformed hashes and worker failures compare as a mismatch.
    pub async fn compare(&self, plaintext: &str, hashed: &str) -> bool {
        let plaintext = plaintext.to_owned();
        let hashed = hashed.to_owned();

        match tokio::task::spawn_blocking(move || bcrypt::verify(plaintext, &hashed)).await {
            Ok(Ok(matches)) => matches,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, event = "malformed_hash", "Stored OTP hash is malformed");
                false
            }
            Err(e) => {
                tracing::error!(error = %e, "Hash comparison task failed");
                false
            }
        }
    }
}

impl Default for SecretHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}
