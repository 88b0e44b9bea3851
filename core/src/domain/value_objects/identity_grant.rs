//! Identity grant value object returned after a successful verification.

use serde::{Deserialize, Serialize};

use crate::domain::entities::user::User;

/// Resolved identity plus the opaque credential minted for it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdentityGrant {
    /// The existing or newly created user
    pub user: User,

    /// Signed credential (JWT) for the user
    pub token: String,

    /// Whether the user was created by this verification
    pub created: bool,
}

impl IdentityGrant {
    /// Creates a new identity grant
    pub fn new(user: User, token: String, created: bool) -> Self {
        Self {
            user,
            token,
            created,
        }
    }
}
