//! Find-or-create identity resolution after a successful OTP verification

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use sf_shared::utils::phone::mask_phone_number;

use crate::domain::entities::user::{Role, User};
use crate::domain::value_objects::IdentityGrant;
use crate::errors::{CredentialError, DomainError, DomainResult};
use crate::repositories::UserRepository;
use crate::services::otp::IdentityResolver;
use crate::services::token::CredentialService;

/// Resolves phone numbers into users and mints their credentials
///
/// The first user ever created becomes an administrator; every later
/// registration gets the regular user role. Registrations in this process
/// are serialized so the role decision and the insert happen together.
pub struct IdentityService<U: UserRepository> {
    users: Arc<U>,
    credentials: Arc<CredentialService>,
    registration: Mutex<()>,
}

impl<U: UserRepository> IdentityService<U> {
    pub fn new(users: Arc<U>, credentials: Arc<CredentialService>) -> Self {
        Self {
            users,
            credentials,
            registration: Mutex::new(()),
        }
    }

    async fn register(&self, phone: &str) -> DomainResult<(User, bool)> {
        let _guard = self.registration.lock().await;

        let role = if self.users.count().await? == 0 {
            Role::Admin
        } else {
            Role::User
        };

        match self.users.create(User::new(phone.to_string(), role)).await {
            Ok(user) => {
                info!(
                    phone = %mask_phone_number(phone),
                    user_id = %user.id,
                    role = %role,
                    event = "user_registered",
                    "Registered new user"
                );
                Ok((user, true))
            }
            // A concurrent verification registered the same phone first
            Err(DomainError::Validation { .. }) => self
                .users
                .find_by_phone(phone)
                .await?
                .map(|user| (user, false))
                .ok_or_else(|| DomainError::Internal {
                    message: "User vanished after duplicate registration".to_string(),
                }),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl<U: UserRepository> IdentityResolver for IdentityService<U> {
    async fn find_or_create_identity(&self, phone: &str) -> DomainResult<IdentityGrant> {
        let (user, created) = match self.users.find_by_phone(phone).await? {
            Some(user) => (user, false),
            None => self.register(phone).await?,
        };

        let token = self.credentials.issue(&user)?;
        Ok(IdentityGrant::new(user, token, created))
    }

    async fn authenticate(&self, token: &str) -> DomainResult<User> {
        let claims = self.credentials.decode(token)?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| CredentialError::Invalid)?;

        match self.users.find_by_id(user_id).await? {
            Some(user) => Ok(user),
            None => {
                warn!(user_id = %user_id, "Credential refers to a missing user");
                Err(DomainError::NotFound {
                    resource: format!("user {}", user_id),
                })
            }
        }
    }
}
