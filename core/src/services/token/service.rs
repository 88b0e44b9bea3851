//! Credential service minting the JWT returned after OTP verification

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

use sf_shared::config::JwtConfig;

use crate::domain::entities::user::User;
use crate::errors::{CredentialError, DomainError, DomainResult};

/// Claims carried by the identity credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialClaims {
    /// Subject (user ID)
    pub sub: String,
    /// User ID, kept alongside `sub` for clients that read `user_id`
    pub user_id: String,
    /// Role names (`ADMIN`, `USER`)
    pub roles: Vec<String>,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
    /// Issuer
    pub iss: String,
}

/// Mints and checks HS256 identity credentials
pub struct CredentialService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl CredentialService {
    /// Creates a new credential service from the JWT configuration
    pub fn new(config: JwtConfig) -> Self {
        if config.is_using_default_secret() {
            tracing::warn!("JWT_SECRET is not set, using the development secret");
        }

        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.validate_exp = true;

        Self {
            config,
            encoding_key,
            decoding_key,
            validation,
        }
    }

    /// Credential lifetime in seconds
    pub fn expires_in(&self) -> i64 {
        self.config.expiry_seconds
    }

    /// Sign a credential for a user
    pub fn issue(&self, user: &User) -> DomainResult<String> {
        let now = Utc::now();
        let claims = CredentialClaims {
            sub: user.id.to_string(),
            user_id: user.id.to_string(),
            roles: user.roles.iter().map(|role| role.as_str().to_string()).collect(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.config.expiry_seconds)).timestamp(),
            iss: self.config.issuer.clone(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            DomainError::Internal {
                message: format!("Failed to sign credential: {}", e),
            }
        })
    }

    /// Validate a credential and return its claims
    pub fn decode(&self, token: &str) -> Result<CredentialClaims, CredentialError> {
        decode::<CredentialClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => CredentialError::Expired,
                _ => CredentialError::Invalid,
            })
    }
}
