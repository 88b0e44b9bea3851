//! Bearer credential extraction for authenticated routes.
//!
//! The extractor only checks the `Authorization` header shape. Handlers pass
//! the token to `IdentityResolver::authenticate`, which validates the
//! signature and loads the user.

use actix_web::{
    dev::Payload, error::InternalError, http::header::AUTHORIZATION, Error, FromRequest,
    HttpRequest,
};
use std::future::{ready, Ready};

use sf_core::errors::{CredentialError, DomainError};

use crate::handlers::domain_error_response;
use crate::i18n::language_of;

/// Raw credential taken from `Authorization: Bearer <token>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken(pub String);

impl BearerToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Extracts the Bearer token from the Authorization header
fn extract_bearer_token(req: &HttpRequest) -> Result<String, CredentialError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or(CredentialError::Missing)?
        .to_str()
        .map_err(|_| CredentialError::InvalidScheme)?;

    let rest = header
        .trim()
        .strip_prefix("Bearer")
        .ok_or(CredentialError::InvalidScheme)?;

    if rest.trim().is_empty() {
        return Err(CredentialError::Missing);
    }
    if !rest.starts_with(' ') {
        return Err(CredentialError::InvalidScheme);
    }
    Ok(rest.trim().to_string())
}

impl FromRequest for BearerToken {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result = extract_bearer_token(req).map(BearerToken).map_err(|err| {
            let error = DomainError::from(err);
            let response = domain_error_response(&error, language_of(req));
            InternalError::from_response(error, response).into()
        });

        ready(result)
    }
}
