//! Domain-specific error types and error handling.

use thiserror::Error;


/// OTP lifecycle failures surfaced to callers
///
/// `AlreadyPending`, backend degradation and delivery failures are not
/// errors; they are reported through the issue outcome and backend state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OtpError {
    #[error("Phone number is banned")]
    Forbidden,

    #[error("Verification code expired or was never issued")]
    Expired,

    #[error("Verification code is incorrect")]
    Incorrect,

    #[error("Too many incorrect attempts, request a new code")]
    TooManyAttempts,

    #[error("Invalid phone number: {phone}")]
    InvalidIdentity { phone: String },
}

/// Bearer credential failures on authenticated routes
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialError {
    #[error("Credential not provided")]
    Missing,

    #[error("Authorization header must use the Bearer scheme")]
    InvalidScheme,

    #[error("Credential is not valid")]
    Invalid,

    #[error("Credential has expired")]
    Expired,
}

/// Core domain errors (general purpose)
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {message}")]
    Internal { message: String },

    // Bridge to the OTP lifecycle errors
    #[error(transparent)]
    Otp(#[from] OtpError),

    #[error(transparent)]
    Credential(#[from] CredentialError),
}

impl DomainError {
    /// The OTP error wrapped by this domain error, if any
    pub fn as_otp(&self) -> Option<&OtpError> {
        match self {
            DomainError::Otp(err) => Some(err),
            _ => None,
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
