//! Domain error to HTTP response mapping

use actix_web::{http::StatusCode, HttpResponse};
use tracing::{error, warn};
use validator::ValidationErrors;

use sf_core::errors::{CredentialError, DomainError, OtpError};
use sf_shared::errors::{error_codes, ErrorResponse};

use crate::i18n::{get_message, Language};

/// Status, error code and message key for a domain error
pub fn classify(error: &DomainError) -> (StatusCode, &'static str, &'static str) {
    match error {
        DomainError::Otp(otp) => match otp {
            OtpError::Forbidden => (StatusCode::FORBIDDEN, error_codes::FORBIDDEN, "error.forbidden"),
            OtpError::Expired => (
                StatusCode::BAD_REQUEST,
                error_codes::OTP_EXPIRED,
                "error.otp_expired",
            ),
            OtpError::Incorrect => (
                StatusCode::BAD_REQUEST,
                error_codes::OTP_INCORRECT,
                "error.otp_incorrect",
            ),
            OtpError::TooManyAttempts => (
                StatusCode::TOO_MANY_REQUESTS,
                error_codes::OTP_TOO_MANY_ATTEMPTS,
                "error.otp_too_many_attempts",
            ),
            OtpError::InvalidIdentity { .. } => (
                StatusCode::BAD_REQUEST,
                error_codes::PHONE_INVALID,
                "error.phone_invalid",
            ),
        },
        DomainError::Credential(credential) => match credential {
            CredentialError::Missing => (
                StatusCode::UNAUTHORIZED,
                error_codes::UNAUTHORIZED,
                "error.token_missing",
            ),
            CredentialError::InvalidScheme => (
                StatusCode::UNAUTHORIZED,
                error_codes::UNAUTHORIZED,
                "error.token_scheme",
            ),
            CredentialError::Invalid => (
                StatusCode::UNAUTHORIZED,
                error_codes::UNAUTHORIZED,
                "error.token_invalid",
            ),
            CredentialError::Expired => (
                StatusCode::UNAUTHORIZED,
                error_codes::TOKEN_EXPIRED,
                "error.token_expired",
            ),
        },
        DomainError::Validation { .. } => (
            StatusCode::BAD_REQUEST,
            error_codes::VALIDATION_ERROR,
            "error.validation",
        ),
        DomainError::NotFound { .. } => {
            (StatusCode::NOT_FOUND, error_codes::NOT_FOUND, "error.not_found")
        }
        DomainError::Database(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_codes::DATABASE_ERROR,
            "error.database",
        ),
        DomainError::Internal { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_codes::INTERNAL_ERROR,
            "error.internal",
        ),
    }
}

/// Localized error response for a domain error
///
/// Server-side failures are logged with their detail; the client only sees
/// the localized message.
pub fn domain_error_response(error: &DomainError, lang: Language) -> HttpResponse {
    let (status, code, key) = classify(error);

    if status.is_server_error() {
        error!(error = %error, code, "Request failed");
    } else {
        warn!(error = %error, code, "Request rejected");
    }

    HttpResponse::build(status).json(ErrorResponse::new(code, get_message(key, lang)))
}

/// 400 response listing the failing fields
pub fn validation_error_response(errors: &ValidationErrors, lang: Language) -> HttpResponse {
    let mut response = ErrorResponse::new(
        error_codes::VALIDATION_ERROR,
        get_message("error.validation", lang),
    );

    for (field, field_errors) in errors.field_errors() {
        let messages: Vec<String> = field_errors
            .iter()
            .map(|e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string())
            })
            .collect();
        response = response.add_detail(field, messages);
    }

    HttpResponse::BadRequest().json(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_otp_error_status_codes() {
        let cases = [
            (OtpError::Forbidden, StatusCode::FORBIDDEN),
            (OtpError::Expired, StatusCode::BAD_REQUEST),
            (OtpError::Incorrect, StatusCode::BAD_REQUEST),
            (OtpError::TooManyAttempts, StatusCode::TOO_MANY_REQUESTS),
            (
                OtpError::InvalidIdentity { phone: "12".to_string() },
                StatusCode::BAD_REQUEST,
            ),
        ];

        for (otp, expected) in cases {
            let (status, _, _) = classify(&DomainError::Otp(otp));
            assert_eq!(status, expected);
        }
    }

    #[test]
    fn test_credential_errors_are_unauthorized() {
        let (status, code, _) = classify(&CredentialError::Missing.into());
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(code, error_codes::UNAUTHORIZED);

        let (status, code, key) = classify(&CredentialError::Expired.into());
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(code, error_codes::TOKEN_EXPIRED);
        assert_eq!(key, "error.token_expired");
    }

    #[test]
    fn test_infrastructure_errors_are_server_errors() {
        let (status, code, _) = classify(&DomainError::Database("pool closed".to_string()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, error_codes::DATABASE_ERROR);
    }

    #[test]
    fn test_persian_message() {
        let response = domain_error_response(&DomainError::Otp(OtpError::Incorrect), Language::Persian);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
