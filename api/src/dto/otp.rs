use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

use sf_core::User;

/// Digits only; codes are never alphanumeric
pub static NUMERIC_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+$").expect("code pattern"));

/// Phone characters accepted before normalization (`+98 912-000 0000`)
pub static PHONE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9 ()\-]+$").expect("phone pattern"));

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SendOtpRequest {
    #[validate(
        length(min = 10, max = 20, message = "Phone number must be 10-20 characters"),
        regex(path = "PHONE_CHARS", message = "Phone number contains invalid characters")
    )]
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VerifyOtpRequest {
    #[validate(
        length(min = 10, max = 20, message = "Phone number must be 10-20 characters"),
        regex(path = "PHONE_CHARS", message = "Phone number contains invalid characters")
    )]
    pub phone: String,

    #[validate(
        length(min = 4, max = 10, message = "Code must be 4-10 digits"),
        regex(path = "NUMERIC_CODE", message = "Code must contain digits only")
    )]
    pub code: String,
}

/// Query string of `GET /api/v1/otp/status`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OtpStatusQuery {
    #[validate(
        length(min = 10, max = 20, message = "Phone number must be 10-20 characters"),
        regex(path = "PHONE_CHARS", message = "Phone number contains invalid characters")
    )]
    pub phone: String,
}

/// Resend cooldown for a phone number
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpStatusResponse {
    /// True when no live code exists and a new one can be requested
    pub expired: bool,
    /// `"MM: SS"` left on the live code
    pub remaining_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SendOtpResponse {
    /// A new code was generated
    Issued {
        issued: bool,
        delivered: bool,
        expires_at: DateTime<Utc>,
        message: String,
    },
    /// A live code exists; the client should wait
    AlreadyPending {
        already_pending: bool,
        /// `"MM: SS"`
        remaining_time: String,
        message: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDto {
    pub id: String,
    pub phone: String,
    pub username: String,
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            phone: user.phone.clone(),
            username: user.username.clone(),
            roles: user.roles.iter().map(|role| role.as_str().to_string()).collect(),
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyOtpResponse {
    /// Signed credential
    pub token: String,
    pub user: UserDto,
    /// Whether this verification created the account
    pub registered: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeResponse {
    pub user: UserDto,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_request_validation() {
        let valid = SendOtpRequest { phone: "09120000000".to_string() };
        assert!(valid.validate().is_ok());

        let spaced = SendOtpRequest { phone: "+98 912 000 0000".to_string() };
        assert!(spaced.validate().is_ok());

        let short = SendOtpRequest { phone: "0912".to_string() };
        assert!(short.validate().is_err());

        let letters = SendOtpRequest { phone: "0912abc0000".to_string() };
        assert!(letters.validate().is_err());
    }

    #[test]
    fn test_verify_request_validation() {
        let valid = VerifyOtpRequest {
            phone: "09120000000".to_string(),
            code: "123456".to_string(),
        };
        assert!(valid.validate().is_ok());

        let alpha = VerifyOtpRequest {
            phone: "09120000000".to_string(),
            code: "12a456".to_string(),
        };
        let errors = alpha.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("code"));
    }

    #[test]
    fn test_send_response_shapes() {
        let pending = SendOtpResponse::AlreadyPending {
            already_pending: true,
            remaining_time: "04: 10".to_string(),
            message: "wait".to_string(),
        };
        let json = serde_json::to_value(&pending).unwrap();
        assert_eq!(json["already_pending"], true);
        assert_eq!(json["remaining_time"], "04: 10");
        assert!(json.get("issued").is_none());
    }
}
