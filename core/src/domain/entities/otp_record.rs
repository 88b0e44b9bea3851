//! One-time passcode record and its caller-facing status.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// An issued one-time passcode
///
/// Only the bcrypt hash of the code is kept. Records are never mutated after
/// issuance; they leave the live set by consumption or by expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpRecord {
    /// Normalized phone number the code was issued for
    pub identity_key: String,

    /// bcrypt hash of the plaintext code
    pub secret_hash: String,

    /// Issuance timestamp
    pub issued_at: DateTime<Utc>,

    /// Instant after which the record is considered absent
    pub expires_at: DateTime<Utc>,
}

impl OtpRecord {
    /// Creates a record valid for `validity_seconds` from now
    pub fn issue(identity_key: String, secret_hash: String, validity_seconds: u64) -> Self {
        let issued_at = Utc::now();
        let validity = i64::try_from(validity_seconds).unwrap_or(i64::MAX);
        Self {
            identity_key,
            secret_hash,
            issued_at,
            expires_at: issued_at + Duration::seconds(validity),
        }
    }

    /// Whether the record has passed its expiry
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Whole seconds left before expiry, rounded up; zero once expired
    pub fn remaining_seconds(&self) -> u64 {
        let millis = (self.expires_at - Utc::now()).num_milliseconds();
        if millis <= 0 {
            0
        } else {
            (millis as u64).div_ceil(1000)
        }
    }
}

/// Caller-facing view of the OTP state for a phone number
///
/// Never carries the secret hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpStatus {
    /// True when no live code exists
    pub expired: bool,

    /// Remaining validity rendered as `MM: SS`
    pub remaining_time: String,
}

impl OtpStatus {
    /// Status of a live code with the given remaining seconds
    pub fn live(remaining_seconds: u64) -> Self {
        Self {
            expired: false,
            remaining_time: format_remaining_time(remaining_seconds),
        }
    }

    /// Status when no live code exists
    pub fn expired() -> Self {
        Self {
            expired: true,
            remaining_time: format_remaining_time(0),
        }
    }
}

/// Render whole seconds as zero-padded `MM: SS`
///
/// The separator is a colon followed by a space, which is how clients have
/// always received it.
pub fn format_remaining_time(remaining_seconds: u64) -> String {
    let minutes = remaining_seconds / 60;
    let seconds = remaining_seconds % 60;
    format!("{:02}: {:02}", minutes, seconds)
}
