//! One-time passcode configuration module

use serde::{Deserialize, Serialize};

use super::{env_flag, env_or};

/// Default validity window for an issued code (5 minutes)
pub const DEFAULT_VALIDITY_SECONDS: u64 = 300;

/// Default number of digits in a generated code
pub const DEFAULT_CODE_LENGTH: usize = 6;

/// Shortest code the generator will produce
pub const MIN_CODE_LENGTH: usize = 4;

/// Longest code the generator will produce
pub const MAX_CODE_LENGTH: usize = 10;

/// Default interval between fallback store sweeps
pub const DEFAULT_SWEEP_INTERVAL_SECONDS: u64 = 60;

/// Default bcrypt work factor
pub const DEFAULT_HASH_COST: u32 = 12;

/// Default key namespace in the primary store
pub const DEFAULT_KEY_PREFIX: &str = "OTP";

/// Default number of wrong guesses before a code is revoked
pub const DEFAULT_MAX_VERIFY_ATTEMPTS: u32 = 5;

/// OTP lifecycle configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OtpConfig {
    /// Seconds an issued code stays live
    #[serde(default = "default_validity")]
    pub validity_duration_seconds: u64,

    /// Number of digits in a generated code
    #[serde(default = "default_code_length")]
    pub code_length: usize,

    /// Seconds between fallback store sweeps
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,

    /// bcrypt work factor
    #[serde(default = "default_hash_cost")]
    pub hash_work_factor: u32,

    /// Deterministic code used instead of a random one (test mode)
    #[serde(default)]
    pub fixed_code: Option<String>,

    /// Key namespace in the primary store
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Mirror every issued record into the fallback store
    #[serde(default = "default_mirror")]
    pub mirror_to_fallback: bool,

    /// Wrong guesses allowed before the code is revoked (0 disables the lockout)
    #[serde(default = "default_max_verify_attempts")]
    pub max_verify_attempts: u32,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            validity_duration_seconds: default_validity(),
            code_length: default_code_length(),
            sweep_interval_seconds: default_sweep_interval(),
            hash_work_factor: default_hash_cost(),
            fixed_code: None,
            key_prefix: default_key_prefix(),
            mirror_to_fallback: default_mirror(),
            max_verify_attempts: default_max_verify_attempts(),
        }
    }
}

impl OtpConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let fixed_code = std::env::var("OTP_FIXED_CODE")
            .ok()
            .map(|code| code.trim().to_string())
            .filter(|code| !code.is_empty() && code.chars().all(|c| c.is_ascii_digit()));

        Self {
            validity_duration_seconds: env_or("OTP_VALIDITY_SECONDS", DEFAULT_VALIDITY_SECONDS),
            code_length: env_or("OTP_CODE_LENGTH", DEFAULT_CODE_LENGTH),
            sweep_interval_seconds: env_or(
                "OTP_SWEEP_INTERVAL_SECONDS",
                DEFAULT_SWEEP_INTERVAL_SECONDS,
            ),
            hash_work_factor: env_or("OTP_HASH_COST", DEFAULT_HASH_COST),
            fixed_code,
            key_prefix: std::env::var("OTP_KEY_PREFIX")
                .unwrap_or_else(|_| DEFAULT_KEY_PREFIX.to_string()),
            mirror_to_fallback: env_flag("OTP_MIRROR_TO_FALLBACK", true),
            max_verify_attempts: env_or("OTP_MAX_VERIFY_ATTEMPTS", DEFAULT_MAX_VERIFY_ATTEMPTS),
        }
        .normalized()
    }

    /// Clamp values into the ranges the OTP manager accepts
    pub fn normalized(mut self) -> Self {
        self.code_length = self.code_length.clamp(MIN_CODE_LENGTH, MAX_CODE_LENGTH);
        self.validity_duration_seconds = self.validity_duration_seconds.max(1);
        self.sweep_interval_seconds = self.sweep_interval_seconds.max(1);
        self
    }

    /// Use a deterministic code for every issuance
    pub fn with_fixed_code(mut self, code: impl Into<String>) -> Self {
        self.fixed_code = Some(code.into());
        self
    }

    /// Set the validity window in seconds
    pub fn with_validity_seconds(mut self, seconds: u64) -> Self {
        self.validity_duration_seconds = seconds.max(1);
        self
    }

    /// Set the bcrypt work factor
    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_work_factor = cost;
        self
    }

    /// Whether the verification lockout is active
    pub fn lockout_enabled(&self) -> bool {
        self.max_verify_attempts > 0
    }
}

fn default_validity() -> u64 {
    DEFAULT_VALIDITY_SECONDS
}

fn default_code_length() -> usize {
    DEFAULT_CODE_LENGTH
}

fn default_sweep_interval() -> u64 {
    DEFAULT_SWEEP_INTERVAL_SECONDS
}

fn default_hash_cost() -> u32 {
    DEFAULT_HASH_COST
}

fn default_key_prefix() -> String {
    DEFAULT_KEY_PREFIX.to_string()
}

fn default_mirror() -> bool {
    true
}

fn default_max_verify_attempts() -> u32 {
    DEFAULT_MAX_VERIFY_ATTEMPTS
}
