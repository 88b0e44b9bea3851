//! SMS gateway configuration module

use serde::{Deserialize, Serialize};

use super::env_or;

/// SMS gateway configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SmsConfig {
    /// Provider name ("mock" or "kavenegar")
    pub provider: String,

    /// Gateway API key
    #[serde(default)]
    pub api_key: String,

    /// Sender line number
    #[serde(default)]
    pub sender: String,

    /// Verification template name registered with the gateway
    #[serde(default)]
    pub template: Option<String>,

    /// Base URL of the gateway REST API
    pub base_url: String,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// Send attempts before reporting a delivery failure
    pub max_retries: u32,
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            provider: String::from("mock"),
            api_key: String::new(),
            sender: String::new(),
            template: None,
            base_url: String::from("https://api.kavenegar.com/v1"),
            request_timeout_secs: 10,
            max_retries: 3,
        }
    }
}

impl SmsConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            provider: std::env::var("SMS_PROVIDER").unwrap_or(defaults.provider),
            api_key: std::env::var("SMS_API_KEY").unwrap_or_default(),
            sender: std::env::var("SMS_SENDER").unwrap_or_default(),
            template: std::env::var("SMS_TEMPLATE").ok().filter(|t| !t.is_empty()),
            base_url: std::env::var("SMS_BASE_URL").unwrap_or(defaults.base_url),
            request_timeout_secs: env_or("SMS_REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs),
            max_retries: env_or("SMS_MAX_RETRIES", defaults.max_retries),
        }
    }
}
