//! Kavenegar SMS Service Implementation
//!
//! Sends verification codes through the Kavenegar REST API. With a
//! registered template the `verify/lookup` endpoint is used, otherwise a
//! plain `sms/send` with the default message text.
//!
//! The API key is part of the request path, so request URLs are never logged.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use sf_shared::config::SmsConfig;
use sf_shared::utils::phone::mask_phone_number;

use super::sms_service::{verification_message, SmsService};
use crate::InfrastructureError;

/// Initial delay between send attempts; doubles on each retry
const RETRY_BASE_DELAY_MS: u64 = 500;

/// Kavenegar response envelope
#[derive(Debug, Deserialize)]
pub(crate) struct KavenegarResponse {
    #[serde(rename = "return")]
    pub status: KavenegarReturn,
    #[serde(default)]
    pub entries: Option<Vec<KavenegarEntry>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct KavenegarReturn {
    pub status: u16,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct KavenegarEntry {
    pub messageid: i64,
}

impl KavenegarResponse {
    /// Message id of the first entry, when the gateway accepted the request
    pub(crate) fn into_message_id(self) -> Result<String, InfrastructureError> {
        if self.status.status != 200 {
            return Err(InfrastructureError::Sms(format!(
                "Gateway rejected the request ({}): {}",
                self.status.status, self.status.message
            )));
        }

        self.entries
            .and_then(|entries| entries.into_iter().next())
            .map(|entry| entry.messageid.to_string())
            .ok_or_else(|| InfrastructureError::Sms("Gateway returned no message entry".to_string()))
    }
}

/// Outcome of a single HTTP attempt
enum Attempt {
    Sent(String),
    Retry(InfrastructureError),
    Fatal(InfrastructureError),
}

/// Kavenegar SMS service implementation
pub struct KavenegarSmsService {
    client: Client,
    config: SmsConfig,
}

impl KavenegarSmsService {
    /// Create a new Kavenegar SMS service
    pub fn new(config: SmsConfig) -> Result<Self, InfrastructureError> {
        if config.api_key.trim().is_empty() {
            return Err(InfrastructureError::Config("SMS_API_KEY not set".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .build()?;

        info!(
            sender = %config.sender,
            template = config.template.as_deref().unwrap_or("-"),
            "Kavenegar SMS service initialized"
        );

        Ok(Self { client, config })
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.api_key,
            path
        )
    }

    async fn post_once(&self, path: &str, params: &[(&str, &str)]) -> Attempt {
        let response = match self.client.post(self.endpoint(path)).form(params).send().await {
            Ok(response) => response,
            Err(e) => return Attempt::Retry(InfrastructureError::Http(e.without_url())),
        };

        let status = response.status();
        let body = match response.json::<KavenegarResponse>().await {
            Ok(body) => body,
            Err(e) if status.is_server_error() => {
                return Attempt::Retry(InfrastructureError::Http(e.without_url()))
            }
            Err(e) => return Attempt::Fatal(InfrastructureError::Http(e.without_url())),
        };

        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return Attempt::Retry(InfrastructureError::Sms(format!(
                "Gateway unavailable ({}): {}",
                status.as_u16(),
                body.status.message
            )));
        }

        match body.into_message_id() {
            Ok(message_id) => Attempt::Sent(message_id),
            Err(e) => Attempt::Fatal(e),
        }
    }

    /// Post with retry on transport errors, 5xx and 429
    async fn post_with_retry(
        &self,
        path: &str,
        phone_number: &str,
        params: &[(&str, &str)],
    ) -> Result<String, InfrastructureError> {
        let max_attempts = self.config.max_retries.max(1);
        let mut delay = Duration::from_millis(RETRY_BASE_DELAY_MS);
        let masked = mask_phone_number(phone_number);

        for attempt in 1..=max_attempts {
            debug!(attempt, max_attempts, phone = %masked, path, "Sending SMS via Kavenegar");

            match self.post_once(path, params).await {
                Attempt::Sent(message_id) => {
                    info!(
                        phone = %masked,
                        message_id = %message_id,
                        provider = "kavenegar",
                        "SMS sent"
                    );
                    return Ok(message_id);
                }
                Attempt::Fatal(e) => {
                    error!(phone = %masked, error = %e, "Kavenegar rejected the SMS");
                    return Err(e);
                }
                Attempt::Retry(e) if attempt < max_attempts => {
                    warn!(
                        attempt,
                        max_attempts,
                        retry_in_ms = delay.as_millis() as u64,
                        error = %e,
                        "Kavenegar send failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                Attempt::Retry(e) => {
                    error!(attempts = max_attempts, error = %e, "Kavenegar send failed");
                    return Err(InfrastructureError::Sms(format!(
                        "Failed to send SMS after {} attempts: {}",
                        max_attempts, e
                    )));
                }
            }
        }

        Err(InfrastructureError::Sms("No send attempt was made".to_string()))
    }
}

#[async_trait]
impl SmsService for KavenegarSmsService {
    async fn send_sms(&self, phone_number: &str, message: &str) -> Result<String, InfrastructureError> {
        let mut params = vec![("receptor", phone_number), ("message", message)];
        if !self.config.sender.is_empty() {
            params.push(("sender", self.config.sender.as_str()));
        }
        self.post_with_retry("sms/send.json", phone_number, &params).await
    }

    async fn send_verification_code(
        &self,
        phone_number: &str,
        code: &str,
    ) -> Result<String, InfrastructureError> {
        match self.config.template.as_deref() {
            Some(template) => {
                let params = [("receptor", phone_number), ("token", code), ("template", template)];
                self.post_with_retry("verify/lookup.json", phone_number, &params).await
            }
            None => self.send_sms(phone_number, &verification_message(code)).await,
        }
    }

    fn provider_name(&self) -> &str {
        "Kavenegar"
    }
}
