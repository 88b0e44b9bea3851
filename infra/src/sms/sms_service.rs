//! SMS Service Interface
//!
//! Defines the trait for SMS gateways that deliver verification codes.

use async_trait::async_trait;

use crate::InfrastructureError;

/// SMS service trait for sending text messages
///
/// Implementations include:
/// - Kavenegar REST API
/// - Mock implementation for development
#[async_trait]
pub trait SmsService: Send + Sync {
    /// Send an SMS message to a phone number
    ///
    /// # Arguments
    ///
    /// * `phone_number` - The recipient's normalized phone number
    /// * `message` - The message content to send
    ///
    /// # Returns
    ///
    /// * `Ok(message_id)` - Provider identifier for the sent message
    /// * `Err(InfrastructureError)` - If sending fails
    async fn send_sms(&self, phone_number: &str, message: &str) -> Result<String, InfrastructureError>;

    /// Send a verification code via SMS
    ///
    /// Gateways with a registered verification template override this.
    async fn send_verification_code(
        &self,
        phone_number: &str,
        code: &str,
    ) -> Result<String, InfrastructureError> {
        self.send_sms(phone_number, &verification_message(code)).await
    }

    /// Provider name used in logs
    fn provider_name(&self) -> &str;

    /// Check if the service is available
    async fn is_available(&self) -> bool {
        true
    }
}

/// Plain-text verification message used when no template is registered
pub fn verification_message(code: &str) -> String {
    format!("Your Storefront verification code: {}\nکد تایید استورفرانت: {}", code, code)
}
