//! SMS Service Module
//!
//! Delivery of issued verification codes.
//!
//! ## Providers
//!
//! - **Kavenegar**: production gateway over its REST API
//! - **Mock**: logs messages for development and tests

use std::sync::Arc;

use sf_shared::config::SmsConfig;

pub mod delivery;
pub mod kavenegar;
pub mod mock_sms;
pub mod sms_service;

pub use delivery::SmsOtpDelivery;
pub use kavenegar::KavenegarSmsService;
pub use mock_sms::MockSmsService;
pub use sms_service::{verification_message, SmsService};

#[cfg(test)]
mod tests;

/// Create an SMS service based on configuration
///
/// Unknown providers and a Kavenegar setup without an API key fall back to
/// the mock implementation with a warning.
pub fn create_sms_service(config: &SmsConfig) -> Arc<dyn SmsService> {
    match config.provider.to_lowercase().as_str() {
        "mock" => Arc::new(MockSmsService::new()),
        "kavenegar" => match KavenegarSmsService::new(config.clone()) {
            Ok(service) => Arc::new(service),
            Err(e) => {
                tracing::error!("Failed to initialize Kavenegar SMS service: {}", e);
                tracing::warn!("Falling back to mock SMS service");
                Arc::new(MockSmsService::new())
            }
        },
        other => {
            tracing::warn!(
                "Unknown SMS provider '{}', using mock implementation",
                other
            );
            Arc::new(MockSmsService::new())
        }
    }
}
