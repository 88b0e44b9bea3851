//! Adapter from an SMS gateway to the OTP manager's delivery seam

use async_trait::async_trait;
use std::sync::Arc;

use sf_core::services::otp::OtpDelivery;

use super::sms_service::SmsService;

/// Delivers issued codes through any [`SmsService`]
#[derive(Clone)]
pub struct SmsOtpDelivery {
    service: Arc<dyn SmsService>,
}

impl SmsOtpDelivery {
    pub fn new(service: Arc<dyn SmsService>) -> Self {
        Self { service }
    }

    /// Name of the wrapped gateway
    pub fn provider_name(&self) -> &str {
        self.service.provider_name()
    }
}

#[async_trait]
impl OtpDelivery for SmsOtpDelivery {
    async fn send_otp(&self, phone: &str, code: &str) -> Result<String, String> {
        self.service
            .send_verification_code(phone, code)
            .await
            .map_err(|e| e.to_string())
    }
}
