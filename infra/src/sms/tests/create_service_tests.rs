//! Tests for provider selection

use sf_shared::config::SmsConfig;

use crate::sms::create_sms_service;

#[test]
fn test_mock_provider() {
    let service = create_sms_service(&SmsConfig::default());
    assert_eq!(service.provider_name(), "Mock");
}

#[test]
fn test_kavenegar_provider() {
    let config = SmsConfig {
        provider: "Kavenegar".to_string(),
        api_key: "test-key".to_string(),
        ..SmsConfig::default()
    };

    assert_eq!(create_sms_service(&config).provider_name(), "Kavenegar");
}

#[test]
fn test_kavenegar_without_key_falls_back_to_mock() {
    let config = SmsConfig {
        provider: "kavenegar".to_string(),
        ..SmsConfig::default()
    };

    assert_eq!(create_sms_service(&config).provider_name(), "Mock");
}

#[test]
fn test_unknown_provider_falls_back_to_mock() {
    let config = SmsConfig {
        provider: "carrier-pigeon".to_string(),
        ..SmsConfig::default()
    };

    assert_eq!(create_sms_service(&config).provider_name(), "Mock");
}
