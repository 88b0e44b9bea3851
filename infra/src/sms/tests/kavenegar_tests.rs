//! Unit tests for the Kavenegar gateway client

use sf_shared::config::SmsConfig;

use crate::sms::kavenegar::{KavenegarResponse, KavenegarSmsService};
use crate::sms::SmsService;
use crate::InfrastructureError;

fn config() -> SmsConfig {
    SmsConfig {
        provider: "kavenegar".to_string(),
        api_key: "test-key".to_string(),
        sender: "10004346".to_string(),
        ..SmsConfig::default()
    }
}

#[test]
fn test_missing_api_key_is_config_error() {
    let result = KavenegarSmsService::new(SmsConfig::default());
    assert!(matches!(result, Err(InfrastructureError::Config(_))));
}

#[test]
fn test_endpoint_embeds_api_key() {
    let service = KavenegarSmsService::new(SmsConfig {
        base_url: "https://api.kavenegar.com/v1/".to_string(),
        ..config()
    })
    .unwrap();

    assert_eq!(
        service.endpoint("verify/lookup.json"),
        "https://api.kavenegar.com/v1/test-key/verify/lookup.json"
    );
    assert_eq!(service.provider_name(), "Kavenegar");
}

#[test]
fn test_accepted_response_yields_message_id() {
    let body = r#"{
        "return": {"status": 200, "message": "تایید شد"},
        "entries": [{"messageid": 8792343, "status": 5, "receptor": "09120000000"}]
    }"#;

    let response: KavenegarResponse = serde_json::from_str(body).unwrap();
    assert_eq!(response.into_message_id().unwrap(), "8792343");
}

#[test]
fn test_rejected_response_is_error() {
    let body = r#"{"return": {"status": 418, "message": "اعتبار حساب شما کافی نیست"}, "entries": null}"#;

    let response: KavenegarResponse = serde_json::from_str(body).unwrap();
    let err = response.into_message_id().unwrap_err();
    assert!(err.to_string().contains("418"));
}

#[test]
fn test_accepted_response_without_entries_is_error() {
    let body = r#"{"return": {"status": 200, "message": "ok"}}"#;

    let response: KavenegarResponse = serde_json::from_str(body).unwrap();
    assert!(response.into_message_id().is_err());
}

#[tokio::test]
async fn test_unreachable_gateway_fails_after_retries() {
    let service = KavenegarSmsService::new(SmsConfig {
        base_url: "http://127.0.0.1:1".to_string(),
        request_timeout_secs: 2,
        max_retries: 1,
        ..config()
    })
    .unwrap();

    let err = service
        .send_verification_code("09120000000", "123456")
        .await
        .unwrap_err();

    match err {
        InfrastructureError::Sms(msg) => assert!(msg.contains("after 1 attempts")),
        other => panic!("Expected Sms error, got {:?}", other),
    }
}
