//! Shared fixtures for the HTTP tests

#![allow(dead_code)]

use actix_web::web;
use std::sync::Arc;

use sf_api::app::AppState;
use sf_api::middleware::RequestLimiter;
use sf_core::repositories::{InMemoryBanRepository, InMemoryUserRepository};
use sf_core::services::otp::{FallbackStore, OtpManager};
use sf_core::services::token::CredentialService;
use sf_core::IdentityService;
use sf_infra::sms::MockSmsService;
use sf_infra::{InMemoryPrimaryStore, SmsOtpDelivery};
use sf_shared::config::{JwtConfig, OtpConfig, RateLimitConfig};

pub const PHONE: &str = "09120000000";
pub const CODE: &str = "123456";
pub const JWT_SECRET: &str = "api-test-secret";

pub type TestState = AppState<
    InMemoryPrimaryStore,
    SmsOtpDelivery,
    InMemoryBanRepository,
    IdentityService<InMemoryUserRepository>,
>;

pub struct TestContext {
    pub state: web::Data<TestState>,
    pub limiter: web::Data<RequestLimiter>,
    pub primary: Arc<InMemoryPrimaryStore>,
    pub sms: Arc<MockSmsService>,
    pub bans: Arc<InMemoryBanRepository>,
}

/// Fixed code `123456`, cheap hashing
pub fn test_config() -> OtpConfig {
    OtpConfig::default().with_hash_cost(4).with_fixed_code(CODE)
}

pub fn context(config: OtpConfig) -> TestContext {
    context_with_limit(config, RateLimitConfig::default())
}

pub fn context_with_limit(config: OtpConfig, rate_limit: RateLimitConfig) -> TestContext {
    let primary = Arc::new(InMemoryPrimaryStore::new());
    let sms = Arc::new(MockSmsService::new());
    let bans = Arc::new(InMemoryBanRepository::new());
    let identity = Arc::new(IdentityService::new(
        Arc::new(InMemoryUserRepository::new()),
        Arc::new(CredentialService::new(JwtConfig::new(JWT_SECRET))),
    ));

    let manager = OtpManager::new(
        primary.clone(),
        Arc::new(FallbackStore::new()),
        Arc::new(SmsOtpDelivery::new(sms.clone())),
        bans.clone(),
        identity.clone(),
        config,
    );

    TestContext {
        state: web::Data::new(AppState::new(Arc::new(manager), identity)),
        limiter: web::Data::new(RequestLimiter::new(rate_limit)),
        primary,
        sms,
        bans,
    }
}

/// Build the service under test with the same routes and extractor settings as the server
#[macro_export]
macro_rules! init_app {
    ($ctx:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($ctx.state.clone())
                .app_data($ctx.limiter.clone())
                .app_data(sf_api::app::json_config(4096))
                .configure(
                    sf_api::app::configure::<
                        sf_infra::InMemoryPrimaryStore,
                        sf_infra::SmsOtpDelivery,
                        sf_core::repositories::InMemoryBanRepository,
                        sf_core::IdentityService<sf_core::repositories::InMemoryUserRepository>,
                    >,
                ),
        )
        .await
    };
}
