//! Application state and route registration

use actix_web::{error::InternalError, web, HttpRequest, HttpResponse};
use std::sync::Arc;

use sf_core::repositories::BanRepository;
use sf_core::services::otp::{IdentityResolver, OtpDelivery, OtpManager, PrimaryStore};
use sf_core::IdentityService;
use sf_infra::SmsOtpDelivery;
use sf_shared::errors::{error_codes, ErrorResponse};

use crate::backends::{BanBackend, PrimaryBackend, UserBackend};
use crate::i18n::{get_message, language_of};
use crate::middleware::RateLimit;
use crate::routes::{health::health_check, otp};

/// Shared services handed to every handler
pub struct AppState<P, D, B, I>
where
    P: PrimaryStore,
    D: OtpDelivery,
    B: BanRepository,
    I: IdentityResolver,
{
    pub otp: Arc<OtpManager<P, D, B, I>>,
    /// Same resolver the manager hands verified phones to
    pub identity: Arc<I>,
}

impl<P, D, B, I> AppState<P, D, B, I>
where
    P: PrimaryStore,
    D: OtpDelivery,
    B: BanRepository,
    I: IdentityResolver,
{
    pub fn new(otp: Arc<OtpManager<P, D, B, I>>, identity: Arc<I>) -> Self {
        Self { otp, identity }
    }
}

/// State type the server binary runs with
pub type ServerState =
    AppState<PrimaryBackend, SmsOtpDelivery, BanBackend, IdentityService<UserBackend>>;

/// Register the health check and the `/api/v1/otp` scope
///
/// The caller supplies `web::Data<AppState<P, D, B, I>>` through `app_data`,
/// and a `web::Data<RequestLimiter>` to enable rate limiting on the
/// send, verify and status routes.
pub fn configure<P, D, B, I>(cfg: &mut web::ServiceConfig)
where
    P: PrimaryStore + 'static,
    D: OtpDelivery + 'static,
    B: BanRepository + 'static,
    I: IdentityResolver + 'static,
{
    cfg.app_data(query_config())
        .route("/health", web::get().to(health_check::<P, D, B, I>))
        .service(
            web::scope("/api/v1/otp")
                .service(
                    web::resource("/send")
                        .wrap(RateLimit)
                        .route(web::post().to(otp::send::send_otp::<P, D, B, I>)),
                )
                .service(
                    web::resource("/verify")
                        .wrap(RateLimit)
                        .route(web::post().to(otp::verify::verify_otp::<P, D, B, I>)),
                )
                .service(
                    web::resource("/status")
                        .wrap(RateLimit)
                        .route(web::get().to(otp::status::otp_status::<P, D, B, I>)),
                )
                .route("/me", web::get().to(otp::me::me::<P, D, B, I>)),
        )
        .default_service(web::route().to(not_found));
}

/// JSON extractor settings; malformed bodies get the localized error shape
pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, req| {
            let body = ErrorResponse::new(
                error_codes::VALIDATION_ERROR,
                get_message("error.validation", language_of(req)),
            )
            .add_detail("body", err.to_string());
            InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
        })
}

/// Query string errors get the same shape as body errors
fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, req: &HttpRequest| {
        let body = ErrorResponse::new(
            error_codes::VALIDATION_ERROR,
            get_message("error.validation", language_of(req)),
        )
        .add_detail("query", err.to_string());
        InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
    })
}

async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse::new(
        error_codes::NOT_FOUND,
        "The requested resource was not found",
    ))
}
