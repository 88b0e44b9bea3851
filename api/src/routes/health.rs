use actix_web::{web, HttpResponse};
use chrono::Utc;

use sf_core::repositories::BanRepository;
use sf_core::services::otp::{BackendStatus, IdentityResolver, OtpDelivery, PrimaryStore};
use sf_shared::types::{HealthResponse, HealthStatus};

use crate::app::AppState;

/// Handler for GET /health
///
/// Always 200: a degraded primary store still serves codes from the
/// fallback store, so it is reported rather than failed.
pub async fn health_check<P, D, B, I>(state: web::Data<AppState<P, D, B, I>>) -> HttpResponse
where
    P: PrimaryStore + 'static,
    D: OtpDelivery + 'static,
    B: BanRepository + 'static,
    I: IdentityResolver + 'static,
{
    let backend = state.otp.backend_status();
    let status = match backend {
        BackendStatus::Degraded => HealthStatus::Degraded,
        BackendStatus::Available | BackendStatus::Unknown => HealthStatus::Healthy,
    };

    HttpResponse::Ok().json(HealthResponse {
        status,
        storage_backend: backend.as_str().to_string(),
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
