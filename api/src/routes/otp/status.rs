use actix_web::{web, HttpRequest, HttpResponse};
use tracing::{debug, warn};
use validator::Validate;

use sf_core::repositories::BanRepository;
use sf_core::services::otp::{IdentityResolver, OtpDelivery, PrimaryStore};
use sf_shared::types::ApiResponse;
use sf_shared::utils::phone::mask_phone_number;

use crate::app::AppState;
use crate::dto::{OtpStatusQuery, OtpStatusResponse};
use crate::handlers::{domain_error_response, request_id, validation_error_response};
use crate::i18n::language_of;

/// Handler for GET /api/v1/otp/status?phone=...
///
/// Lets clients render the resend cooldown without issuing a code.
///
/// # Responses
///
/// - `200` `{ "expired": false, "remaining_time": "04: 12" }`
/// - `400` malformed phone number
pub async fn otp_status<P, D, B, I>(
    req: HttpRequest,
    state: web::Data<AppState<P, D, B, I>>,
    query: web::Query<OtpStatusQuery>,
) -> HttpResponse
where
    P: PrimaryStore + 'static,
    D: OtpDelivery + 'static,
    B: BanRepository + 'static,
    I: IdentityResolver + 'static,
{
    let request_id = request_id(&req);
    let lang = language_of(&req);

    if let Err(errors) = query.validate() {
        warn!(request_id = %request_id, "Rejected status request: {}", errors);
        return validation_error_response(&errors, lang);
    }

    match state.otp.status(&query.phone).await {
        Ok(status) => {
            debug!(
                request_id = %request_id,
                phone = %mask_phone_number(&query.phone),
                expired = status.expired,
                "OTP status"
            );
            let body = OtpStatusResponse {
                expired: status.expired,
                remaining_time: status.remaining_time,
            };
            HttpResponse::Ok().json(ApiResponse::success(body).with_request_id(request_id))
        }
        Err(error) => domain_error_response(&error, lang),
    }
}
