use actix_web::{web, HttpRequest, HttpResponse};
use tracing::{info, warn};
use validator::Validate;

use sf_core::repositories::BanRepository;
use sf_core::services::otp::{IdentityResolver, OtpDelivery, PrimaryStore};
use sf_shared::types::ApiResponse;
use sf_shared::utils::phone::mask_phone_number;

use crate::app::AppState;
use crate::dto::{UserDto, VerifyOtpRequest, VerifyOtpResponse};
use crate::handlers::{domain_error_response, request_id, validation_error_response};
use crate::i18n::{get_message, language_of};

/// Handler for POST /api/v1/otp/verify
///
/// A correct code is consumed and exchanged for a credential; the account is
/// created on first sign-in.
///
/// # Responses
///
/// - `200` `{ "token", "user", "registered" }`
/// - `400` expired, never issued, incorrect or malformed
/// - `429` too many incorrect attempts for the current code
pub async fn verify_otp<P, D, B, I>(
    req: HttpRequest,
    state: web::Data<AppState<P, D, B, I>>,
    request: web::Json<VerifyOtpRequest>,
) -> HttpResponse
where
    P: PrimaryStore + 'static,
    D: OtpDelivery + 'static,
    B: BanRepository + 'static,
    I: IdentityResolver + 'static,
{
    let request_id = request_id(&req);
    let lang = language_of(&req);

    if let Err(errors) = request.validate() {
        warn!(request_id = %request_id, "Rejected verify request: {}", errors);
        return validation_error_response(&errors, lang);
    }

    match state.otp.verify(&request.phone, &request.code).await {
        Ok(outcome) => {
            let grant = outcome.grant;
            info!(
                request_id = %request_id,
                phone = %mask_phone_number(&grant.user.phone),
                user_id = %grant.user.id,
                registered = grant.created,
                "Phone verified"
            );

            let body = VerifyOtpResponse {
                user: UserDto::from(&grant.user),
                token: grant.token,
                registered: grant.created,
                message: get_message("otp.verified", lang),
            };
            HttpResponse::Ok().json(ApiResponse::success(body).with_request_id(request_id))
        }
        Err(error) => domain_error_response(&error, lang),
    }
}
