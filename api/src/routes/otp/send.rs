use actix_web::{web, HttpRequest, HttpResponse};
use std::collections::HashMap;
use tracing::{info, warn};
use validator::Validate;

use sf_core::repositories::BanRepository;
use sf_core::services::otp::{IdentityResolver, IssueOutcome, OtpDelivery, PrimaryStore};
use sf_shared::types::ApiResponse;
use sf_shared::utils::phone::mask_phone_number;

use crate::app::AppState;
use crate::dto::{SendOtpRequest, SendOtpResponse};
use crate::handlers::{domain_error_response, request_id, validation_error_response};
use crate::i18n::{format_message, get_message, language_of};

/// Handler for POST /api/v1/otp/send
///
/// # Request Body
///
/// ```json
/// { "phone": "09120000000" }
/// ```
///
/// # Responses
///
/// - `200` `{ "issued": true, "delivered": true, ... }` for a new code
/// - `200` `{ "already_pending": true, "remaining_time": "04: 12", ... }` while a code is live
/// - `400` malformed phone number
/// - `403` banned phone number
pub async fn send_otp<P, D, B, I>(
    req: HttpRequest,
    state: web::Data<AppState<P, D, B, I>>,
    request: web::Json<SendOtpRequest>,
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
        warn!(request_id = %request_id, "Rejected send request: {}", errors);
        return validation_error_response(&errors, lang);
    }

    info!(
        request_id = %request_id,
        phone = %mask_phone_number(&request.phone),
        "Processing send request"
    );

    match state.otp.issue(&request.phone).await {
        Ok(IssueOutcome::Issued {
            expires_at,
            delivery,
            ..
        }) => {
            let delivered = delivery.is_delivered();
            let message = if delivered {
                get_message("otp.sent", lang)
            } else {
                get_message("otp.delivery_failed", lang)
            };

            let body = SendOtpResponse::Issued {
                issued: true,
                delivered,
                expires_at,
                message,
            };
            HttpResponse::Ok().json(ApiResponse::success(body).with_request_id(request_id))
        }
        Ok(IssueOutcome::AlreadyPending { remaining_time }) => {
            let mut params = HashMap::new();
            params.insert("remaining_time", remaining_time.clone());
            let message = format_message(&get_message("otp.already_pending", lang), &params);

            let body = SendOtpResponse::AlreadyPending {
                already_pending: true,
                remaining_time,
                message,
            };
            HttpResponse::Ok().json(ApiResponse::success(body).with_request_id(request_id))
        }
        Err(error) => domain_error_response(&error, lang),
    }
}
