use actix_web::{web, HttpRequest, HttpResponse};
use tracing::debug;

use sf_core::repositories::BanRepository;
use sf_core::services::otp::{IdentityResolver, OtpDelivery, PrimaryStore};
use sf_shared::types::ApiResponse;

use crate::app::AppState;
use crate::dto::{MeResponse, UserDto};
use crate::handlers::{domain_error_response, request_id};
use crate::i18n::language_of;
use crate::middleware::BearerToken;

/// Handler for GET /api/v1/otp/me
///
/// # Responses
///
/// - `200` `{ "user": { ... } }` for the credential's owner
/// - `401` missing, malformed, invalid or expired credential
/// - `404` the credential's user no longer exists
pub async fn me<P, D, B, I>(
    req: HttpRequest,
    state: web::Data<AppState<P, D, B, I>>,
    token: BearerToken,
) -> HttpResponse
where
    P: PrimaryStore + 'static,
    D: OtpDelivery + 'static,
    B: BanRepository + 'static,
    I: IdentityResolver + 'static,
{
    let request_id = request_id(&req);

    match state.identity.authenticate(token.as_str()).await {
        Ok(user) => {
            debug!(request_id = %request_id, user_id = %user.id, "Loaded current user");
            let body = MeResponse {
                user: UserDto::from(&user),
            };
            HttpResponse::Ok().json(ApiResponse::success(body).with_request_id(request_id))
        }
        Err(error) => domain_error_response(&error, language_of(&req)),
    }
}
