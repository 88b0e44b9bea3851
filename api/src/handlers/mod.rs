//! Shared response helpers for route handlers

pub mod error;

pub use error::{domain_error_response, validation_error_response};

use actix_web::{HttpMessage, HttpRequest};
use tracing_actix_web::RequestId;
use uuid::Uuid;

/// Request id assigned by the tracing middleware, the client's
/// `X-Request-ID`, or a fresh one
pub fn request_id(req: &HttpRequest) -> String {
    if let Some(id) = req.extensions().get::<RequestId>() {
        return id.to_string();
    }

    req.headers()
        .get("X-Request-ID")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}
