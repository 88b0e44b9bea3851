//! CORS policy for browser and mobile clients.

use actix_cors::Cors;
use actix_web::http::{header, Method};
use std::env;
use tracing::info;

use sf_shared::config::Environment;

/// Build the CORS middleware for an environment
///
/// Development allows any origin. Other environments only allow the
/// comma-separated `ALLOWED_ORIGINS` list.
///
/// # Environment Variables
/// - `ALLOWED_ORIGINS`: allowed origins outside development
/// - `CORS_MAX_AGE`: preflight cache lifetime in seconds (default: 3600)
pub fn create_cors(environment: Environment) -> Cors {
    let max_age = env::var("CORS_MAX_AGE")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(3600);

    let cors = Cors::default()
        .allowed_methods(vec![Method::GET, Method::POST, Method::OPTIONS])
        .allowed_headers(vec![
            header::ACCEPT,
            header::ACCEPT_LANGUAGE,
            header::CONTENT_TYPE,
            header::HeaderName::from_static("x-request-id"),
        ])
        .expose_headers(vec![header::HeaderName::from_static("x-request-id")])
        .max_age(max_age);

    if environment.is_development() {
        info!(environment = %environment, "Configuring permissive CORS");
        return cors.allow_any_origin();
    }

    let origins = allowed_origins(&env::var("ALLOWED_ORIGINS").unwrap_or_default());
    info!(environment = %environment, origins = origins.len(), "Configuring CORS");

    origins
        .iter()
        .fold(cors, |cors, origin| cors.allowed_origin(origin))
}

/// Parse a comma-separated origin list
pub fn allowed_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}
