//! HTTP middleware
//!
//! - `auth` - Bearer credential extraction
//! - `cors` - environment-aware CORS policy
//! - `rate_limit` - per-client request limits
//! - `security` - response hardening headers

pub mod auth;
pub mod cors;
pub mod rate_limit;
pub mod security;

pub use auth::BearerToken;
pub use cors::create_cors;
pub use rate_limit::{RateLimit, RequestLimiter};
pub use security::SecurityHeaders;
