//! Type definitions shared by the HTTP surface
//!
//! - `language` - Accept-Language based message localization
//! - `response` - API response wrapper and health check payloads

pub mod language;
pub mod response;

pub use language::Language;
pub use response::{ApiResponse, HealthResponse, HealthStatus};
