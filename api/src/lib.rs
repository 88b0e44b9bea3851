//! # Storefront API
//!
//! actix-web surface for phone sign-in: code issuance, verification and a
//! health check reporting the primary store state.

pub mod app;
pub mod backends;
pub mod dto;
pub mod handlers;
pub mod i18n;
pub mod middleware;
pub mod routes;

pub use app::{configure, AppState, ServerState};
