//! # Storefront Core
//!
//! Core business logic for the Storefront backend: the one-time passcode
//! lifecycle (issuance, dual-backend storage, verification, consumption),
//! identity resolution and credential minting, and the repository
//! interfaces the infrastructure layer implements.

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::*;
pub use errors::*;
pub use repositories::*;
pub use services::*;
