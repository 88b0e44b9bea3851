//! Route handlers
//!
//! - `otp` - code issuance and verification
//! - `health` - liveness plus primary store state

pub mod health;
pub mod otp;
