//! One-time passcode endpoints under `/api/v1/otp`

pub mod me;
pub mod send;
pub mod status;
pub mod verify;
