//! Domain entities representing core business objects.

pub mod otp_record;
pub mod user;


// Re-export commonly used types
pub use otp_record::{format_remaining_time, OtpRecord, OtpStatus};
pub use user::{Role, User};
