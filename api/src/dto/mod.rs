//! Request and response bodies

pub mod otp;

pub use otp::{
    MeResponse, OtpStatusQuery, OtpStatusResponse, SendOtpRequest, SendOtpResponse, UserDto,
    VerifyOtpRequest, VerifyOtpResponse,
};
