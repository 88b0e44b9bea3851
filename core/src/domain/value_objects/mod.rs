//! Value objects returned by domain services.

pub mod identity_grant;

pub use identity_grant::IdentityGrant;
