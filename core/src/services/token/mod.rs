//! Identity credential (JWT) minting

mod service;


pub use service::{CredentialClaims, CredentialService};
