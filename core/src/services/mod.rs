//! Business services containing domain logic and use cases.

pub mod identity;
pub mod otp;
pub mod token;

// Re-export commonly used types
pub use identity::IdentityService;
pub use otp::{
    BackendStatus, DeliveryStatus, FallbackStore, IdentityResolver, IssueOutcome, OtpDelivery,
    OtpManager, PrimaryStore, SecretHasher, StorageBackendState, StoreClaim, StoreWrite, StoredIn,
    VerifyOutcome,
};
pub use token::{CredentialClaims, CredentialService};
