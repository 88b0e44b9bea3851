//! One-time passcode lifecycle
//!
//! - `hasher` - bcrypt hashing on the blocking pool
//! - `backend_state` - shared primary store reachability flag
//! - `fallback_store` - in-process store used while the primary is degraded
//! - `manager` - issue, verify and status orchestration
//! - `traits` - primary store, delivery and identity seams

mod backend_state;
mod fallback_store;
mod hasher;
mod key_lock;
mod manager;
mod traits;
mod types;

#[cfg(test)]
mod tests;

pub use backend_state::{BackendStatus, StorageBackendState};
pub use fallback_store::{FallbackLookup, FallbackStore};
pub use hasher::{SecretHasher, MAX_HASH_COST, MIN_HASH_COST};
pub use manager::OtpManager;
pub use traits::{IdentityResolver, OtpDelivery, PrimaryStore};
pub use types::{DeliveryStatus, IssueOutcome, StoreClaim, StoreWrite, StoredIn, VerifyOutcome};
