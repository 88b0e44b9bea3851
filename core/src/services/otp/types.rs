//! Result types for the OTP stores and manager

use chrono::{DateTime, Utc};

use crate::domain::value_objects::IdentityGrant;

/// Outcome of an unconditional primary write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreWrite {
    Stored,
    /// The caller must use the fallback store
    Failed,
}

/// Outcome of a conditional primary write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreClaim {
    /// The key was absent and now holds our value
    Claimed,
    /// Another writer holds the key
    Occupied,
    /// Transport failure; the caller must use the fallback store
    Failed,
}

/// Where an issued code ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoredIn {
    /// Primary store only
    Primary,
    /// Primary store plus a mirror in the fallback store
    PrimaryAndFallback,
    /// Fallback store only (primary degraded or write failed)
    Fallback,
}

/// Delivery collaborator result for an issued code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryStatus {
    Delivered { message_id: String },
    /// The code stays stored; the caller may retry delivery
    Failed { reason: String },
}

impl DeliveryStatus {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryStatus::Delivered { .. })
    }
}

/// Result of an issue request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueOutcome {
    /// A live code already exists; nothing new was generated
    AlreadyPending { remaining_time: String },

    /// A new code was generated and stored
    Issued {
        /// Plaintext code, handed to the delivery collaborator
        code: String,
        expires_at: DateTime<Utc>,
        stored_in: StoredIn,
        delivery: DeliveryStatus,
    },
}

impl IssueOutcome {
    pub fn is_issued(&self) -> bool {
        matches!(self, IssueOutcome::Issued { .. })
    }
}

/// Result of a successful verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyOutcome {
    pub grant: IdentityGrant,
}
