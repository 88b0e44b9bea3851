//! Process-wide reachability state of the primary OTP store.

use serde::Serialize;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Reachability of the primary store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum BackendStatus {
    /// No connection attempt has completed yet
    Unknown = 0,
    /// Last connect or command succeeded
    Available = 1,
    /// Connection lost or never established
    Degraded = 2,
}

impl BackendStatus {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => BackendStatus::Available,
            2 => BackendStatus::Degraded,
            _ => BackendStatus::Unknown,
        }
    }

    /// Lowercase name used in logs and the health endpoint
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendStatus::Unknown => "unknown",
            BackendStatus::Available => "available",
            BackendStatus::Degraded => "degraded",
        }
    }
}

impl std::fmt::Display for BackendStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared handle to the primary store status
///
/// Written by the primary store adapter, read by the OTP manager on every
/// operation. Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct StorageBackendState {
    inner: Arc<AtomicU8>,
}

impl StorageBackendState {
    /// New state, starting as `Unknown`
    pub fn new() -> Self {
        Self::default()
    }

    /// Current status
    pub fn status(&self) -> BackendStatus {
        BackendStatus::from_u8(self.inner.load(Ordering::Acquire))
    }

    /// Whether the primary store can be relied on
    pub fn is_available(&self) -> bool {
        self.status() == BackendStatus::Available
    }

    /// Whether lookups must consult the fallback store (`Unknown` counts)
    pub fn is_degraded(&self) -> bool {
        !self.is_available()
    }

    /// Record a successful connect or command; returns the previous status
    pub fn mark_available(&self) -> BackendStatus {
        let previous = self.swap(BackendStatus::Available);
        if previous != BackendStatus::Available {
            tracing::info!(
                previous = previous.as_str(),
                event = "backend_available",
                "Primary OTP store is available"
            );
        }
        previous
    }

    /// Record a connection failure; returns the previous status
    pub fn mark_degraded(&self, reason: &str) -> BackendStatus {
        let previous = self.swap(BackendStatus::Degraded);
        if previous != BackendStatus::Degraded {
            tracing::warn!(
                previous = previous.as_str(),
                reason = reason,
                event = "backend_degraded",
                "Primary OTP store degraded, using fallback store"
            );
        }
        previous
    }

    fn swap(&self, status: BackendStatus) -> BackendStatus {
        BackendStatus::from_u8(self.inner.swap(status as u8, Ordering::AcqRel))
    }
}
