//! In-process fallback for OTP records while the primary store is degraded.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

/// Stored fallback entry
#[derive(Debug, Clone)]
struct FallbackEntry {
    secret_hash: String,
    expires_at: Instant,
    failed_attempts: u32,
}

impl FallbackEntry {
    fn new(secret_hash: &str, ttl_seconds: u64) -> Self {
        Self {
            secret_hash: secret_hash.to_string(),
            expires_at: Instant::now() + Duration::from_secs(ttl_seconds),
            failed_attempts: 0,
        }
    }

    fn remaining(&self, now: Instant) -> Duration {
        self.expires_at.saturating_duration_since(now)
    }
}

/// Live fallback record as seen by the manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackLookup {
    pub secret_hash: String,
    /// Whole seconds left, rounded up; always at least 1
    pub remaining_seconds: u64,
}

/// Time-indexed map keyed like the primary store
///
/// One mutex guards the whole key-space; the sweeper and foreground calls
/// share it.
#[derive(Debug, Default)]
pub struct FallbackStore {
    entries: Mutex<HashMap<String, FallbackEntry>>,
}

impl FallbackStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a hash for `ttl_seconds`, replacing any entry for the key
    pub async fn put(&self, key: &str, secret_hash: &str, ttl_seconds: u64) {
        let mut entries = self.entries.lock().await;
        entries.insert(key.to_string(), FallbackEntry::new(secret_hash, ttl_seconds));
    }

    /// Store a hash unless a live entry exists; returns whether it was stored
    pub async fn put_if_absent(&self, key: &str, secret_hash: &str, ttl_seconds: u64) -> bool {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        if let Some(existing) = entries.get(key) {
            if !existing.remaining(now).is_zero() {
                return false;
            }
        }
        entries.insert(key.to_string(), FallbackEntry::new(secret_hash, ttl_seconds));
        true
    }

    /// Look up a live entry, evicting it if it has expired
    pub async fn get(&self, key: &str) -> Option<FallbackLookup> {
        let mut entries = self.entries.lock().await;
        let remaining = entries.get(key)?.remaining(Instant::now());

        if remaining.is_zero() {
            entries.remove(key);
            return None;
        }

        entries.get(key).map(|entry| FallbackLookup {
            secret_hash: entry.secret_hash.clone(),
            remaining_seconds: ceil_seconds(remaining),
        })
    }

    /// Remove an entry; absent keys are fine
    pub async fn delete(&self, key: &str) {
        self.entries.lock().await.remove(key);
    }

    /// Count a wrong guess against a live entry; returns the new count
    pub async fn record_failed_attempt(&self, key: &str) -> Option<u32> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        match entries.get_mut(key) {
            Some(entry) if !entry.remaining(now).is_zero() => {
                entry.failed_attempts += 1;
                Some(entry.failed_attempts)
            }
            _ => None,
        }
    }

    /// Evict every expired entry; returns how many were removed
    pub async fn sweep(&self) -> usize {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        let before = entries.len();
        entries.retain(|_, entry| !entry.remaining(now).is_zero());
        before - entries.len()
    }

    /// Number of stored entries, expired or not
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Spawn the periodic sweep for the lifetime of the process
    pub fn start_sweeper(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                interval_seconds = interval.as_secs(),
                "Fallback OTP store sweeper started"
            );

            let mut timer = tokio::time::interval(interval);
            // The first tick completes immediately
            timer.tick().await;

            loop {
                timer.tick().await;
                let evicted = self.sweep().await;
                if evicted > 0 {
                    debug!(evicted, event = "fallback_sweep", "Evicted expired fallback OTP entries");
                }
            }
        })
    }
}

fn ceil_seconds(duration: Duration) -> u64 {
    let secs = duration.as_secs();
    if duration.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}
