//! Process-local primary store
//!
//! Selected with `CACHE_TYPE=memory` for development, and used in tests to
//! drive the OTP manager across an outage.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

use sf_core::services::otp::{PrimaryStore, StorageBackendState, StoreClaim, StoreWrite};

// Expired entries are purged on write once the map grows past this
const PURGE_THRESHOLD: usize = 1024;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn new(value: &str, ttl_seconds: u64) -> Self {
        Self {
            value: value.to_string(),
            expires_at: Instant::now() + Duration::from_secs(ttl_seconds),
        }
    }

    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// TTL-honouring map with a simulated outage switch
#[derive(Debug)]
pub struct InMemoryPrimaryStore {
    entries: Mutex<HashMap<String, Entry>>,
    outage: AtomicBool,
    state: StorageBackendState,
}

impl Default for InMemoryPrimaryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryPrimaryStore {
    /// Create an empty, available store
    pub fn new() -> Self {
        let store = Self {
            entries: Mutex::new(HashMap::new()),
            outage: AtomicBool::new(false),
            state: StorageBackendState::new(),
        };
        store.state.mark_available();
        info!("Using in-memory primary OTP store");
        store
    }

    /// Simulate losing or regaining the backend
    pub fn set_outage(&self, outage: bool) {
        self.outage.store(outage, Ordering::SeqCst);
        if outage {
            self.state.mark_degraded("simulated outage");
        } else {
            self.state.mark_available();
        }
    }

    /// Number of stored keys, expired or not
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn unreachable(&self) -> bool {
        if self.outage.load(Ordering::SeqCst) {
            self.state.mark_degraded("simulated outage");
            return true;
        }
        false
    }

    fn purge_if_large(entries: &mut HashMap<String, Entry>, now: Instant) {
        if entries.len() >= PURGE_THRESHOLD {
            let before = entries.len();
            entries.retain(|_, entry| entry.is_live(now));
            debug!(evicted = before - entries.len(), "Purged expired in-memory keys");
        }
    }
}

#[async_trait]
impl PrimaryStore for InMemoryPrimaryStore {
    async fn get(&self, key: &str) -> Option<String> {
        if self.unreachable() {
            return None;
        }

        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    async fn set_with_expiry(&self, key: &str, value: &str, ttl_seconds: u64) -> StoreWrite {
        if self.unreachable() {
            return StoreWrite::Failed;
        }

        let mut entries = self.entries.lock().await;
        Self::purge_if_large(&mut entries, Instant::now());
        entries.insert(key.to_string(), Entry::new(value, ttl_seconds));
        StoreWrite::Stored
    }

    async fn set_if_absent_with_expiry(
        &self,
        key: &str,
        value: &str,
        ttl_seconds: u64,
    ) -> StoreClaim {
        if self.unreachable() {
            return StoreClaim::Failed;
        }

        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        if entries.get(key).is_some_and(|entry| entry.is_live(now)) {
            return StoreClaim::Occupied;
        }

        Self::purge_if_large(&mut entries, now);
        entries.insert(key.to_string(), Entry::new(value, ttl_seconds));
        StoreClaim::Claimed
    }

    async fn ttl(&self, key: &str) -> i64 {
        if self.unreachable() {
            return -1;
        }

        let entries = self.entries.lock().await;
        let now = Instant::now();
        match entries.get(key) {
            Some(entry) if entry.is_live(now) => {
                let remaining = entry.expires_at - now;
                remaining.as_secs() as i64 + i64::from(remaining.subsec_nanos() > 0)
            }
            _ => -2,
        }
    }

    async fn delete(&self, key: &str) {
        if self.unreachable() {
            return;
        }
        self.entries.lock().await.remove(key);
    }

    async fn increment_with_expiry(&self, key: &str, ttl_seconds: u64) -> Option<i64> {
        if self.unreachable() {
            return None;
        }

        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        let (count, expires_at) = match entries.get(key) {
            Some(entry) if entry.is_live(now) => {
                (entry.value.parse::<i64>().unwrap_or(0) + 1, entry.expires_at)
            }
            _ => (1, now + Duration::from_secs(ttl_seconds)),
        };

        entries.insert(
            key.to_string(),
            Entry {
                value: count.to_string(),
                expires_at,
            },
        );
        Some(count)
    }

    fn backend_state(&self) -> &StorageBackendState {
        &self.state
    }
}
