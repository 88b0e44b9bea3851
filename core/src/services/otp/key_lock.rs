//! Per-key async mutual exclusion for check-then-write sequences.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Map size above which dead lock slots are pruned on acquire
const PRUNE_THRESHOLD: usize = 1024;

/// Lazily created async locks, one per key
///
/// Slots are held weakly, so a key's lock disappears once no caller holds
/// or waits on it.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    slots: Mutex<HashMap<String, Weak<Mutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`
    pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut slots = self.slots.lock().await;
            if slots.len() > PRUNE_THRESHOLD {
                slots.retain(|_, slot| slot.strong_count() > 0);
            }

            match slots.get(key).and_then(Weak::upgrade) {
                Some(lock) => lock,
                None => {
                    let lock = Arc::new(Mutex::new(()));
                    slots.insert(key.to_string(), Arc::downgrade(&lock));
                    lock
                }
            }
        };

        lock.lock_owned().await
    }
}
