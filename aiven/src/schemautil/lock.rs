//! Per-key async mutex
//!
//! Guards read-modify-write cycles on documents shared by several Terraform
//! resources, such as the Elasticsearch ACL configuration of a service.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::OwnedMutexGuard;

#[derive(Debug, Default)]
pub struct KeyedLock {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl KeyedLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`. The lock is released when the
    /// returned guard is dropped.
    pub async fn lock(&self, key: &str) -> KeyedLockGuard<'_> {
        let mutex = self.entries().entry(key.to_string()).or_default().clone();
        tracing::trace!(key, "acquiring keyed lock");
        KeyedLockGuard {
            owner: self,
            key: key.to_string(),
            guard: Some(mutex.lock_owned().await),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Arc<tokio::sync::Mutex<()>>>> {
        self.locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Exclusive access to one key. Dropping it forgets the key once no other
/// task holds or waits for it.
pub struct KeyedLockGuard<'a> {
    owner: &'a KeyedLock,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyedLockGuard<'_> {
    fn drop(&mut self) {
        // Waiters clone the Arc under the map lock, so a count of one is final
        self.guard.take();
        let mut locks = self.owner.entries();
        if locks
            .get(&self.key)
            .is_some_and(|mutex| Arc::strong_count(mutex) == 1)
        {
            locks.remove(&self.key);
        }
    }
}
