//! Transaction Lock Registry
//!
//! One mutex per request id, created on first use. At most one action per
//! key runs at a time within this process. A key's entry is dropped again
//! when its last holder releases it and nobody is waiting, so the table only
//! holds keys that are in use.
//!
//! The registry is process-local. Several engine instances sharing one store
//! each have their own table and do not exclude each other.

use dashmap::DashMap;
use parking_lot::lock_api::ArcMutexGuard;
use parking_lot::{Mutex, RawMutex};
use std::sync::Arc;

/// Process-wide table of per-key mutexes
#[derive(Debug, Default)]
pub struct LockRegistry {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until the lock for `key` is held
    ///
    /// The lock is released when the returned guard is dropped, on every exit
    /// path of the caller.
    pub fn acquire(&self, key: &str) -> KeyGuard<'_> {
        // Cloning under the shard lock keeps the strong count honest for
        // the eviction check in `KeyGuard::drop`.
        let mutex = Arc::clone(self.locks.entry(key.to_string()).or_default().value());
        let guard = Mutex::lock_arc(&mutex);
        KeyGuard {
            registry: self,
            key: key.to_string(),
            guard: Some(guard),
        }
    }

    /// Number of keys currently held or waited on
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Holds the lock for one key
pub struct KeyGuard<'a> {
    registry: &'a LockRegistry,
    key: String,
    guard: Option<ArcMutexGuard<RawMutex, ()>>,
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        // Unlock first; the guard owns one strong reference to the mutex.
        drop(self.guard.take());
        self.registry
            .locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
