use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

type Handles = HashMap<Uuid, Arc<AsyncMutex<()>>>;

/// Per-entity mutual exclusion: one async mutex per id, created on first use
/// and dropped again once nobody holds or waits for it.
///
/// Guards are owned and release their entity when dropped, on every exit path.
#[derive(Debug, Clone, Default)]
pub struct KeyedLocks {
    handles: Arc<Mutex<Handles>>,
}

/// Holds one key of a [`KeyedLocks`] until dropped.
#[derive(Debug)]
pub struct KeyedGuard {
    guard: Option<OwnedMutexGuard<()>>,
    handles: Arc<Mutex<Handles>>,
    key: Uuid,
}

impl Drop for KeyedGuard {
    fn drop(&mut self) {
        drop(self.guard.take());

        let mut handles = lock_handles(&self.handles);
        // the map's own reference is the last one: no holder, no waiter
        if handles
            .get(&self.key)
            .is_some_and(|handle| Arc::strong_count(handle) == 1)
        {
            handles.remove(&self.key);
        }
    }
}

fn lock_handles(handles: &Mutex<Handles>) -> MutexGuard<'_, Handles> {
    handles.lock().unwrap_or_else(PoisonError::into_inner)
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, key: Uuid) -> Arc<AsyncMutex<()>> {
        lock_handles(&self.handles).entry(key).or_default().clone()
    }

    fn guard(&self, key: Uuid, guard: OwnedMutexGuard<()>) -> KeyedGuard {
        KeyedGuard {
            guard: Some(guard),
            handles: self.handles.clone(),
            key,
        }
    }

    /// Waits until `key` is free and holds it until the guard is dropped.
    pub async fn lock(&self, key: Uuid) -> KeyedGuard {
        let guard = self.handle(key).lock_owned().await;
        self.guard(key, guard)
    }

    /// Returns `None` when `key` is already held.
    pub fn try_lock(&self, key: Uuid) -> Option<KeyedGuard> {
        let guard = self.handle(key).try_lock_owned().ok()?;
        Some(self.guard(key, guard))
    }

    /// Number of ids currently tracked.
    pub fn len(&self) -> usize {
        lock_handles(&self.handles).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
