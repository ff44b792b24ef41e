use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use tokio::sync::Mutex as UserLock;

use crate::domain::UserId;

/// Default number of idle per-user locks kept around
pub const DEFAULT_LOCK_CAPACITY: usize = 10_000;

/// Hands out one exclusive lock per user
///
/// Locks are created on first use and reused afterwards. Once the registry reaches its capacity,
/// inserting a lock for a new user reclaims every lock that nobody holds or waits on.
#[derive(Debug)]
pub struct LockRegistry {
    locks: Mutex<HashMap<UserId, Arc<UserLock<()>>>>,
    capacity: usize,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_LOCK_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
            capacity,
        }
    }

    /// Lock for the user, created if it does not exist yet
    ///
    /// Concurrent callers asking for the same user always receive the same instance for as long
    /// as any of them keeps it.
    pub fn acquire_lock_for(&self, user_id: UserId) -> Arc<UserLock<()>> {
        // The map is only ever inserted into or pruned, so a poisoned guard still holds a
        // consistent map.
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(lock) = locks.get(&user_id) {
            return lock.clone();
        }

        if locks.len() >= self.capacity {
            let before = locks.len();
            // The registry holds one reference. Anything above that is a holder or a waiter.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            tracing::debug!(
                evicted = before - locks.len(),
                remaining = locks.len(),
                "reclaimed idle user locks"
            );
        }

        locks
            .entry(user_id)
            .or_insert_with(|| Arc::new(UserLock::new(())))
            .clone()
    }

    /// Number of locks currently tracked
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for LockRegistry {
    fn default() -> Self {
        Self::new()
    }
}
