use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Async mutex per key. Runs for the same base filename queue up; different
/// keys never contend.
#[derive(Default)]
pub struct KeyLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive use of `key`. Released when the guard drops.
    pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // Entries only the map references are idle.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(key.to_string()).or_default())
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_key_waits() {
        let locks = Arc::new(KeyLocks::new());
        let guard = locks.acquire("ada").await;

        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.acquire("ada").await;
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!contender.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_block() {
        let locks = KeyLocks::new();
        let _a = locks.acquire("ada").await;
        let b = tokio::time::timeout(Duration::from_millis(100), locks.acquire("grace")).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn test_idle_entries_are_pruned() {
        let locks = KeyLocks::new();
        drop(locks.acquire("a").await);
        drop(locks.acquire("b").await);
        let _c = locks.acquire("c").await;
        assert_eq!(locks.len(), 1);
    }
}
