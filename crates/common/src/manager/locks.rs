use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// What a lock protects. Read-modify-write cycles on the same key are
/// serialised; everything else runs concurrently.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum LockKey {
    /// An identity's metadata and the field objects it describes
    Identity { origin: String, uid: String },
    /// An origin's foreign map
    ForeignMap { origin: String },
}

impl LockKey {
    pub(crate) fn identity(origin: &str, uid: &str) -> Self {
        LockKey::Identity {
            origin: origin.to_string(),
            uid: uid.to_string(),
        }
    }

    pub(crate) fn foreign_map(origin: &str) -> Self {
        LockKey::ForeignMap {
            origin: origin.to_string(),
        }
    }
}

/// One coarse async lock per key, created on first use. Entries that no
/// guard or waiter references are dropped on the next acquisition, so the
/// map stays bounded by the keys currently in flight.
#[derive(Debug, Default)]
pub(crate) struct Locks {
    inner: Mutex<HashMap<LockKey, Arc<AsyncMutex<()>>>>,
}

impl Locks {
    pub(crate) async fn lock(&self, key: LockKey) -> OwnedMutexGuard<()> {
        let mutex = {
            let mut inner = self.inner.lock();
            // clones only happen under this mutex, so a count of one is idle
            inner.retain(|_, mutex| Arc::strong_count(mutex) > 1);
            inner.entry(key).or_default().clone()
        };
        mutex.lock_owned().await
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_same_key_is_exclusive() {
        let locks = Arc::new(Locks::default());
        let guard = locks.lock(LockKey::identity("http://a.com:80", "1")).await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.lock(LockKey::identity("http://a.com:80", "1")).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_block() {
        let locks = Locks::default();
        let _a = locks.lock(LockKey::identity("http://a.com:80", "1")).await;
        let _b = locks.lock(LockKey::identity("http://a.com:80", "2")).await;
        let _c = locks.lock(LockKey::foreign_map("http://a.com:80")).await;
    }

    #[tokio::test]
    async fn test_released_keys_are_forgotten() {
        let locks = Arc::new(Locks::default());
        for uid in 0..100 {
            let _guard = locks
                .lock(LockKey::identity("http://a.com:80", &uid.to_string()))
                .await;
        }
        assert!(locks.len() <= 1);

        let held = locks.lock(LockKey::foreign_map("http://a.com:80")).await;
        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.lock(LockKey::foreign_map("http://a.com:80")).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        // a key with a holder and a waiter survives pruning
        let other = locks.lock(LockKey::identity("http://a.com:80", "x")).await;
        assert_eq!(locks.len(), 2);

        drop(held);
        waiter.await.unwrap();
        drop(other);
        let _last = locks.lock(LockKey::identity("http://a.com:80", "y")).await;
        assert_eq!(locks.len(), 1);
    }
}
