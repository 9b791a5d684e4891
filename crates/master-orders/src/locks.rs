//! Process-wide named locks.
//!
//! A lock is identified by a string such as `alloc:account_7`. Guards are
//! owned, so they can be held across `.await` points and are released when
//! dropped, whatever path the holder leaves by. Idle lock slots are removed
//! from the table when their last guard goes away.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::trace;

#[derive(Debug, Clone, Error, PartialEq)]
#[error("Timed out after {waited:?} waiting for lock {name}")]
pub struct LockTimeout {
    pub name: String,
    pub waited: Duration,
}

#[derive(Clone, Default)]
pub struct NamedLocks {
    slots: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl NamedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, name: &str) -> Arc<Mutex<()>> {
        self.slots.entry(name.to_string()).or_default().clone()
    }

    /// Waits up to `timeout` for the lock.
    pub async fn acquire(
        &self,
        name: impl Into<String>,
        timeout: Duration,
    ) -> Result<NamedLockGuard, LockTimeout> {
        let name = name.into();
        let slot = self.slot(&name);
        // Bound first so the pending lock future, and its slot handle, is
        // gone before a timed-out waiter sweeps.
        let acquired = tokio::time::timeout(timeout, slot.lock_owned()).await;
        match acquired {
            Ok(guard) => {
                trace!(lock = %name, "Acquired");
                Ok(NamedLockGuard {
                    name,
                    guard: Some(guard),
                    slots: self.slots.clone(),
                })
            }
            Err(_) => {
                self.sweep(&name);
                Err(LockTimeout {
                    name,
                    waited: timeout,
                })
            }
        }
    }

    /// Takes the lock only if nobody holds it.
    pub fn try_acquire(&self, name: impl Into<String>) -> Option<NamedLockGuard> {
        let name = name.into();
        let slot = self.slot(&name);
        match slot.try_lock_owned() {
            Ok(guard) => Some(NamedLockGuard {
                name,
                guard: Some(guard),
                slots: self.slots.clone(),
            }),
            Err(_) => None,
        }
    }

    pub fn is_held(&self, name: &str) -> bool {
        self.slots
            .get(name)
            .map(|slot| slot.try_lock().is_err())
            .unwrap_or(false)
    }

    fn sweep(&self, name: &str) {
        self.slots
            .remove_if(name, |_, slot| Arc::strong_count(slot) == 1);
    }
}

/// Holds a named lock until dropped.
pub struct NamedLockGuard {
    name: String,
    guard: Option<OwnedMutexGuard<()>>,
    slots: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl NamedLockGuard {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for NamedLockGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.slots
            .remove_if(&self.name, |_, slot| Arc::strong_count(slot) == 1);
        trace!(lock = %self.name, "Released");
    }
}

pub fn allocation_lock(account: impl std::fmt::Display) -> String {
    format!("alloc:{account}")
}

pub fn master_lock(master: impl std::fmt::Display) -> String {
    format!("master:{master}")
}

pub fn member_lock(member: impl std::fmt::Display) -> String {
    format!("member:{member}")
}

pub fn removal_lock(member: impl std::fmt::Display) -> String {
    format!("remove:{member}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn second_acquire_times_out_while_held() {
        let locks = NamedLocks::new();
        let guard = locks.acquire("alloc:account_1", Duration::from_millis(10)).await.unwrap();

        let err = locks
            .acquire("alloc:account_1", Duration::from_millis(20))
            .await
            .err()
            .unwrap();
        assert_eq!(err.name, "alloc:account_1");

        drop(guard);
        assert!(locks
            .acquire("alloc:account_1", Duration::from_millis(20))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn different_names_do_not_contend() {
        let locks = NamedLocks::new();
        let _a = locks.acquire("alloc:account_1", Duration::from_millis(10)).await.unwrap();
        assert!(locks.try_acquire("alloc:account_2").is_some());
    }

    #[tokio::test]
    async fn try_acquire_fails_fast_and_slots_are_swept() {
        let locks = NamedLocks::new();
        let guard = locks.try_acquire("remove:order_1").unwrap();
        assert!(locks.try_acquire("remove:order_1").is_none());
        assert!(locks.is_held("remove:order_1"));

        drop(guard);
        assert!(!locks.is_held("remove:order_1"));
        assert!(locks.slots.is_empty());
    }

    #[tokio::test]
    async fn waiter_gets_the_lock_when_the_holder_drops() {
        let locks = NamedLocks::new();
        let guard = locks.acquire("master:master_1", Duration::from_millis(10)).await.unwrap();

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                locks
                    .acquire("master:master_1", Duration::from_secs(1))
                    .await
                    .map(|g| g.name().to_string())
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(guard);

        assert_eq!(waiter.await.unwrap(), Ok("master:master_1".to_string()));
    }

    #[tokio::test]
    async fn a_timed_out_waiter_leaves_only_the_holders_slot() {
        let locks = NamedLocks::new();
        let guard = locks.acquire("alloc:account_3", Duration::from_millis(10)).await.unwrap();

        assert!(locks
            .acquire("alloc:account_3", Duration::from_millis(5))
            .await
            .is_err());
        assert_eq!(locks.slots.len(), 1);

        drop(guard);
        assert!(locks.slots.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn releases_racing_timeouts_do_not_leak_slots() {
        let locks = NamedLocks::new();
        for _ in 0..100 {
            let guard = locks.acquire("master:master_9", Duration::from_millis(10)).await.unwrap();
            let holder = tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(1)).await;
                drop(guard);
            });
            let waited = locks
                .acquire("master:master_9", Duration::from_millis(1))
                .await;
            drop(waited);
            holder.await.unwrap();
        }
        assert!(locks.slots.is_empty());
    }
}
