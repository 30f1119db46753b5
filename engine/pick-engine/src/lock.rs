//! Per-submission mutual exclusion
//!
//! Validation and registration are not one transaction, so two concurrent
//! submissions for the same (user, league, week) could both pass validation.
//! Holding a [`SubmissionGuard`] across both phases serialises them.

use crate::{LeagueId, UserId};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

type SubmissionKey = (UserId, LeagueId, u32);

/// Lock table keyed on (user, league, week)
#[derive(Debug, Clone, Default)]
pub struct SubmissionLocks {
    locks: Arc<DashMap<SubmissionKey, Arc<Mutex<()>>>>,
}

impl SubmissionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to one member's week in one league
    pub async fn acquire(&self, user_id: UserId, league_id: LeagueId, week: u32) -> SubmissionGuard {
        let key = (user_id, league_id, week);
        let mutex = {
            let entry = self.locks.entry(key).or_default();
            Arc::clone(entry.value())
        };

        let guard = mutex.lock_owned().await;
        SubmissionGuard { key, locks: Arc::clone(&self.locks), guard: Some(guard) }
    }

    /// Number of keys currently tracked
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Held while a submission is validated and written; released on drop
#[derive(Debug)]
pub struct SubmissionGuard {
    key: SubmissionKey,
    locks: Arc<DashMap<SubmissionKey, Arc<Mutex<()>>>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for SubmissionGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Only the table itself still references an idle lock
        self.locks.remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_key_is_serialized() {
        let locks = SubmissionLocks::new();
        let guard = locks.acquire(1, 2, 3).await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(1, 2, 3).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contender).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_different_weeks_do_not_block() {
        let locks = SubmissionLocks::new();
        let _week_three = locks.acquire(1, 2, 3).await;
        let other = tokio::time::timeout(Duration::from_millis(100), locks.acquire(1, 2, 4)).await;
        assert!(other.is_ok());
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn test_idle_entries_pruned() {
        let locks = SubmissionLocks::new();
        {
            let _guard = locks.acquire(1, 2, 3).await;
            assert_eq!(locks.len(), 1);
        }
        assert!(locks.is_empty());
    }
}
