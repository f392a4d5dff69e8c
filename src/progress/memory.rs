//! Process-local progress store.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tracing::warn;

use super::{ProgressStore, ProgressUpdate, StoreError, UserId, UserProgress};

/// Progress store kept in memory. Clones share the same records.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProgressStore {
    records: Arc<Mutex<BTreeMap<UserId, UserProgress>>>,
}

impl InMemoryProgressStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_records<T>(
        &self,
        f: impl FnOnce(&mut BTreeMap<UserId, UserProgress>) -> T,
    ) -> Result<T, StoreError> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| StoreError::Unavailable("progress lock poisoned".to_owned()))?;
        Ok(f(&mut *records))
    }
}

fn new_record() -> UserProgress {
    UserProgress {
        last_active: Some(Utc::now()),
        ..UserProgress::default()
    }
}

#[async_trait]
impl ProgressStore for InMemoryProgressStore {
    async fn get_progress(&self, user: UserId) -> Result<UserProgress, StoreError> {
        self.with_records(|records| records.entry(user).or_insert_with(new_record).clone())
    }

    async fn update_progress(&self, user: UserId, update: ProgressUpdate) -> Result<(), StoreError> {
        if update.mark_completed && update.module.is_none() {
            warn!("mark_completed without a module for user {}, ignoring", user);
        }
        self.with_records(|records| {
            records
                .entry(user)
                .or_insert_with(new_record)
                .apply(&update, Utc::now());
        })
    }

    async fn reset_progress(&self, user: UserId) -> Result<(), StoreError> {
        self.with_records(|records| {
            records.insert(user, new_record());
        })
    }

    async fn list_active_users(&self, within_days: u32) -> Result<Vec<UserId>, StoreError> {
        let cutoff = Utc::now() - Duration::days(i64::from(within_days));
        self.with_records(|records| {
            records
                .iter()
                .filter(|(_, p)| p.last_active.is_some_and(|t| t >= cutoff))
                .map(|(id, _)| *id)
                .collect()
        })
    }

    async fn all_progress(&self) -> Result<Vec<(UserId, UserProgress)>, StoreError> {
        self.with_records(|records| records.iter().map(|(id, p)| (*id, p.clone())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_read_creates_default() {
        let store = InMemoryProgressStore::new();
        let progress = store.get_progress(42).await.unwrap();
        assert_eq!(progress.position(), (1, 1, 1));
        assert!(progress.completed_modules.is_empty());
        assert_eq!(store.all_progress().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_is_idempotent() {
        let store = InMemoryProgressStore::new();
        let first = store.get_progress(7).await.unwrap();
        let second = store.get_progress(7).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_reset_restores_defaults() {
        let store = InMemoryProgressStore::new();
        store
            .update_progress(5, ProgressUpdate::position(3, 2, 2))
            .await
            .unwrap();
        store.update_progress(5, ProgressUpdate::complete(3)).await.unwrap();

        store.reset_progress(5).await.unwrap();

        let progress = store.get_progress(5).await.unwrap();
        assert_eq!(progress.position(), (1, 1, 1));
        assert!(progress.completed_modules.is_empty());
    }

    #[tokio::test]
    async fn test_active_users() {
        let store = InMemoryProgressStore::new();
        store.get_progress(1).await.unwrap();
        store.get_progress(2).await.unwrap();
        assert_eq!(store.list_active_users(30).await.unwrap(), vec![1, 2]);
    }
}
