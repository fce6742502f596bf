use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{
    error::AppResult,
    models::{ItemId, UserId, WatchlistItem},
    store::RemoteListStore,
};

/// Process-local store, used for development and tests
///
/// Keeps each user's records in insertion order; an upsert of an existing
/// id replaces the record where it stands.
#[derive(Clone, Default)]
pub struct InMemoryListStore {
    inner: Arc<RwLock<HashMap<UserId, Vec<WatchlistItem>>>>,
}

impl InMemoryListStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a user's collection, replacing whatever was there
    pub async fn seed(&self, user: &UserId, items: Vec<WatchlistItem>) {
        self.inner.write().await.insert(user.clone(), items);
    }
}

#[async_trait::async_trait]
impl RemoteListStore for InMemoryListStore {
    async fn upsert(
        &self,
        user: &UserId,
        item_id: &ItemId,
        record: &WatchlistItem,
    ) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        let items = inner.entry(user.clone()).or_default();
        let record = WatchlistItem {
            id: item_id.clone(),
            ..record.clone()
        };

        match items.iter_mut().find(|item| &item.id == item_id) {
            Some(existing) => *existing = record,
            None => items.push(record),
        }
        Ok(())
    }

    async fn delete(&self, user: &UserId, item_id: &ItemId) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        if let Some(items) = inner.get_mut(user) {
            items.retain(|item| &item.id != item_id);
        }
        Ok(())
    }

    async fn list_all(&self, user: &UserId) -> AppResult<Vec<WatchlistItem>> {
        let inner = self.inner.read().await;
        Ok(inner.get(user).cloned().unwrap_or_default())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
