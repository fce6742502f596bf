use redis::AsyncCommands;
use redis::Client;
use std::fmt::Display;

use crate::{
    error::AppResult,
    models::{ItemId, UserId, WatchlistItem},
    store::RemoteListStore,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StoreKey {
    Watchlist(UserId),
}

impl Display for StoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreKey::Watchlist(user) => write!(f, "watchlist:{}", user),
        }
    }
}

/// Creates a Redis client for the watchlist store
///
/// Connections are multiplexed, so one client is shared by every session.
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Watchlists stored as one Redis hash per user
///
/// Hash field is the item id, value is the JSON record. Hash iteration order
/// is arbitrary, so listings are sorted by `addedAt` before returning.
#[derive(Clone)]
pub struct RedisListStore {
    redis_client: Client,
}

impl RedisListStore {
    pub fn new(redis_client: Client) -> Self {
        Self { redis_client }
    }
}

/// Decodes HGETALL pairs, skipping records that no longer parse
fn decode_records(pairs: Vec<(String, String)>) -> Vec<WatchlistItem> {
    let mut items: Vec<WatchlistItem> = pairs
        .into_iter()
        .filter_map(|(field, json)| match serde_json::from_str::<WatchlistItem>(&json) {
            Ok(mut item) => {
                // the hash field is the document key
                item.id = ItemId::from(field);
                Some(item)
            }
            Err(e) => {
                tracing::warn!(item_id = %field, error = %e, "Skipping unreadable watchlist record");
                None
            }
        })
        .collect();

    items.sort_by(|a, b| a.added_at.cmp(&b.added_at));
    items
}

#[async_trait::async_trait]
impl RemoteListStore for RedisListStore {
    async fn upsert(
        &self,
        user: &UserId,
        item_id: &ItemId,
        record: &WatchlistItem,
    ) -> AppResult<()> {
        let key = StoreKey::Watchlist(user.clone());
        let json = serde_json::to_string(record)?;

        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let _: () = conn.hset(key.to_string(), item_id.as_str(), json).await?;

        tracing::debug!(user_id = %user, item_id = %item_id, "Stored watchlist record");
        Ok(())
    }

    async fn delete(&self, user: &UserId, item_id: &ItemId) -> AppResult<()> {
        let key = StoreKey::Watchlist(user.clone());

        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let _: () = conn.hdel(key.to_string(), item_id.as_str()).await?;

        tracing::debug!(user_id = %user, item_id = %item_id, "Deleted watchlist record");
        Ok(())
    }

    async fn list_all(&self, user: &UserId) -> AppResult<Vec<WatchlistItem>> {
        let key = StoreKey::Watchlist(user.clone());

        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let pairs: Vec<(String, String)> = conn.hgetall(key.to_string()).await?;

        Ok(decode_records(pairs))
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
