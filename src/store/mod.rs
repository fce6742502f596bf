/// Remote watchlist storage
///
/// The durable copy of every user's watchlist lives behind this trait. The
/// engine only ever upserts, deletes and lists whole collections; no
/// ordering or transactional guarantees are assumed beyond per-document
/// atomicity.
use std::sync::Arc;

use crate::{
    config::{Config, StoreBackend},
    error::AppResult,
    models::{ItemId, UserId, WatchlistItem},
};

pub mod http;
pub mod memory;
pub mod postgres;
pub mod redis;

pub use self::http::HttpListStore;
pub use self::memory::InMemoryListStore;
pub use self::postgres::{create_pool, PgListStore};
pub use self::redis::{create_redis_client, RedisListStore, StoreKey};

/// Per-user collection of watchlist records keyed by item id
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RemoteListStore: Send + Sync {
    /// Inserts or replaces the record for `item_id`
    async fn upsert(&self, user: &UserId, item_id: &ItemId, record: &WatchlistItem)
        -> AppResult<()>;

    /// Deletes the record for `item_id`; deleting a missing record succeeds
    async fn delete(&self, user: &UserId, item_id: &ItemId) -> AppResult<()>;

    /// Reads the user's whole collection in store iteration order
    async fn list_all(&self, user: &UserId) -> AppResult<Vec<WatchlistItem>>;

    /// Backend name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Connects the backend selected in the configuration
pub async fn connect_store(config: &Config) -> anyhow::Result<Arc<dyn RemoteListStore>> {
    let store: Arc<dyn RemoteListStore> = match config.store_backend {
        StoreBackend::Memory => Arc::new(InMemoryListStore::new()),
        StoreBackend::Redis => {
            let client = create_redis_client(&config.redis_url)?;
            Arc::new(RedisListStore::new(client))
        }
        StoreBackend::Postgres => {
            let pool = create_pool(&config.database_url).await?;
            Arc::new(PgListStore::new(pool))
        }
        StoreBackend::Http => {
            let base_url = config
                .store_api_url
                .clone()
                .ok_or_else(|| anyhow::anyhow!("STORE_API_URL is not set"))?;
            Arc::new(HttpListStore::new(base_url, config.store_api_key.clone()))
        }
    };

    tracing::info!(backend = store.name(), "Remote list store connected");

    Ok(store)
}
