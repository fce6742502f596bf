use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool, Row};

use crate::{
    error::AppResult,
    models::{ItemId, MediaType, UserId, WatchlistItem},
    store::RemoteListStore,
};

/// Creates a PostgreSQL connection pool and applies pending migrations
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// Watchlists stored in the `watchlist_items` table
#[derive(Clone)]
pub struct PgListStore {
    pool: PgPool,
}

impl PgListStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn media_type_column(media_type: MediaType) -> &'static str {
    match media_type {
        MediaType::Movie => "movie",
        MediaType::Tv => "tv",
    }
}

#[async_trait::async_trait]
impl RemoteListStore for PgListStore {
    async fn upsert(
        &self,
        user: &UserId,
        item_id: &ItemId,
        record: &WatchlistItem,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO watchlist_items
                (user_id, item_id, title, poster_path, backdrop_path, overview,
                 vote_average, media_type, release_date, added_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (user_id, item_id) DO UPDATE SET
                title = EXCLUDED.title,
                poster_path = EXCLUDED.poster_path,
                backdrop_path = EXCLUDED.backdrop_path,
                overview = EXCLUDED.overview,
                vote_average = EXCLUDED.vote_average,
                media_type = EXCLUDED.media_type,
                release_date = EXCLUDED.release_date,
                added_at = EXCLUDED.added_at
            "#,
        )
        .bind(user.as_str())
        .bind(item_id.as_str())
        .bind(&record.title)
        .bind(&record.poster_path)
        .bind(&record.backdrop_path)
        .bind(&record.overview)
        .bind(record.vote_average)
        .bind(media_type_column(record.media_type))
        .bind(&record.release_date)
        .bind(record.added_at)
        .execute(&self.pool)
        .await?;

        tracing::debug!(user_id = %user, item_id = %item_id, "Stored watchlist row");
        Ok(())
    }

    async fn delete(&self, user: &UserId, item_id: &ItemId) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM watchlist_items WHERE user_id = $1 AND item_id = $2")
            .bind(user.as_str())
            .bind(item_id.as_str())
            .execute(&self.pool)
            .await?;

        tracing::debug!(
            user_id = %user,
            item_id = %item_id,
            rows = result.rows_affected(),
            "Deleted watchlist row"
        );
        Ok(())
    }

    async fn list_all(&self, user: &UserId) -> AppResult<Vec<WatchlistItem>> {
        let rows = sqlx::query(
            r#"
            SELECT item_id, title, poster_path, backdrop_path, overview,
                   vote_average, media_type, release_date, added_at
            FROM watchlist_items
            WHERE user_id = $1
            ORDER BY added_at ASC NULLS FIRST, item_id ASC
            "#,
        )
        .bind(user.as_str())
        .fetch_all(&self.pool)
        .await?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            let media_type: String = row.try_get("media_type")?;
            let added_at: Option<DateTime<Utc>> = row.try_get("added_at")?;
            items.push(WatchlistItem {
                id: ItemId::from(row.try_get::<String, _>("item_id")?),
                title: row.try_get("title")?,
                poster_path: row.try_get("poster_path")?,
                backdrop_path: row.try_get("backdrop_path")?,
                overview: row.try_get("overview")?,
                vote_average: row.try_get("vote_average")?,
                media_type: MediaType::parse(&media_type),
                release_date: row.try_get("release_date")?,
                added_at,
            });
        }

        Ok(items)
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}
