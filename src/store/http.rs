/// Hosted document store over REST
///
/// Documents live under `users/{user_id}/watchlist/{item_id}`:
/// - `GET    {base}/users/{uid}/watchlist`      → JSON array of records
/// - `PUT    {base}/users/{uid}/watchlist/{id}` → upsert one record
/// - `DELETE {base}/users/{uid}/watchlist/{id}` → remove one record
use reqwest::{Client as HttpClient, RequestBuilder, Response, StatusCode};

use crate::{
    error::{AppError, AppResult},
    models::{ItemId, UserId, WatchlistItem},
    store::RemoteListStore,
};

#[derive(Clone)]
pub struct HttpListStore {
    http_client: HttpClient,
    api_url: String,
    api_key: Option<String>,
}

impl HttpListStore {
    pub fn new(api_url: String, api_key: Option<String>) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn collection_url(&self, user: &UserId) -> String {
        format!("{}/users/{}/watchlist", self.api_url, user)
    }

    fn document_url(&self, user: &UserId, item_id: &ItemId) -> String {
        format!("{}/{}", self.collection_url(user), item_id)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    /// Turns a non-success response into `AppError::RemoteStore`
    async fn check(response: Response, action: &str) -> AppResult<Response> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        tracing::error!(
            status = %status,
            body = %body,
            action,
            "Document store request failed"
        );
        Err(AppError::RemoteStore(format!(
            "Document store returned status {} on {}: {}",
            status, action, body
        )))
    }
}

#[async_trait::async_trait]
impl RemoteListStore for HttpListStore {
    async fn upsert(
        &self,
        user: &UserId,
        item_id: &ItemId,
        record: &WatchlistItem,
    ) -> AppResult<()> {
        let response = self
            .authorized(self.http_client.put(self.document_url(user, item_id)))
            .json(record)
            .send()
            .await?;

        Self::check(response, "upsert").await?;
        Ok(())
    }

    async fn delete(&self, user: &UserId, item_id: &ItemId) -> AppResult<()> {
        let response = self
            .authorized(self.http_client.delete(self.document_url(user, item_id)))
            .send()
            .await?;

        // Already gone is as good as deleted
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }

        Self::check(response, "delete").await?;
        Ok(())
    }

    async fn list_all(&self, user: &UserId) -> AppResult<Vec<WatchlistItem>> {
        let response = self
            .authorized(self.http_client.get(self.collection_url(user)))
            .send()
            .await?;

        // A user who never saved anything has no collection yet
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }

        let response = Self::check(response, "list").await?;
        let items: Vec<WatchlistItem> = response.json().await?;

        tracing::debug!(user_id = %user, count = items.len(), "Fetched watchlist documents");
        Ok(items)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
