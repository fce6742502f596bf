use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    engine::{Notification, ToggleAction, WatchlistSnapshot},
    error::AppResult,
    models::{CatalogItem, ItemId, UserId, WatchlistItem},
};

use super::AppState;

// Request/Response types

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct IdentityRequest {
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ItemView {
    #[serde(flatten)]
    pub item: WatchlistItem,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WatchlistResponse {
    pub user_id: Option<UserId>,
    pub is_loading: bool,
    pub items: Vec<ItemView>,
}

impl WatchlistResponse {
    fn from_snapshot(snapshot: WatchlistSnapshot, image_base_url: &str) -> Self {
        Self {
            user_id: snapshot.user_id,
            is_loading: snapshot.is_loading,
            items: snapshot
                .items
                .into_iter()
                .map(|item| ItemView {
                    poster_url: item.poster_url(image_base_url),
                    backdrop_url: item.backdrop_url(image_base_url),
                    item,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MembershipResponse {
    pub item_id: ItemId,
    pub member: bool,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub item_id: ItemId,
    pub action: ToggleAction,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Open a session; identity starts out resolving
pub async fn create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionResponse>) {
    let session = state.open_session().await;
    (
        StatusCode::CREATED,
        Json(SessionResponse {
            session_id: session.id(),
        }),
    )
}

/// Close a session, discarding its local watchlist
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.close_session(session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Sign in (`user_id` set) or out (`user_id` null), then wait for the reload
pub async fn set_identity(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<IdentityRequest>,
) -> AppResult<Json<WatchlistResponse>> {
    let session = state.session(session_id).await?;
    let user = request.user_id.map(UserId::new).transpose()?;

    session.set_identity(user);
    session.engine().wait_idle().await;

    Ok(Json(WatchlistResponse::from_snapshot(
        session.engine().snapshot(),
        &state.image_base_url,
    )))
}

/// Current watchlist snapshot
pub async fn get_watchlist(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> AppResult<Json<WatchlistResponse>> {
    let session = state.session(session_id).await?;
    Ok(Json(WatchlistResponse::from_snapshot(
        session.engine().snapshot(),
        &state.image_base_url,
    )))
}

/// Reload the watchlist from the store
pub async fn refresh_watchlist(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> AppResult<Json<WatchlistResponse>> {
    let session = state.session(session_id).await?;
    if !session.engine().refresh().await {
        tracing::warn!(session_id = %session_id, "Refresh failed, serving last known list");
    }
    Ok(Json(WatchlistResponse::from_snapshot(
        session.engine().snapshot(),
        &state.image_base_url,
    )))
}

/// Whether one item is in the watchlist
pub async fn get_membership(
    State(state): State<AppState>,
    Path((session_id, item_id)): Path<(Uuid, String)>,
) -> AppResult<Json<MembershipResponse>> {
    let session = state.session(session_id).await?;
    let item_id = ItemId::from(item_id);
    Ok(Json(MembershipResponse {
        member: session.engine().is_member(&item_id),
        item_id,
    }))
}

/// Add or remove an item; answers before the store write finishes
pub async fn toggle_item(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(item): Json<CatalogItem>,
) -> AppResult<(StatusCode, Json<ToggleResponse>)> {
    let session = state.session(session_id).await?;
    let pending = session.engine().toggle(item)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(ToggleResponse {
            item_id: pending.item_id().clone(),
            action: pending.action(),
        }),
    ))
}

/// Drain pending notifications
pub async fn get_notifications(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> AppResult<Json<Vec<Notification>>> {
    let session = state.session(session_id).await?;
    Ok(Json(session.drain_notifications()))
}
