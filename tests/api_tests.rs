use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use watchlist_sync::{
    api::{create_router, AppState},
    models::UserId,
    store::InMemoryListStore,
    RemoteListStore,
};

fn create_test_app() -> (Router, InMemoryListStore) {
    let store = InMemoryListStore::new();
    let state = AppState::new(Arc::new(store.clone()));
    (create_router(state), store)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    let request = match body {
        Some(body) => request.body(Body::from(serde_json::to_vec(&body).unwrap())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_session(app: &Router) -> String {
    let (status, body) = send(app, Method::POST, "/api/v1/sessions", None).await;
    assert_eq!(status, StatusCode::CREATED);
    body["session_id"].as_str().unwrap().to_string()
}

/// Polls the notification inbox until something arrives
async fn wait_for_notifications(app: &Router, session_id: &str) -> Vec<Value> {
    let uri = format!("/api/v1/sessions/{}/notifications", session_id);
    for _ in 0..50 {
        let (_, body) = send(app, Method::GET, &uri, None).await;
        let notifications = body.as_array().cloned().unwrap_or_default();
        if !notifications.is_empty() {
            return notifications;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("no notifications arrived");
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = create_test_app();
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_new_session_starts_empty() {
    let (app, _) = create_test_app();
    let session_id = create_session(&app).await;

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/sessions/{}/watchlist", session_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], Value::Null);
    assert_eq!(body["is_loading"], false);
    assert_eq!(body["items"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_unknown_session_is_not_found() {
    let (app, _) = create_test_app();
    let (status, body) = send(
        &app,
        Method::GET,
        "/api/v1/sessions/00000000-0000-0000-0000-000000000000/watchlist",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn test_toggle_requires_sign_in() {
    let (app, store) = create_test_app();
    let session_id = create_session(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/sessions/{}/watchlist/toggle", session_id),
        Some(json!({ "id": 550, "title": "Fight Club" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Sign in to continue");

    let notifications = wait_for_notifications(&app, &session_id).await;
    assert_eq!(notifications[0]["kind"], "sign_in_required");
    assert_eq!(
        notifications[0]["message"],
        "Please sign in to add movies to your list."
    );

    assert!(store
        .list_all(&UserId::new("anyone").unwrap())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_blank_user_id_rejected() {
    let (app, _) = create_test_app();
    let session_id = create_session(&app).await;

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/sessions/{}/identity", session_id),
        Some(json!({ "user_id": "  " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_watchlist_flow() {
    let (app, store) = create_test_app();
    let user = UserId::new("uid-1").unwrap();
    let existing: watchlist_sync::models::WatchlistItem = serde_json::from_value(json!({
        "id": 1396,
        "title": "Breaking Bad",
        "mediaType": "tv",
        "posterPath": "/bb.jpg",
        "addedAt": "2024-01-01T00:00:00Z"
    }))
    .unwrap();
    store.seed(&user, vec![existing]).await;

    let session_id = create_session(&app).await;
    let base = format!("/api/v1/sessions/{}", session_id);

    // Sign in loads the stored list
    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("{}/identity", base),
        Some(json!({ "user_id": "uid-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], "uid-1");
    assert_eq!(body["is_loading"], false);
    assert_eq!(body["items"][0]["id"], "1396");
    assert_eq!(
        body["items"][0]["poster_url"],
        "https://image.tmdb.org/t/p/w500/bb.jpg"
    );

    // Add a movie straight from a catalog row
    let (status, body) = send(
        &app,
        Method::POST,
        &format!("{}/watchlist/toggle", base),
        Some(json!({
            "id": 550,
            "title": "Fight Club",
            "poster_path": "/fc.jpg",
            "vote_average": 8.4,
            "release_date": "1999-10-15"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["item_id"], "550");
    assert_eq!(body["action"], "added");

    let (_, body) = send(&app, Method::GET, &format!("{}/watchlist/550", base), None).await;
    assert_eq!(body["member"], true);

    let notifications = wait_for_notifications(&app, &session_id).await;
    assert_eq!(notifications[0]["kind"], "added");
    assert_eq!(notifications[0]["message"], "Added to My List");

    let stored = store.list_all(&user).await.unwrap();
    let fight_club = stored.iter().find(|i| i.id.as_str() == "550").unwrap();
    assert_eq!(fight_club.title, "Fight Club");
    assert_eq!(fight_club.release_date, "1999-10-15");
    assert!(fight_club.added_at.is_some());

    // Remove the show using its string id
    let (status, body) = send(
        &app,
        Method::POST,
        &format!("{}/watchlist/toggle", base),
        Some(json!({ "id": "1396", "name": "Breaking Bad" })),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["action"], "removed");

    let notifications = wait_for_notifications(&app, &session_id).await;
    assert_eq!(notifications[0]["kind"], "removed");

    let (_, body) = send(&app, Method::POST, &format!("{}/watchlist/refresh", base), None).await;
    let ids: Vec<&str> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["550"]);

    // Sign out clears the local list but not the store
    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("{}/identity", base),
        Some(json!({ "user_id": null })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], Value::Null);
    assert_eq!(body["items"].as_array().unwrap().len(), 0);
    assert_eq!(store.list_all(&user).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let (app, _) = create_test_app();
    let first = create_session(&app).await;
    let second = create_session(&app).await;

    send(
        &app,
        Method::PUT,
        &format!("/api/v1/sessions/{}/identity", first),
        Some(json!({ "user_id": "alice" })),
    )
    .await;

    let (_, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/sessions/{}/watchlist", second),
        None,
    )
    .await;
    assert_eq!(body["user_id"], Value::Null);
}

#[tokio::test]
async fn test_delete_session() {
    let (app, _) = create_test_app();
    let session_id = create_session(&app).await;
    let uri = format!("/api/v1/sessions/{}", session_id);

    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
