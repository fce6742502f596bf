use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        // Sessions
        .route("/sessions", post(handlers::create_session))
        .route("/sessions/:session_id", delete(handlers::delete_session))
        .route("/sessions/:session_id/identity", put(handlers::set_identity))
        // Watchlist
        .route("/sessions/:session_id/watchlist", get(handlers::get_watchlist))
        .route(
            "/sessions/:session_id/watchlist/refresh",
            post(handlers::refresh_watchlist),
        )
        .route(
            "/sessions/:session_id/watchlist/toggle",
            post(handlers::toggle_item),
        )
        .route(
            "/sessions/:session_id/watchlist/:item_id",
            get(handlers::get_membership),
        )
        // Notifications
        .route(
            "/sessions/:session_id/notifications",
            get(handlers::get_notifications),
        )
}
