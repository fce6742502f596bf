//! Watchlist synchronization for a movie browsing UI.
//!
//! Keeps a per-session mirror of a user's watchlist, applies toggles
//! optimistically and reconciles with the remote store when a write fails.

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod identity;
pub mod models;
pub mod store;

pub use engine::{WatchlistSession, WatchlistSyncEngine};
pub use error::{AppError, AppResult};
pub use identity::{IdentityProvider, IdentityState};
pub use store::RemoteListStore;
