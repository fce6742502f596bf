use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::{
    config::Config,
    engine::{WatchlistSession, WatchlistSyncEngine, DEFAULT_NOTIFICATION_CAPACITY},
    error::{AppError, AppResult},
    identity::IdentityProvider,
    models::DEFAULT_IMAGE_BASE_URL,
    store::RemoteListStore,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<RwLock<AppStateInner>>,
    pub store: Arc<dyn RemoteListStore>,
    pub notification_buffer: usize,
    pub image_base_url: String,
}

/// Inner state that can be modified
pub struct AppStateInner {
    pub sessions: HashMap<Uuid, SessionEntry>,
}

/// A registered session and when a request last touched it
pub struct SessionEntry {
    pub session: Arc<WatchlistSession>,
    pub last_seen: Instant,
}

impl AppState {
    /// Creates an empty session registry over `store`
    pub fn new(store: Arc<dyn RemoteListStore>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(AppStateInner {
                sessions: HashMap::new(),
            })),
            store,
            notification_buffer: DEFAULT_NOTIFICATION_CAPACITY,
            image_base_url: DEFAULT_IMAGE_BASE_URL.to_string(),
        }
    }

    pub fn from_config(store: Arc<dyn RemoteListStore>, config: &Config) -> Self {
        Self {
            notification_buffer: config.notification_buffer,
            image_base_url: config.image_base_url.clone(),
            ..Self::new(store)
        }
    }

    /// Starts a new session with its own identity provider and engine
    pub async fn open_session(&self) -> Arc<WatchlistSession> {
        let engine = WatchlistSyncEngine::with_notification_capacity(
            Arc::clone(&self.store),
            self.notification_buffer,
        );
        let session = Arc::new(WatchlistSession::attach(
            engine,
            IdentityProvider::new(),
            self.notification_buffer,
        ));

        let mut inner = self.inner.write().await;
        inner.sessions.insert(
            session.id(),
            SessionEntry {
                session: Arc::clone(&session),
                last_seen: Instant::now(),
            },
        );
        session
    }

    /// Looks up a session and marks it as recently used
    pub async fn session(&self, id: Uuid) -> AppResult<Arc<WatchlistSession>> {
        let mut inner = self.inner.write().await;
        let entry = inner
            .sessions
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Session {} not found", id)))?;
        entry.last_seen = Instant::now();
        Ok(Arc::clone(&entry.session))
    }

    pub async fn close_session(&self, id: Uuid) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        inner
            .sessions
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Session {} not found", id)))
    }

    /// Closes sessions nobody has used for `max_idle`; returns how many
    ///
    /// Browsers that go away without deleting their session would otherwise
    /// keep an engine and its tasks alive for the life of the process.
    pub async fn sweep_idle(&self, max_idle: Duration) -> usize {
        let mut inner = self.inner.write().await;
        let before = inner.sessions.len();
        inner
            .sessions
            .retain(|_, entry| entry.last_seen.elapsed() < max_idle);
        before - inner.sessions.len()
    }

    /// Runs `sweep_idle` periodically in the background
    pub fn spawn_idle_sweeper(&self, max_idle: Duration) -> JoinHandle<()> {
        let state = self.clone();
        let period = max_idle.clamp(Duration::from_secs(1), Duration::from_secs(60));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let closed = state.sweep_idle(max_idle).await;
                if closed > 0 {
                    tracing::info!(closed, "Closed idle watchlist sessions");
                }
            }
        })
    }
}
