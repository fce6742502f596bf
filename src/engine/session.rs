use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::{Notification, WatchlistSyncEngine};
use crate::identity::{IdentityProvider, IdentityState};
use crate::models::UserId;

/// Brings the engine in line with an identity state
///
/// While the provider is still resolving nothing happens, so a slow auth
/// check never wipes the list.
fn apply_identity(engine: &WatchlistSyncEngine, identity: &IdentityState) {
    match identity {
        IdentityState::Resolving => {
            tracing::debug!("Identity still resolving, watchlist left as is");
        }
        IdentityState::SignedOut => {
            // the local part runs now; there is nothing remote to wait for
            drop(engine.load(None));
        }
        IdentityState::SignedIn(user) => {
            if engine.current_user().as_ref() != Some(user) {
                drop(engine.load(Some(user.clone())));
            }
        }
    }
}

async fn follow_identity(engine: WatchlistSyncEngine, mut rx: watch::Receiver<IdentityState>) {
    while rx.changed().await.is_ok() {
        let identity = rx.borrow_and_update().clone();
        apply_identity(&engine, &identity);
    }
    tracing::debug!("Identity provider closed, session watcher stopping");
}

async fn collect_notifications(
    mut rx: broadcast::Receiver<Notification>,
    inbox: Arc<Mutex<VecDeque<Notification>>>,
    capacity: usize,
) {
    loop {
        match rx.recv().await {
            Ok(notification) => {
                let mut inbox = inbox.lock().unwrap_or_else(PoisonError::into_inner);
                if inbox.len() == capacity {
                    inbox.pop_front();
                }
                inbox.push_back(notification);
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Notification inbox lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// One UI session: an engine bound to an identity provider
///
/// Identity changes drive reloads: a new user triggers a full reload,
/// signing out clears the list. Notifications are collected into an inbox
/// the UI drains. Dropping the session stops both background tasks;
/// requests already sent still finish but no longer touch the list.
pub struct WatchlistSession {
    id: Uuid,
    engine: WatchlistSyncEngine,
    identity: IdentityProvider,
    inbox: Arc<Mutex<VecDeque<Notification>>>,
    watcher: JoinHandle<()>,
    collector: JoinHandle<()>,
}

impl WatchlistSession {
    /// Binds `engine` to `identity` and applies the current identity right away
    pub fn attach(
        engine: WatchlistSyncEngine,
        identity: IdentityProvider,
        inbox_capacity: usize,
    ) -> Self {
        let inbox_capacity = inbox_capacity.max(1);
        let inbox = Arc::new(Mutex::new(VecDeque::with_capacity(inbox_capacity)));
        let collector = tokio::spawn(collect_notifications(
            engine.subscribe(),
            Arc::clone(&inbox),
            inbox_capacity,
        ));

        let mut rx = identity.subscribe();
        let initial = rx.borrow_and_update().clone();
        apply_identity(&engine, &initial);
        let watcher = tokio::spawn(follow_identity(engine.clone(), rx));

        let session = Self {
            id: Uuid::new_v4(),
            engine,
            identity,
            inbox,
            watcher,
            collector,
        };
        tracing::info!(session_id = %session.id, "Watchlist session started");
        session
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn engine(&self) -> &WatchlistSyncEngine {
        &self.engine
    }

    pub fn identity(&self) -> &IdentityProvider {
        &self.identity
    }

    /// Signs in or out and applies the change without waiting for the watcher
    pub fn set_identity(&self, user: Option<UserId>) {
        self.identity.set_user(user);
        apply_identity(&self.engine, &self.identity.current());
    }

    /// Takes every notification collected so far, oldest first
    pub fn drain_notifications(&self) -> Vec<Notification> {
        let mut inbox = self.inbox.lock().unwrap_or_else(PoisonError::into_inner);
        inbox.drain(..).collect()
    }
}

impl Drop for WatchlistSession {
    fn drop(&mut self) {
        self.watcher.abort();
        self.collector.abort();
        tracing::info!(session_id = %self.id, "Watchlist session closed");
    }
}
