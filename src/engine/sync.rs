use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use chrono::Utc;
use tokio::sync::{broadcast, Notify};
use tokio::task::JoinHandle;

use super::{
    LoadTicket, Notification, Notifier, ToggleAction, WatchlistSnapshot, WatchlistState,
};
use crate::{
    error::{AppError, AppResult},
    models::{ItemId, UserId, WatchlistItem},
    store::RemoteListStore,
};

/// Capacity of the notification channel when none is configured
pub const DEFAULT_NOTIFICATION_CAPACITY: usize = 64;

/// Keeps a local mirror of one user's watchlist in step with the remote store
///
/// Membership checks are served from memory. Toggles edit the mirror
/// immediately, then write through to the store in a background task; if
/// that write fails the mirror is thrown away and reloaded from the store.
///
/// Cloning gives another handle to the same engine. Background work only
/// holds a weak reference, so once every handle is dropped in-flight
/// requests still finish but their results are discarded.
#[derive(Clone)]
pub struct WatchlistSyncEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    store: Arc<dyn RemoteListStore>,
    state: Mutex<WatchlistState>,
    notifier: Notifier,
    idle: Notify,
}

/// Result of a toggle's remote write, once it has settled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub item_id: ItemId,
    pub action: ToggleAction,
    /// `false` when the write failed and the list was reloaded instead
    pub committed: bool,
}

/// Handle to a toggle whose remote write may still be running
///
/// Dropping it leaves the write running in the background.
#[derive(Debug)]
pub struct PendingToggle {
    item_id: ItemId,
    action: ToggleAction,
    handle: JoinHandle<ToggleOutcome>,
}

impl PendingToggle {
    pub fn item_id(&self) -> &ItemId {
        &self.item_id
    }

    /// The optimistic change already applied locally
    pub fn action(&self) -> ToggleAction {
        self.action
    }

    /// Waits for the write, and any reconciliation it triggered, to finish
    pub async fn settled(self) -> AppResult<ToggleOutcome> {
        self.handle
            .await
            .map_err(|e| AppError::Internal(format!("Watchlist write task failed: {}", e)))
    }
}

impl EngineInner {
    fn state(&self) -> MutexGuard<'_, WatchlistState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies a finished reload; returns whether it succeeded
    fn finish_load(&self, ticket: &LoadTicket, result: AppResult<Vec<WatchlistItem>>) -> bool {
        let applied = {
            let mut state = self.state();
            if !state.finish_load(ticket) {
                tracing::debug!(user_id = %ticket.user, "Discarding reload for previous user");
                false
            } else {
                match result {
                    Ok(items) => {
                        tracing::info!(user_id = %ticket.user, count = items.len(), "Watchlist reloaded");
                        state.reconcile(items);
                        true
                    }
                    Err(e) => {
                        // Keep the last known list rather than flashing an empty one
                        tracing::warn!(user_id = %ticket.user, error = %e, "Watchlist reload failed");
                        false
                    }
                }
            }
        };
        self.wake_idle_waiters();
        applied
    }

    fn wake_idle_waiters(&self) {
        if !self.state().is_loading() {
            self.idle.notify_waiters();
        }
    }
}

/// Runs the remote half of a reload
async fn run_load(
    engine: Weak<EngineInner>,
    store: Arc<dyn RemoteListStore>,
    ticket: LoadTicket,
) -> bool {
    tracing::debug!(user_id = %ticket.user, "Reloading watchlist");
    let result = store.list_all(&ticket.user).await;

    match engine.upgrade() {
        Some(inner) => inner.finish_load(&ticket, result),
        None => {
            tracing::debug!(user_id = %ticket.user, "Engine dropped before reload finished");
            false
        }
    }
}

/// Writes one toggle through to the store, reconciling on failure
async fn write_through(
    engine: Weak<EngineInner>,
    store: Arc<dyn RemoteListStore>,
    user: UserId,
    item: WatchlistItem,
    action: ToggleAction,
) -> ToggleOutcome {
    let result = match action {
        ToggleAction::Added => {
            let record = item.stamped(Utc::now());
            store.upsert(&user, &item.id, &record).await
        }
        ToggleAction::Removed => store.delete(&user, &item.id).await,
    };

    let mut outcome = ToggleOutcome {
        item_id: item.id.clone(),
        action,
        committed: true,
    };

    if let Err(e) = result {
        tracing::error!(
            user_id = %user,
            item_id = %item.id,
            action = ?action,
            error = %e,
            "Watchlist write failed"
        );
        outcome.committed = false;
    }

    let Some(inner) = engine.upgrade() else {
        return outcome;
    };

    if outcome.committed {
        tracing::info!(user_id = %user, item_id = %item.id, action = ?action, "Watchlist write committed");
        inner.notifier.publish(Notification::committed(action, &item.id));
        return outcome;
    }

    let ticket = inner.state().begin_reconcile(&user);
    drop(inner);

    if let Some(ticket) = ticket {
        run_load(engine.clone(), store, ticket).await;
    }

    if let Some(inner) = engine.upgrade() {
        inner.notifier.publish(Notification::failed(action, &item.id));
    }

    outcome
}

impl WatchlistSyncEngine {
    /// Creates an engine with nobody signed in
    pub fn new(store: Arc<dyn RemoteListStore>) -> Self {
        Self::with_notification_capacity(store, DEFAULT_NOTIFICATION_CAPACITY)
    }

    pub fn with_notification_capacity(store: Arc<dyn RemoteListStore>, capacity: usize) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                store,
                state: Mutex::new(WatchlistState::new()),
                notifier: Notifier::new(capacity),
                idle: Notify::new(),
            }),
        }
    }

    /// Reloads the watchlist for `user`, or clears it when `user` is `None`
    ///
    /// The local part happens before this returns: signing out empties the
    /// list, switching users drops the old user's items, and the loading
    /// flag is raised. The store read runs in its own task, so dropping the
    /// returned future does not cancel it; the future resolves to whether
    /// the read succeeded. A failed read leaves the previous items in place.
    pub fn load(&self, user: Option<UserId>) -> impl Future<Output = bool> + Send + 'static {
        let ticket = self.inner.state().begin_load(user);
        let handle = ticket.map(|ticket| {
            tokio::spawn(run_load(
                Arc::downgrade(&self.inner),
                Arc::clone(&self.inner.store),
                ticket,
            ))
        });
        if handle.is_none() {
            tracing::debug!("No user, watchlist cleared");
            self.inner.wake_idle_waiters();
        }

        async move {
            match handle {
                Some(handle) => handle.await.unwrap_or_else(|e| {
                    tracing::error!(error = %e, "Watchlist reload task failed");
                    false
                }),
                None => true,
            }
        }
    }

    /// Reloads whoever is currently signed in
    pub fn refresh(&self) -> impl Future<Output = bool> + Send + 'static {
        let user = self.current_user();
        self.load(user)
    }

    pub fn is_member(&self, item_id: impl Into<ItemId>) -> bool {
        self.inner.state().is_member(&item_id.into())
    }

    /// Adds or removes `item`, depending on whether it is in the list now
    ///
    /// The local list changes before this returns. The store write runs in
    /// the background; its outcome is published as a [`Notification`] and
    /// can also be awaited through the returned handle.
    ///
    /// Fails with `Unauthenticated` when nobody is signed in, in which case
    /// neither the list nor the store is touched.
    pub fn toggle(&self, item: impl Into<WatchlistItem>) -> AppResult<PendingToggle> {
        let item = item.into();

        let (user, action) = {
            let mut state = self.inner.state();
            let current = state.current_user().cloned();
            let Some(user) = current else {
                drop(state);
                tracing::debug!(item_id = %item.id, "Toggle without a signed-in user");
                self.inner.notifier.publish(Notification::sign_in_required());
                return Err(AppError::Unauthenticated);
            };
            let action = state.apply_optimistic(item.clone());
            (user, action)
        };

        tracing::debug!(user_id = %user, item_id = %item.id, action = ?action, "Applied optimistic toggle");

        let item_id = item.id.clone();
        let handle = tokio::spawn(write_through(
            Arc::downgrade(&self.inner),
            Arc::clone(&self.inner.store),
            user,
            item,
            action,
        ));

        Ok(PendingToggle {
            item_id,
            action,
            handle,
        })
    }

    pub fn items(&self) -> Vec<WatchlistItem> {
        self.inner.state().items().to_vec()
    }

    pub fn snapshot(&self) -> WatchlistSnapshot {
        self.inner.state().snapshot()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state().is_loading()
    }

    pub fn current_user(&self) -> Option<UserId> {
        self.inner.state().current_user().cloned()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.inner.notifier.subscribe()
    }

    /// Waits until no reload is in flight
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            if !self.is_loading() {
                return;
            }
            notified.await;
        }
    }
}
