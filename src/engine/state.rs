use std::collections::HashSet;

use serde::Serialize;

use crate::models::{ItemId, UserId, WatchlistItem};

/// Which way a toggle flipped membership
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleAction {
    Added,
    Removed,
}

/// Read-only view handed to the UI
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatchlistSnapshot {
    pub user_id: Option<UserId>,
    pub is_loading: bool,
    pub items: Vec<WatchlistItem>,
}

/// Marks one in-flight full reload
///
/// `epoch` changes whenever the current user changes, so a reload started
/// for a previous user can be recognised and dropped when it lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub user: UserId,
    pub epoch: u64,
}

/// Local mirror of one user's watchlist
///
/// Items only change in two ways: an optimistic edit from a toggle, or a
/// wholesale replacement from a reload. Rollback is always a reload; there
/// is no inverse edit.
///
/// Invariants: at most one item per id, and no user means no items and
/// nothing loading.
#[derive(Debug, Default)]
pub struct WatchlistState {
    items: Vec<WatchlistItem>,
    current_user: Option<UserId>,
    pending_loads: usize,
    epoch: u64,
}

impl WatchlistState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_user(&self) -> Option<&UserId> {
        self.current_user.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.pending_loads > 0
    }

    pub fn items(&self) -> &[WatchlistItem] {
        &self.items
    }

    pub fn is_member(&self, item_id: &ItemId) -> bool {
        self.items.iter().any(|item| &item.id == item_id)
    }

    pub fn snapshot(&self) -> WatchlistSnapshot {
        WatchlistSnapshot {
            user_id: self.current_user.clone(),
            is_loading: self.is_loading(),
            items: self.items.clone(),
        }
    }

    /// Flips membership of `item` against the current local state
    ///
    /// Membership is read from the state as it is right now, including any
    /// earlier optimistic edits still waiting on the store.
    pub fn apply_optimistic(&mut self, item: WatchlistItem) -> ToggleAction {
        if self.is_member(&item.id) {
            self.items.retain(|existing| existing.id != item.id);
            ToggleAction::Removed
        } else {
            self.items.push(item);
            ToggleAction::Added
        }
    }

    /// Replaces the items wholesale with what the store returned
    pub fn reconcile(&mut self, items: Vec<WatchlistItem>) {
        let mut seen = HashSet::with_capacity(items.len());
        self.items = items
            .into_iter()
            .filter(|item| seen.insert(item.id.clone()))
            .collect();
    }

    /// Drops everything, including the user
    pub fn reset(&mut self) {
        self.items.clear();
        self.current_user = None;
        self.pending_loads = 0;
        self.epoch += 1;
    }

    /// Starts a reload for `user`, switching to that user first if needed
    ///
    /// Returns `None` when `user` is `None`: signing out clears state
    /// without touching the store.
    pub fn begin_load(&mut self, user: Option<UserId>) -> Option<LoadTicket> {
        let Some(user) = user else {
            self.reset();
            return None;
        };

        if self.current_user.as_ref() != Some(&user) {
            self.reset();
            self.current_user = Some(user.clone());
        }

        self.pending_loads += 1;
        Some(LoadTicket {
            user,
            epoch: self.epoch,
        })
    }

    /// Starts a reconciliation reload, only if `user` is still current
    pub fn begin_reconcile(&mut self, user: &UserId) -> Option<LoadTicket> {
        if self.current_user.as_ref() != Some(user) {
            return None;
        }
        self.begin_load(Some(user.clone()))
    }

    /// Closes a reload; `true` when its result may still be applied
    pub fn finish_load(&mut self, ticket: &LoadTicket) -> bool {
        if ticket.epoch != self.epoch {
            return false;
        }
        self.pending_loads = self.pending_loads.saturating_sub(1);
        true
    }
}
