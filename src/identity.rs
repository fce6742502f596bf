use tokio::sync::watch;

use crate::models::UserId;

/// Authentication status as reported by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum IdentityState {
    /// The provider has not answered yet; nobody should be treated as signed out
    #[default]
    Resolving,
    SignedOut,
    SignedIn(UserId),
}

impl IdentityState {
    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            IdentityState::SignedIn(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_resolving(&self) -> bool {
        matches!(self, IdentityState::Resolving)
    }
}

/// Source of the current user's identity
///
/// Each session gets its own provider passed in explicitly, so several
/// sessions can run side by side without sharing auth state.
#[derive(Debug, Clone)]
pub struct IdentityProvider {
    tx: watch::Sender<IdentityState>,
}

impl Default for IdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityProvider {
    /// Creates a provider that is still resolving
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(IdentityState::Resolving);
        Self { tx }
    }

    pub fn current(&self) -> IdentityState {
        self.tx.borrow().clone()
    }

    pub fn sign_in(&self, user: UserId) {
        tracing::info!(user_id = %user, "User signed in");
        self.publish(IdentityState::SignedIn(user));
    }

    pub fn sign_out(&self) {
        tracing::info!("User signed out");
        self.publish(IdentityState::SignedOut);
    }

    /// Applies a nullable user id, the shape the UI hands over
    pub fn set_user(&self, user: Option<UserId>) {
        match user {
            Some(user) => self.sign_in(user),
            None => self.sign_out(),
        }
    }

    /// Subscribes to identity changes; the receiver sees the current state first
    pub fn subscribe(&self) -> watch::Receiver<IdentityState> {
        self.tx.subscribe()
    }

    fn publish(&self, state: IdentityState) {
        self.tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
    }
}
