use serde::Serialize;
use tokio::sync::broadcast;

use super::ToggleAction;
use crate::models::ItemId;

/// What happened, from the user's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Added,
    Removed,
    AddFailed,
    RemoveFailed,
    SignInRequired,
}

impl NotificationKind {
    pub fn message(self) -> &'static str {
        match self {
            NotificationKind::Added => "Added to My List",
            NotificationKind::Removed => "Removed from My List",
            NotificationKind::AddFailed => "Failed to add to My List",
            NotificationKind::RemoveFailed => "Failed to remove from My List",
            NotificationKind::SignInRequired => "Please sign in to add movies to your list.",
        }
    }

    pub fn is_error(self) -> bool {
        !matches!(self, NotificationKind::Added | NotificationKind::Removed)
    }
}

/// User-facing outcome of a watchlist operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub item_id: Option<ItemId>,
    pub message: String,
}

impl Notification {
    fn new(kind: NotificationKind, item_id: Option<ItemId>) -> Self {
        Self {
            kind,
            item_id,
            message: kind.message().to_string(),
        }
    }

    pub fn committed(action: ToggleAction, item_id: &ItemId) -> Self {
        let kind = match action {
            ToggleAction::Added => NotificationKind::Added,
            ToggleAction::Removed => NotificationKind::Removed,
        };
        Self::new(kind, Some(item_id.clone()))
    }

    pub fn failed(action: ToggleAction, item_id: &ItemId) -> Self {
        let kind = match action {
            ToggleAction::Added => NotificationKind::AddFailed,
            ToggleAction::Removed => NotificationKind::RemoveFailed,
        };
        Self::new(kind, Some(item_id.clone()))
    }

    pub fn sign_in_required() -> Self {
        Self::new(NotificationKind::SignInRequired, None)
    }
}

/// Fan-out of notifications to whoever is listening
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Notification>,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn publish(&self, notification: Notification) {
        // Nobody listening is fine; the toast just goes unseen
        if self.tx.send(notification).is_err() {
            tracing::trace!("Notification dropped, no subscribers");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let id = ItemId::from("42");
        assert_eq!(
            Notification::committed(ToggleAction::Added, &id).message,
            "Added to My List"
        );
        assert_eq!(
            Notification::failed(ToggleAction::Removed, &id).message,
            "Failed to remove from My List"
        );
        assert_eq!(Notification::sign_in_required().item_id, None);
    }

    #[test]
    fn test_error_kinds() {
        assert!(NotificationKind::AddFailed.is_error());
        assert!(NotificationKind::SignInRequired.is_error());
        assert!(!NotificationKind::Removed.is_error());
    }

    #[test]
    fn test_serialized_shape() {
        let json =
            serde_json::to_value(Notification::failed(ToggleAction::Added, &ItemId::from(7u64)))
                .unwrap();
        assert_eq!(json["kind"], "add_failed");
        assert_eq!(json["item_id"], "7");
    }

    #[tokio::test]
    async fn test_publish_reaches_subscriber() {
        let notifier = Notifier::new(4);
        let mut rx = notifier.subscribe();
        notifier.publish(Notification::sign_in_required());
        assert_eq!(
            rx.recv().await.unwrap().kind,
            NotificationKind::SignInRequired
        );
    }

    #[test]
    fn test_publish_without_subscribers_does_not_panic() {
        Notifier::new(1).publish(Notification::sign_in_required());
    }
}
