/// Client-side watchlist synchronization
///
/// `WatchlistState` is the plain container, `WatchlistSyncEngine` drives it
/// against a `RemoteListStore`, and `WatchlistSession` ties an engine to an
/// identity provider for the lifetime of one UI session.
pub mod notification;
pub mod session;
pub mod state;
pub mod sync;

pub use notification::{Notification, NotificationKind, Notifier};
pub use session::WatchlistSession;
pub use state::{LoadTicket, ToggleAction, WatchlistSnapshot, WatchlistState};
pub use sync::{PendingToggle, ToggleOutcome, WatchlistSyncEngine, DEFAULT_NOTIFICATION_CAPACITY};
