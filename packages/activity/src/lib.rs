// ABOUTME: Append-only audit trail and per-user notifications
// ABOUTME: Best-effort sink so audit failures never block the primary operation

pub mod notifications;
pub mod sink;
pub mod storage;
pub mod types;

pub use notifications::NotificationStorage;
pub use sink::{ActivitySink, DbActivitySink};
pub use storage::ActivityLogStorage;
pub use types::{ActivityEvent, ActivityKind, NewActivity, NewNotification, Notification};
