// ABOUTME: Best-effort activity sink used by services after their primary write
// ABOUTME: Failures are logged and swallowed, never returned to the caller

use async_trait::async_trait;
use tracing::warn;

use super::storage::ActivityLogStorage;
use super::types::NewActivity;

#[async_trait]
pub trait ActivitySink: Send + Sync {
    /// Record an event. Never fails from the caller's point of view.
    async fn record(&self, event: NewActivity);
}

#[derive(Clone)]
pub struct DbActivitySink {
    storage: ActivityLogStorage,
}

impl DbActivitySink {
    pub fn new(storage: ActivityLogStorage) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl ActivitySink for DbActivitySink {
    async fn record(&self, event: NewActivity) {
        let kind = event.event_type;
        let rfp_id = event.rfp_id.clone();
        if let Err(e) = self.storage.append(event).await {
            warn!(
                error = %e,
                event_type = ?kind,
                rfp_id = ?rfp_id,
                "Failed to record activity event"
            );
        }
    }
}
