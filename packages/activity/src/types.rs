// ABOUTME: Activity log and notification type definitions
// ABOUTME: Event kinds recorded against RFPs and user inbox entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    RfpCreated,
    RfpUpdated,
    StageChanged,
    RfpArchived,
    TaskCreated,
    TaskUpdated,
    TimelineAction,
    SupplierInvited,
    ResponseSubmitted,
    ReadinessUpdated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEvent {
    pub id: String,
    pub rfp_id: Option<String>,
    pub user_id: Option<String>,
    pub event_type: ActivityKind,
    pub payload: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewActivity {
    pub rfp_id: Option<String>,
    pub user_id: Option<String>,
    pub event_type: ActivityKind,
    pub payload: Option<serde_json::Value>,
}

impl NewActivity {
    pub fn for_rfp(rfp_id: &str, user_id: Option<&str>, event_type: ActivityKind) -> Self {
        Self {
            rfp_id: Some(rfp_id.to_string()),
            user_id: user_id.map(str::to_string),
            event_type,
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub rfp_id: Option<String>,
    pub kind: String,
    pub message: String,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: String,
    pub rfp_id: Option<String>,
    pub kind: String,
    pub message: String,
}
