// ABOUTME: Stage task type definitions
// ABOUTME: Checklist items attached to an RFP stage, manual or created on stage entry

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rfpdesk_core::Stage;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTask {
    pub id: String,
    pub rfp_id: String,
    pub stage: Stage,
    pub title: String,
    #[serde(skip_serializing)]
    pub normalized_title: String,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub auto_created: bool,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTaskCreateInput {
    pub title: String,
    /// Defaults to the RFP's current stage
    pub stage: Option<Stage>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTaskUpdateInput {
    pub title: Option<String>,
    pub completed: Option<bool>,
}
